//! Full CLI library for courselab
//!

#![deny(missing_docs)]

mod apply;
mod cleanup;
mod cmd;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use human_panic::setup_panic;

use courselab_core::{
    config::{ProjectConfig, DEFAULT_CONFIG_PATH},
    logging::{self, debug},
};
use courselab_iam::IamService;

use cmd::{CourselabArgs, CourselabCommand};

/// Main CLI entrypoint.
///
/// `apply` exits non-zero if any policy failed to attach. `cleanup` exits
/// non-zero only if the operator declined.
pub async fn cli() -> Result<ExitCode> {
    setup_panic!();
    let args = CourselabArgs::parse();
    logging::setup(args.log_level);

    let config = ProjectConfig::load_or_default(
        args.config
            .to_owned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
    )?;
    let set = config.policy_set();
    debug!("managing policies: {}", set.names().join(", "));

    let service = IamService::from_env(args.profile.as_deref()).await;

    match args.command {
        CourselabCommand::Apply {
            target,
            dir,
            replacements,
        } => {
            let principal = target.principal(config.default_user.to_owned());
            let summary = apply::apply(
                &service,
                &principal,
                &config.policy_dir(dir),
                &set,
                &config.replacements_with(&replacements),
            )
            .await?;
            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        CourselabCommand::Cleanup { target } => {
            let principal = target.principal(config.default_user.to_owned());
            let report =
                cleanup::cleanup(&service, &principal, &set, cleanup::confirm_interactively)
                    .await?;
            Ok(match report {
                Some(_) => ExitCode::SUCCESS,
                None => ExitCode::FAILURE,
            })
        }
    }
}
