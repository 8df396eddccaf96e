//! Commands for courselab CLI
//!

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use courselab_core::logging::LevelFilter;
use courselab_core::Principal;

/// courselab: create, attach, detach and delete the course IAM policies
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct CourselabArgs {
    #[clap(subcommand)]
    pub(crate) command: CourselabCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
    /// Project config file (default: courselab.yaml, if present)
    #[clap(global = true, short, long)]
    pub(crate) config: Option<PathBuf>,
    /// Named AWS profile to load credentials from
    #[clap(global = true, short, long)]
    pub(crate) profile: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CourselabCommand {
    /// Create the course policies and attach them to a user or role
    Apply {
        #[clap(flatten)]
        target: TargetArgs,
        /// Folder with the policy JSON files (default: policies)
        #[clap(short, long)]
        dir: Option<PathBuf>,
        /// Literal text replacement applied to every document, as FROM=TO
        #[clap(long = "replace", value_parser = parse_replacement)]
        replacements: Vec<(String, String)>,
    },
    /// Detach the course policies from a user or role and delete them
    Cleanup {
        #[clap(flatten)]
        target: TargetArgs,
    },
}

/// Who the policies are attached to or detached from.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct TargetArgs {
    /// IAM user name (default: learner)
    #[clap(short, long, conflicts_with = "role")]
    pub(crate) user: Option<String>,
    /// IAM role name
    #[clap(short, long)]
    pub(crate) role: Option<String>,
}

impl TargetArgs {
    /// Resolve to a principal, falling back to the configured default user.
    pub(crate) fn principal(&self, default_user: Option<String>) -> Principal {
        Principal::from_selection(self.user.to_owned(), self.role.to_owned(), default_user)
    }
}

fn parse_replacement(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((from, to)) if !from.is_empty() => Ok((from.to_owned(), to.to_owned())),
        _ => Err(format!("expected FROM=TO, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use courselab_core::PrincipalKind;

    #[test]
    fn apply_defaults() {
        let args = CourselabArgs::try_parse_from(["courselab", "apply"]).unwrap();
        match args.command {
            CourselabCommand::Apply {
                target,
                dir,
                replacements,
            } => {
                assert_eq!(target.principal(None), Principal::user("learner"));
                assert!(dir.is_none());
                assert!(replacements.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn apply_to_role_with_replacements() {
        let args = CourselabArgs::try_parse_from([
            "courselab",
            "apply",
            "--role",
            "CourseLabRole",
            "--dir",
            "./lab",
            "--replace",
            "${BUCKET}=my-bucket",
            "--replace",
            "A=B=C",
        ])
        .unwrap();
        match args.command {
            CourselabCommand::Apply {
                target,
                dir,
                replacements,
            } => {
                assert_eq!(target.principal(None).kind, PrincipalKind::Role);
                assert_eq!(dir, Some(PathBuf::from("./lab")));
                assert_eq!(
                    replacements,
                    vec![
                        ("${BUCKET}".to_owned(), "my-bucket".to_owned()),
                        ("A".to_owned(), "B=C".to_owned())
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn user_and_role_are_mutually_exclusive() {
        assert!(CourselabArgs::try_parse_from([
            "courselab",
            "cleanup",
            "--user",
            "alice",
            "--role",
            "CourseLabRole"
        ])
        .is_err());
    }

    #[test]
    fn bad_replacement_is_rejected() {
        assert!(
            CourselabArgs::try_parse_from(["courselab", "apply", "--replace", "novalue"]).is_err()
        );
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let args = CourselabArgs::try_parse_from([
            "courselab",
            "cleanup",
            "--user",
            "alice",
            "--profile",
            "lab",
            "-v",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.profile.as_deref(), Some("lab"));
        assert_eq!(args.log_level, Some(LevelFilter::DEBUG));
    }
}
