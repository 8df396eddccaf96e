//! Mod for the apply command-line argument

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use courselab_core::{
    batch::{self, ApplySummary},
    policy::{PolicySet, Replacements},
    IdentityService, Principal,
};

pub(super) async fn apply<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
    policy_dir: &Path,
    set: &PolicySet,
    replacements: &Replacements,
) -> Result<ApplySummary> {
    println!("=== Applying Course Policies ===");
    println!("Target: {principal}");
    println!("Policy folder: {}\n", policy_dir.display());

    let summary = batch::apply(service, principal, policy_dir, set, replacements)
        .await
        .context("unable to apply policies")?;

    println!("\n=== Summary ===");
    if !summary.attached.is_empty() {
        println!("{} {}", "Attached:".green(), summary.attached.join(", "));
    }
    if !summary.failed.is_empty() {
        println!("{}   {}", "Failed:".red(), summary.failed.join(", "));
    } else {
        println!("{}", "Done.".green());
    }

    Ok(summary)
}
