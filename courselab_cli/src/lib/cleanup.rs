//! Mod for the cleanup command-line argument

use anyhow::{Context, Result};
use colored::Colorize;

use courselab_core::{
    batch::{self, CleanupItem, CleanupReport},
    policy::PolicySet,
    reconcile::{DeleteOutcome, DetachOutcome},
    IdentityService, Principal,
};

pub(crate) const CONFIRM_PROMPT: &str = "This will detach & delete CourseLab policies. Proceed?";

/// Ask the operator before touching anything. Defaults to no.
pub(crate) fn confirm_interactively() -> Result<bool> {
    inquire::Confirm::new(CONFIRM_PROMPT)
        .with_default(false)
        .prompt()
        .context("unable to read confirmation")
}

/// Returns `None` if the operator declined.
pub(super) async fn cleanup<S, F>(
    service: &S,
    principal: &Principal,
    set: &PolicySet,
    confirm: F,
) -> Result<Option<CleanupReport>>
where
    S: IdentityService + ?Sized,
    F: FnOnce() -> Result<bool>,
{
    println!("Target: {principal}");
    if !confirm()? {
        println!("Cancelled.");
        return Ok(None);
    }

    let report = batch::cleanup(service, principal, set)
        .await
        .context("unable to clean up policies")?;

    println!("\n=== Cleanup ===");
    for item in &report.items {
        println!("{}: {}, {}", item.name, detach_status(item), delete_status(item));
    }
    println!("\n{}", "Cleanup complete.".green());
    Ok(Some(report))
}

fn detach_status(item: &CleanupItem) -> String {
    match &item.detach {
        Ok(DetachOutcome::Detached) => "detached".green().to_string(),
        Ok(DetachOutcome::NotAttached) => "not attached".normal().to_string(),
        Err(e) => format!("{} ({e})", "detach failed".yellow()),
    }
}

fn delete_status(item: &CleanupItem) -> String {
    match &item.delete {
        Ok(DeleteOutcome::Deleted) => "deleted".green().to_string(),
        Ok(DeleteOutcome::AlreadyGone) => "already gone".normal().to_string(),
        Err(e) => format!("{} ({e})", "delete failed".yellow()),
    }
}
