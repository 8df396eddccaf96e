//! Batch drivers: apply the whole policy set to a principal, or tear it down.
//!
//! Items are processed strictly in order and one item's failure never stops
//! the rest from being attempted.

use std::path::Path;

use crate::arn::{CallerIdentity, PolicyArn};
use crate::log_runtime;
use crate::logging::{debug, error, info};
use crate::policy::{self, PolicyDefinition, PolicySet, Replacements};
use crate::principal::Principal;
use crate::reconcile::{self, AttachOutcome, DeleteOutcome, DetachOutcome, ReconcileError};
use crate::service::IdentityService;

/// Names that made it onto the principal, and names that didn't.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Created (or found) and attached
    pub attached: Vec<String>,
    /// Anything that went wrong along the way
    pub failed: Vec<String>,
}

impl ApplySummary {
    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create (or resolve) every policy in `set` and attach it to `principal`.
///
/// The principal is checked before anything is created, so a missing target
/// doesn't leave unattached policies behind. Only a failure to determine the
/// caller identity aborts the run.
pub async fn apply<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
    policy_dir: &Path,
    set: &PolicySet,
    replacements: &Replacements,
) -> Result<ApplySummary, ReconcileError> {
    let identity = service
        .caller_identity()
        .await
        .map_err(ReconcileError::CallerIdentity)?;
    debug!("operating in account {}", identity.account);

    let mut summary = ApplySummary::default();

    if let Err(e) = reconcile::check_principal(service, principal).await {
        error!("not creating any policies: {e}");
        summary.failed = set.names();
        return Ok(summary);
    }

    log_runtime!("apply", {
        for def in set {
            let result =
                apply_one(service, &identity, principal, policy_dir, def, replacements).await;
            match result {
                Ok(_) => {
                    info!("attached {} → {principal}", def.name);
                    summary.attached.push(def.name.to_owned());
                }
                Err(e) => {
                    if let ReconcileError::PolicyFile(e) = &e {
                        error!("{e}");
                    }
                    error!("failed to attach {} → {principal}", def.name);
                    summary.failed.push(def.name.to_owned());
                }
            }
        }
    });

    Ok(summary)
}

/// Load one document, make sure its policy exists, and attach it.
async fn apply_one<S: IdentityService + ?Sized>(
    service: &S,
    identity: &CallerIdentity,
    principal: &Principal,
    policy_dir: &Path,
    def: &PolicyDefinition,
    replacements: &Replacements,
) -> Result<AttachOutcome, ReconcileError> {
    let document = policy::load_document(def.path_in(policy_dir), replacements)?;
    let policy = reconcile::ensure_policy(service, identity, &def.name, &document).await?;
    reconcile::ensure_attached(service, principal, policy.arn()).await
}

/// The per-policy result of a cleanup run.
#[derive(Debug)]
pub struct CleanupItem {
    /// Policy name
    pub name: String,
    /// Its derived identifier
    pub arn: PolicyArn,
    /// Outcome of the detach pass
    pub detach: Result<DetachOutcome, ReconcileError>,
    /// Outcome of the delete pass
    pub delete: Result<DeleteOutcome, ReconcileError>,
}

/// Everything a cleanup run did, in set order.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// One entry per policy name
    pub items: Vec<CleanupItem>,
}

impl CleanupReport {
    /// True when every detach and delete either succeeded or had nothing to do.
    pub fn is_clean(&self) -> bool {
        self.items
            .iter()
            .all(|i| i.detach.is_ok() && i.delete.is_ok())
    }

    /// True when the run found nothing to remove at all.
    pub fn was_already_clean(&self) -> bool {
        self.items.iter().all(|i| {
            matches!(i.detach, Ok(DetachOutcome::NotAttached))
                && matches!(i.delete, Ok(DeleteOutcome::AlreadyGone))
        })
    }
}

/// Detach every policy in `set` from `principal`, then delete every policy.
///
/// The two passes are not interleaved: all detaches happen before any delete.
pub async fn cleanup<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
    set: &PolicySet,
) -> Result<CleanupReport, ReconcileError> {
    let identity = service
        .caller_identity()
        .await
        .map_err(ReconcileError::CallerIdentity)?;
    let arns = set
        .iter()
        .map(|def| (def.name.to_owned(), identity.policy_arn(&def.name)))
        .collect::<Vec<_>>();

    info!("detaching");
    let mut detached = vec![];
    for (_, arn) in &arns {
        detached.push(reconcile::detach(service, principal, arn).await);
    }

    info!("deleting");
    let mut items = vec![];
    for ((name, arn), detach) in arns.into_iter().zip(detached) {
        let delete = reconcile::delete(service, &arn).await;
        items.push(CleanupItem {
            name,
            arn,
            detach,
            delete,
        });
    }

    Ok(CleanupReport { items })
}
