//! Detach and delete managed policies.

use crate::arn::PolicyArn;
use crate::logging::{debug, info, warn};
use crate::principal::Principal;
use crate::service::{IdentityService, ServiceError};

use super::ReconcileError;

/// What `detach` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetachOutcome {
    /// The relation was removed
    Detached,
    /// It wasn't attached (or was already removed)
    NotAttached,
}

/// What `delete` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The policy was deleted
    Deleted,
    /// The policy was already gone
    AlreadyGone,
}

/// Remove the attachment between `principal` and `arn`.
pub async fn detach<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
    arn: &PolicyArn,
) -> Result<DetachOutcome, ReconcileError> {
    match service.detach_policy(principal, arn).await {
        Ok(()) => {
            info!("detached {arn} from {principal}");
            Ok(DetachOutcome::Detached)
        }
        Err(ServiceError::NoSuchEntity(_)) => {
            info!("not attached (or already removed): {arn}");
            Ok(DetachOutcome::NotAttached)
        }
        Err(source) => {
            warn!("could not detach {arn}: {source}");
            Err(ReconcileError::Detach {
                principal: principal.to_owned(),
                arn: arn.to_owned(),
                source,
            })
        }
    }
}

/// Delete every non-default version of `arn`, then the policy itself.
pub async fn delete<S: IdentityService + ?Sized>(
    service: &S,
    arn: &PolicyArn,
) -> Result<DeleteOutcome, ReconcileError> {
    match delete_versions_then_policy(service, arn).await {
        Ok(()) => {
            info!("deleted {arn}");
            Ok(DeleteOutcome::Deleted)
        }
        Err(ServiceError::NoSuchEntity(_)) => {
            info!("policy already gone: {arn}");
            Ok(DeleteOutcome::AlreadyGone)
        }
        Err(source @ ServiceError::DeleteConflict(_)) => {
            let e = ReconcileError::StillReferenced {
                arn: arn.to_owned(),
                source,
            };
            warn!("{e}");
            Err(e)
        }
        Err(source) => {
            warn!("could not delete {arn}: {source}");
            Err(ReconcileError::Delete {
                arn: arn.to_owned(),
                source,
            })
        }
    }
}

async fn delete_versions_then_policy<S: IdentityService + ?Sized>(
    service: &S,
    arn: &PolicyArn,
) -> Result<(), ServiceError> {
    let versions = service.list_policy_versions(arn).await?;
    for version in versions.iter().filter(|v| !v.is_default) {
        debug!("deleting version {} of {arn}", version.version_id);
        service
            .delete_policy_version(arn, &version.version_id)
            .await?;
    }
    service.delete_policy(arn).await
}
