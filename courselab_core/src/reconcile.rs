//! Idempotent reconciliation of managed policies and their attachments.
//!
//! Each reconciler makes at most a handful of remote calls and maps the
//! outcome into either a success variant (including the "nothing to do"
//! cases) or a [`ReconcileError`]. Nothing is retried here.

mod attach;
mod store;
mod teardown;

use thiserror::Error;

use crate::arn::PolicyArn;
use crate::policy::PolicyFileError;
use crate::principal::Principal;
use crate::service::ServiceError;

pub(crate) use attach::check_principal;
pub use attach::{ensure_attached, AttachOutcome};
pub use store::{ensure_policy, PolicyOutcome};
pub use teardown::{delete, detach, DeleteOutcome, DetachOutcome};

/// Terminal failures for a single policy or (policy, principal) pair.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The local document couldn't be used
    #[error(transparent)]
    PolicyFile(#[from] PolicyFileError),
    /// The account couldn't be determined
    #[error("failed to look up the caller identity: {0}")]
    CallerIdentity(#[source] ServiceError),
    /// Creation failed for a reason other than the policy already existing
    #[error("failed to create policy {name}: {source}")]
    CreatePolicy {
        /// Policy name
        name: String,
        /// Remote failure
        source: ServiceError,
    },
    /// The target user or role doesn't exist
    #[error("{} '{}' does not exist", titled_kind(.0), .0.name)]
    PrincipalMissing(Principal),
    /// Looking the target up failed
    #[error("failed to look up {principal}: {source}")]
    PrincipalLookup {
        /// The target
        principal: Principal,
        /// Remote failure
        source: ServiceError,
    },
    /// The attach call failed
    #[error("failed to attach {arn} to {principal}: {source}")]
    Attach {
        /// The target
        principal: Principal,
        /// The policy
        arn: PolicyArn,
        /// Remote failure
        source: ServiceError,
    },
    /// The detach call failed for a reason other than not being attached
    #[error("could not detach {arn} from {principal}: {source}")]
    Detach {
        /// The target
        principal: Principal,
        /// The policy
        arn: PolicyArn,
        /// Remote failure
        source: ServiceError,
    },
    /// The policy is still attached somewhere else
    #[error(
        "cannot delete {arn}: still attached to another entity. \
        Detach it from every user, role and group first"
    )]
    StillReferenced {
        /// The policy
        arn: PolicyArn,
        /// Remote failure
        source: ServiceError,
    },
    /// Any other deletion failure
    #[error("could not delete {arn}: {source}")]
    Delete {
        /// The policy
        arn: PolicyArn,
        /// Remote failure
        source: ServiceError,
    },
}

fn titled_kind(principal: &Principal) -> String {
    let kind = principal.kind.to_string();
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
