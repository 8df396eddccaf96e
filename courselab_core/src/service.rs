//! The remote identity service, as seen by the reconcilers.
//!
//! Implementations translate their client's errors into [`ServiceError`] so
//! nothing above this boundary needs to know how the remote reports failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::arn::{CallerIdentity, PolicyArn};
use crate::policy::PolicyDocument;
use crate::principal::Principal;

/// A stored revision of a managed policy's document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyVersion {
    /// Remote version id, e.g. `v2`
    pub version_id: String,
    /// Whether this is the current (default) version
    pub is_default: bool,
}

impl PolicyVersion {
    /// Basic constructor
    pub fn new<S: Into<String>>(version_id: S, is_default: bool) -> Self {
        Self {
            version_id: version_id.into(),
            is_default,
        }
    }
}

/// Why a remote call failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The referenced principal, policy, version or attachment doesn't exist
    #[error("no such entity: {0}")]
    NoSuchEntity(String),
    /// A policy with that name already exists
    #[error("entity already exists: {0}")]
    EntityAlreadyExists(String),
    /// The resource is still in use (attachments or versions)
    #[error("delete conflict: {0}")]
    DeleteConflict(String),
    /// Rate limited by the remote
    #[error("throttled: {0}")]
    Throttled(String),
    /// The remote rejected the document
    #[error("malformed policy document: {0}")]
    MalformedDocument(String),
    /// The caller isn't allowed to do this
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Operations offered by the remote identity-and-access-management API.
#[async_trait]
pub trait IdentityService {
    /// The account (and partition) the session operates in.
    async fn caller_identity(&self) -> Result<CallerIdentity, ServiceError>;
    /// Look a principal up by name.
    async fn get_principal(&self, principal: &Principal) -> Result<(), ServiceError>;
    /// All managed policies currently attached to the principal.
    async fn list_attached_policies(
        &self,
        principal: &Principal,
    ) -> Result<Vec<PolicyArn>, ServiceError>;
    /// Create a managed policy and return its identifier.
    async fn create_policy(
        &self,
        name: &str,
        document: &PolicyDocument,
    ) -> Result<PolicyArn, ServiceError>;
    /// Attach a managed policy to a principal.
    async fn attach_policy(&self, principal: &Principal, arn: &PolicyArn)
        -> Result<(), ServiceError>;
    /// Detach a managed policy from a principal.
    async fn detach_policy(&self, principal: &Principal, arn: &PolicyArn)
        -> Result<(), ServiceError>;
    /// Every stored version of a policy.
    async fn list_policy_versions(&self, arn: &PolicyArn)
        -> Result<Vec<PolicyVersion>, ServiceError>;
    /// Delete one stored version.
    async fn delete_policy_version(
        &self,
        arn: &PolicyArn,
        version_id: &str,
    ) -> Result<(), ServiceError>;
    /// Delete the policy itself.
    async fn delete_policy(&self, arn: &PolicyArn) -> Result<(), ServiceError>;
}
