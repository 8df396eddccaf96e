//! Make sure a managed policy exists.

use crate::arn::{CallerIdentity, PolicyArn};
use crate::logging::{error, info};
use crate::policy::PolicyDocument;
use crate::service::{IdentityService, ServiceError};

use super::ReconcileError;

/// What `ensure_policy` found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// A new policy was created
    Created(PolicyArn),
    /// A policy with that name was already there; its document was left alone
    AlreadyExists(PolicyArn),
}

impl PolicyOutcome {
    /// The policy's identifier either way.
    pub fn arn(&self) -> &PolicyArn {
        match self {
            PolicyOutcome::Created(arn) | PolicyOutcome::AlreadyExists(arn) => arn,
        }
    }
}

/// Create the policy `name` from `document`, or resolve the existing one.
///
/// An existing policy resolves to the identifier derived from `identity`
/// rather than erroring. Existing documents are never updated.
pub async fn ensure_policy<S: IdentityService + ?Sized>(
    service: &S,
    identity: &CallerIdentity,
    name: &str,
    document: &PolicyDocument,
) -> Result<PolicyOutcome, ReconcileError> {
    match service.create_policy(name, document).await {
        Ok(arn) => {
            info!("created IAM policy {name}");
            Ok(PolicyOutcome::Created(arn))
        }
        Err(ServiceError::EntityAlreadyExists(_)) => {
            info!("IAM policy {name} already exists");
            Ok(PolicyOutcome::AlreadyExists(identity.policy_arn(name)))
        }
        Err(source) => {
            error!("failed to create policy {name}: {source}");
            Err(ReconcileError::CreatePolicy {
                name: name.to_owned(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;
    use serde_json::json;

    use crate::memory::MemoryIdentityService;

    fn doc() -> PolicyDocument {
        PolicyDocument(json!({"Version": "2012-10-17", "Statement": []}))
    }

    #[tokio::test]
    async fn creates_when_absent() -> Result<()> {
        let svc = MemoryIdentityService::default();
        let id = svc.caller_identity().await?;
        let outcome = ensure_policy(&svc, &id, "CourseLab-S3", &doc()).await?;
        assert_eq!(
            outcome,
            PolicyOutcome::Created(id.policy_arn("CourseLab-S3"))
        );
        assert!(svc.policy_exists(outcome.arn()).await);
        Ok(())
    }

    #[tokio::test]
    async fn resolves_existing_without_touching_the_document() -> Result<()> {
        let svc = MemoryIdentityService::default();
        let id = svc.caller_identity().await?;
        ensure_policy(&svc, &id, "CourseLab-S3", &doc()).await?;

        let changed = PolicyDocument(json!({"Version": "2012-10-17", "Statement": [1]}));
        let outcome = ensure_policy(&svc, &id, "CourseLab-S3", &changed).await?;
        assert_eq!(
            outcome,
            PolicyOutcome::AlreadyExists(id.policy_arn("CourseLab-S3"))
        );
        assert_eq!(svc.policy_document(outcome.arn()).await, Some(doc()));
        Ok(())
    }

    #[tokio::test]
    async fn other_errors_fail_without_retry() -> Result<()> {
        let svc = MemoryIdentityService::default();
        let id = svc.caller_identity().await?;
        svc.fail_on(
            "create_policy",
            ServiceError::Throttled("Rate exceeded".to_owned()),
        )
        .await;

        let res = ensure_policy(&svc, &id, "CourseLab-S3", &doc()).await;
        assert!(matches!(res, Err(ReconcileError::CreatePolicy { .. })));
        assert_eq!(svc.call_count("create_policy").await, 1);
        Ok(())
    }
}
