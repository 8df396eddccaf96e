//! Make sure a managed policy is attached to a principal.

use crate::arn::PolicyArn;
use crate::logging::{error, info, warn};
use crate::principal::Principal;
use crate::service::{IdentityService, ServiceError};

use super::ReconcileError;

/// What `ensure_attached` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The attach call was made
    Attached,
    /// Already attached; no mutation was made
    AlreadyAttached,
}

/// Check that `principal` exists, then attach `arn` unless it already is.
///
/// A failure to list the current attachments isn't fatal: it's logged and
/// the attach is attempted anyway.
pub async fn ensure_attached<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
    arn: &PolicyArn,
) -> Result<AttachOutcome, ReconcileError> {
    check_principal(service, principal).await?;

    match service.list_attached_policies(principal).await {
        Ok(attached) if attached.contains(arn) => {
            info!("policy {arn} already attached to {principal}");
            return Ok(AttachOutcome::AlreadyAttached);
        }
        Ok(_) => (),
        Err(e) => warn!("could not list attached policies for {principal}: {e}"),
    }

    match service.attach_policy(principal, arn).await {
        Ok(()) => {
            info!("attached {arn} to {principal}");
            Ok(AttachOutcome::Attached)
        }
        Err(source) => {
            error!("failed to attach {arn} to {principal}: {source}");
            Err(ReconcileError::Attach {
                principal: principal.to_owned(),
                arn: arn.to_owned(),
                source,
            })
        }
    }
}

/// Fail with `PrincipalMissing` if the principal can't be found.
pub(crate) async fn check_principal<S: IdentityService + ?Sized>(
    service: &S,
    principal: &Principal,
) -> Result<(), ReconcileError> {
    match service.get_principal(principal).await {
        Ok(()) => Ok(()),
        Err(ServiceError::NoSuchEntity(_)) => {
            let e = ReconcileError::PrincipalMissing(principal.to_owned());
            error!("{e}");
            Err(e)
        }
        Err(source) => {
            error!("failed to look up {principal}: {source}");
            Err(ReconcileError::PrincipalLookup {
                principal: principal.to_owned(),
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
    use crate::policy::PolicyDocument;

    async fn service_with_policy() -> Result<(MemoryIdentityService, PolicyArn)> {
        let svc = MemoryIdentityService::default()
            .with_user("learner")
            .with_role("CourseLabRole");
        let arn = svc
            .create_policy("CourseLab-S3", &PolicyDocument(json!({})))
            .await?;
        Ok((svc, arn))
    }

    #[tokio::test]
    async fn attaches_then_reports_already_attached() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        let learner = Principal::user("learner");

        assert_eq!(
            ensure_attached(&svc, &learner, &arn).await?,
            AttachOutcome::Attached
        );
        assert_eq!(
            ensure_attached(&svc, &learner, &arn).await?,
            AttachOutcome::AlreadyAttached
        );
        assert_eq!(svc.call_count("attach_policy").await, 1);
        assert!(svc.is_attached(&learner, &arn).await);
        Ok(())
    }

    #[tokio::test]
    async fn works_for_roles() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        let role = Principal::role("CourseLabRole");
        ensure_attached(&svc, &role, &arn).await?;
        assert!(svc.is_attached(&role, &arn).await);
        Ok(())
    }

    #[tokio::test]
    async fn missing_principal_fails_before_attaching() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        let ghost = Principal::user("ghost");

        let res = ensure_attached(&svc, &ghost, &arn).await;
        assert!(matches!(res, Err(ReconcileError::PrincipalMissing(_))));
        assert_eq!(svc.call_count("list_attached_policies").await, 0);
        assert_eq!(svc.call_count("attach_policy").await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn other_lookup_failures_are_not_reported_as_missing() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        svc.fail_on(
            "get_principal",
            ServiceError::AccessDenied("not authorized".to_owned()),
        )
        .await;
        let res = ensure_attached(&svc, &Principal::user("learner"), &arn).await;
        assert!(matches!(res, Err(ReconcileError::PrincipalLookup { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_falls_back_to_attaching() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        let learner = Principal::user("learner");
        svc.fail_on(
            "list_attached_policies",
            ServiceError::Throttled("Rate exceeded".to_owned()),
        )
        .await;

        assert_eq!(
            ensure_attached(&svc, &learner, &arn).await?,
            AttachOutcome::Attached
        );
        assert!(svc.is_attached(&learner, &arn).await);

        svc.clear_failure("list_attached_policies").await;
        assert_eq!(
            ensure_attached(&svc, &learner, &arn).await?,
            AttachOutcome::AlreadyAttached
        );
        Ok(())
    }

    #[tokio::test]
    async fn attach_failure_is_terminal() -> Result<()> {
        let (svc, arn) = service_with_policy().await?;
        svc.fail_on(
            "attach_policy",
            ServiceError::Other("LimitExceeded".to_owned()),
        )
        .await;
        let res = ensure_attached(&svc, &Principal::user("learner"), &arn).await;
        assert!(matches!(res, Err(ReconcileError::Attach { .. })));
        Ok(())
    }
}
