//! AWS IAM Connector
//!
//! Everything needed to reconcile courselab policies against a real AWS
//! account, through the IAM and STS APIs.
//!
//! ```no_run
//! # async fn run() {
//! use courselab_core::IdentityService;
//! use courselab_iam::IamService;
//!
//! let iam = IamService::from_env(None).await;
//! let identity = iam.caller_identity().await;
//! # }
//! ```

mod consts;
mod errors;

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, SdkConfig};
use aws_sdk_iam::config::Region;
use async_trait::async_trait;

use courselab_core::{
    logging::debug,
    policy::PolicyDocument,
    service::{IdentityService, PolicyVersion, ServiceError},
    CallerIdentity, PolicyArn, Principal, PrincipalKind,
};

use errors::translate;

/// The main IAM connector struct.
///
/// Holds one IAM and one STS client sharing the same credentials.
#[derive(Clone, Debug)]
pub struct IamService {
    iam: aws_sdk_iam::Client,
    sts: aws_sdk_sts::Client,
}

impl IamService {
    /// Load credentials and region from the standard provider chain,
    /// optionally from a named profile.
    pub async fn from_env(profile: Option<&str>) -> Self {
        let region = RegionProviderChain::default_provider().or_else(Region::new(consts::DEFAULT_REGION));
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(profile) = profile {
            debug!("using AWS profile {profile}");
            loader = loader.profile_name(profile);
        }
        Self::new(&loader.load().await)
    }

    /// Build both clients from a shared config.
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }

    /// Use pre-built clients (e.g. pointed at a custom endpoint).
    pub fn from_clients(iam: aws_sdk_iam::Client, sts: aws_sdk_sts::Client) -> Self {
        Self { iam, sts }
    }

    /// One page of attached policies plus the marker for the next page, if
    /// there is one.
    async fn attached_page(
        &self,
        principal: &Principal,
        marker: Option<String>,
    ) -> Result<(Vec<PolicyArn>, Option<String>), ServiceError> {
        let (policies, truncated, next) = match principal.kind {
            PrincipalKind::User => {
                let out = self
                    .iam
                    .list_attached_user_policies()
                    .user_name(&principal.name)
                    .set_marker(marker)
                    .send()
                    .await
                    .map_err(translate)?;
                (
                    out.attached_policies().to_vec(),
                    out.is_truncated(),
                    out.marker().map(str::to_owned),
                )
            }
            PrincipalKind::Role => {
                let out = self
                    .iam
                    .list_attached_role_policies()
                    .role_name(&principal.name)
                    .set_marker(marker)
                    .send()
                    .await
                    .map_err(translate)?;
                (
                    out.attached_policies().to_vec(),
                    out.is_truncated(),
                    out.marker().map(str::to_owned),
                )
            }
        };
        let arns = policies
            .iter()
            .filter_map(|p| p.policy_arn())
            .map(PolicyArn::from)
            .collect();
        Ok((arns, next.filter(|_| truncated)))
    }
}

#[async_trait]
impl IdentityService for IamService {
    async fn caller_identity(&self) -> Result<CallerIdentity, ServiceError> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(translate)?;
        let account = out.account().ok_or_else(|| {
            ServiceError::Other("STS GetCallerIdentity returned no account".to_owned())
        })?;
        Ok(CallerIdentity::new(account, out.arn()))
    }

    async fn get_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        match principal.kind {
            PrincipalKind::User => self
                .iam
                .get_user()
                .user_name(&principal.name)
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
            PrincipalKind::Role => self
                .iam
                .get_role()
                .role_name(&principal.name)
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
        }
    }

    async fn list_attached_policies(
        &self,
        principal: &Principal,
    ) -> Result<Vec<PolicyArn>, ServiceError> {
        let mut arns = vec![];
        let mut marker = None;
        loop {
            let (page, next) = self.attached_page(principal, marker).await?;
            arns.extend(page);
            match next {
                Some(m) => marker = Some(m),
                None => break,
            }
        }
        Ok(arns)
    }

    async fn create_policy(
        &self,
        name: &str,
        document: &PolicyDocument,
    ) -> Result<PolicyArn, ServiceError> {
        let out = self
            .iam
            .create_policy()
            .policy_name(name)
            .policy_document(document.to_json())
            .send()
            .await
            .map_err(translate)?;
        out.policy()
            .and_then(|p| p.arn())
            .map(PolicyArn::from)
            .ok_or_else(|| ServiceError::Other(format!("CreatePolicy returned no ARN for {name}")))
    }

    async fn attach_policy(
        &self,
        principal: &Principal,
        arn: &PolicyArn,
    ) -> Result<(), ServiceError> {
        match principal.kind {
            PrincipalKind::User => self
                .iam
                .attach_user_policy()
                .user_name(&principal.name)
                .policy_arn(arn.as_str())
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
            PrincipalKind::Role => self
                .iam
                .attach_role_policy()
                .role_name(&principal.name)
                .policy_arn(arn.as_str())
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
        }
    }

    async fn detach_policy(
        &self,
        principal: &Principal,
        arn: &PolicyArn,
    ) -> Result<(), ServiceError> {
        match principal.kind {
            PrincipalKind::User => self
                .iam
                .detach_user_policy()
                .user_name(&principal.name)
                .policy_arn(arn.as_str())
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
            PrincipalKind::Role => self
                .iam
                .detach_role_policy()
                .role_name(&principal.name)
                .policy_arn(arn.as_str())
                .send()
                .await
                .map(|_| ())
                .map_err(translate),
        }
    }

    async fn list_policy_versions(
        &self,
        arn: &PolicyArn,
    ) -> Result<Vec<PolicyVersion>, ServiceError> {
        let out = self
            .iam
            .list_policy_versions()
            .policy_arn(arn.as_str())
            .send()
            .await
            .map_err(translate)?;
        Ok(out
            .versions()
            .iter()
            .filter_map(|v| {
                v.version_id()
                    .map(|id| PolicyVersion::new(id, v.is_default_version()))
            })
            .collect())
    }

    async fn delete_policy_version(
        &self,
        arn: &PolicyArn,
        version_id: &str,
    ) -> Result<(), ServiceError> {
        self.iam
            .delete_policy_version()
            .policy_arn(arn.as_str())
            .version_id(version_id)
            .send()
            .await
            .map(|_| ())
            .map_err(translate)
    }

    async fn delete_policy(&self, arn: &PolicyArn) -> Result<(), ServiceError> {
        self.iam
            .delete_policy()
            .policy_arn(arn.as_str())
            .send()
            .await
            .map(|_| ())
            .map_err(translate)
    }
}
