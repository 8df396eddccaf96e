//! Deterministic identifiers for customer-managed policies.
//!

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The partition used when the caller identity doesn't say otherwise.
pub const DEFAULT_PARTITION: &str = "aws";

/// The account a session is operating in, as reported by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The 12-digit account id
    pub account: String,
    /// The partition (`aws`, `aws-cn`, `aws-us-gov`, ...)
    pub partition: String,
}

impl CallerIdentity {
    /// Build an identity from an account id and the caller's ARN, if one was
    /// returned. The partition is read out of the ARN.
    pub fn new<S: Into<String>>(account: S, caller_arn: Option<&str>) -> Self {
        Self {
            account: account.into(),
            partition: caller_arn
                .and_then(partition_of)
                .unwrap_or(DEFAULT_PARTITION)
                .to_owned(),
        }
    }

    /// The identifier a policy with this name has (or would have) in this
    /// account.
    pub fn policy_arn(&self, policy_name: &str) -> PolicyArn {
        PolicyArn(format!(
            "arn:{}:iam::{}:policy/{}",
            self.partition, self.account, policy_name
        ))
    }
}

/// Pull the partition out of an ARN like `arn:aws-cn:sts::123:assumed-role/x`.
fn partition_of(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    match (parts.next(), parts.next()) {
        (Some("arn"), Some(partition)) if !partition.is_empty() => Some(partition),
        _ => None,
    }
}

/// The identifier of a managed policy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyArn(pub String);

impl PolicyArn {
    /// The policy name: everything after the last `/`.
    pub fn policy_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PolicyArn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PolicyArn {
    fn from(value: &str) -> Self {
        PolicyArn(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_arn_is_deterministic() {
        let id = CallerIdentity::new("123456789012", None);
        assert_eq!(
            id.policy_arn("CourseLab-S3").as_str(),
            "arn:aws:iam::123456789012:policy/CourseLab-S3"
        );
        assert_eq!(id.policy_arn("CourseLab-S3"), id.policy_arn("CourseLab-S3"));
    }

    #[test]
    fn partition_comes_from_caller_arn() {
        let id = CallerIdentity::new(
            "123456789012",
            Some("arn:aws-cn:sts::123456789012:assumed-role/Admin/me"),
        );
        assert_eq!(id.partition, "aws-cn");
        assert_eq!(
            id.policy_arn("CourseLab-Glue").to_string(),
            "arn:aws-cn:iam::123456789012:policy/CourseLab-Glue"
        );
    }

    #[test]
    fn garbage_caller_arn_falls_back_to_default_partition() {
        let id = CallerIdentity::new("1", Some("not-an-arn"));
        assert_eq!(id.partition, DEFAULT_PARTITION);
    }

    #[test]
    fn policy_name_is_last_path_segment() {
        let arn = PolicyArn::from("arn:aws:iam::1:policy/path/CourseLab-IAM-STS");
        assert_eq!(arn.policy_name(), "CourseLab-IAM-STS");
    }
}
