/// IAM is global; requests are signed for this region unless configured otherwise.
pub const DEFAULT_REGION: &str = "us-east-1";

pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
pub const ENTITY_ALREADY_EXISTS: &str = "EntityAlreadyExists";
pub const DELETE_CONFLICT: &str = "DeleteConflict";
pub const MALFORMED_POLICY_DOCUMENT: &str = "MalformedPolicyDocument";
pub const THROTTLING: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];
pub const ACCESS_DENIED: &[&str] = &["AccessDenied", "AccessDeniedException"];
