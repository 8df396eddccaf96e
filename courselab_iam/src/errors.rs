//! Translate SDK errors into [`ServiceError`]s.
//!

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use courselab_core::ServiceError;

use crate::consts;

/// Classify a failed SDK call by its error code. Works for both the IAM and
/// STS clients since they share the smithy error types.
pub(crate) fn translate<E, R>(err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = err
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    from_code(err.code(), message)
}

pub(crate) fn from_code(code: Option<&str>, message: String) -> ServiceError {
    match code {
        Some(consts::NO_SUCH_ENTITY) => ServiceError::NoSuchEntity(message),
        Some(consts::ENTITY_ALREADY_EXISTS) => ServiceError::EntityAlreadyExists(message),
        Some(consts::DELETE_CONFLICT) => ServiceError::DeleteConflict(message),
        Some(consts::MALFORMED_POLICY_DOCUMENT) => ServiceError::MalformedDocument(message),
        Some(c) if consts::THROTTLING.contains(&c) => ServiceError::Throttled(message),
        Some(c) if consts::ACCESS_DENIED.contains(&c) => ServiceError::AccessDenied(message),
        Some(c) => ServiceError::Other(format!("{c}: {message}")),
        None => ServiceError::Other(message),
    }
}
