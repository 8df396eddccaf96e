//!
//! Idempotent provisioning of course IAM policies
//!
//! Creates a fixed set of customer-managed policies from local JSON documents
//! and attaches them to a user or role, or detaches and deletes them again.
//! The remote service is reached through [`service::IdentityService`], so the
//! reconcilers run just as well against [`memory::MemoryIdentityService`].
#![deny(missing_docs)]

pub use arn::{CallerIdentity, PolicyArn};
pub use principal::{Principal, PrincipalKind};
pub use service::{IdentityService, ServiceError};

pub mod arn;
pub mod batch;
pub mod config;
pub mod logging;
pub mod memory;
pub mod policy;
pub mod principal;
pub mod reconcile;
pub mod service;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
