//! courselab CLI
//!

#![deny(missing_docs)]

use std::process::ExitCode;

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    courselab_lib::cli().await
}
