//! Command handlers that delegate to the supervisor.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Parse/validate CLI-specific input
//!   2. Call `Supervisor` methods
//!   3. Format output for the terminal
//!
//! Core errors are converted to [`CliError`](crate::error::CliError) on the
//! way out so `main` can pick an exit code.

pub mod add;
pub mod close;
pub mod console;
pub mod list;
pub mod paths;
pub mod ports;
pub mod remove;
pub mod run;
pub mod show;
