//! # tribunal-cli
//!
//! Operator tooling for the Tribunal arbitration workflow.
//!
//! ## Subcommands
//!
//! - `run`: Execute the workflow for one or more disputes.
//! - `what-if`: Recompute consensus with one vote substituted.
//! - `verdict-hash`: Hash (and optionally sign) a verdict JSON file.
//! - `address`: Derive the operator address from the configured key.
//! - `evidence`: Submit evidence to the private store.

pub mod evidence;
pub mod operator;
pub mod run;
pub mod verdict;
pub mod what_if;

use anyhow::Context;
use serde::Serialize;

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}

/// Multi-threaded runtime for the async subcommands.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("starting tokio runtime")
}
