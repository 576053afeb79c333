//! # Address Subcommand
//!
//! `tribunal address` prints the operator address derived from
//! `TRIBUNAL_OPERATOR_KEY`. The key itself is never printed.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use tribunal_crypto::{EnvKeyProvider, KeyProvider};
use tribunal_workflow::OPERATOR_KEY_VAR;

/// Arguments for `tribunal address`.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Print JSON instead of the bare address.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressReport<'a> {
    address: String,
    provider: &'a str,
    source: &'a str,
}

/// Execute the address subcommand.
pub fn run_address(args: &AddressArgs) -> Result<u8> {
    let key = EnvKeyProvider::from_env(OPERATOR_KEY_VAR).context("loading operator key")?;
    let address = key.address().to_checksum();
    if args.json {
        crate::print_json(&AddressReport {
            address,
            provider: key.provider_name(),
            source: key.var_name(),
        })?;
    } else {
        println!("{address}");
    }
    Ok(0)
}
