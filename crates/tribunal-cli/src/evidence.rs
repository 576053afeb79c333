//! # Evidence Subcommand
//!
//! Party-side tooling for the private evidence store.
//!
//! ## Subcommands
//!
//! - `submit`: Upload a party's evidence and print the commitment to
//!   record on-chain.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use tribunal_arbitration::Party;
use tribunal_client::{EvidenceClient, EvidenceStoreConfig};
use tribunal_core::{Address, Bytes32};

/// Arguments for the `tribunal evidence` subcommand.
#[derive(Args, Debug)]
pub struct EvidenceArgs {
    #[command(subcommand)]
    pub command: EvidenceCommand,
}

/// Evidence subcommands.
#[derive(Subcommand, Debug)]
pub enum EvidenceCommand {
    /// Upload evidence for one party. Uploads are write-once.
    Submit {
        /// Dispute identifier (0x-prefixed 32 bytes).
        #[arg(long)]
        dispute_id: Bytes32,
        /// Which side is submitting: `a` or `b`.
        #[arg(long)]
        party: Party,
        /// File holding the evidence text (UTF-8).
        #[arg(long)]
        file: PathBuf,
        /// The submitting party's address.
        #[arg(long)]
        party_address: Address,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReport {
    dispute_id: Bytes32,
    party: Party,
    party_address: Address,
    content_hash: Bytes32,
    content_bytes: usize,
}

/// Execute the evidence subcommand.
pub fn run_evidence(args: &EvidenceArgs) -> Result<u8> {
    match &args.command {
        EvidenceCommand::Submit {
            dispute_id,
            party,
            file,
            party_address,
        } => cmd_submit(dispute_id, *party, file, *party_address),
    }
}

fn cmd_submit(dispute_id: &Bytes32, party: Party, file: &Path, party_address: Address) -> Result<u8> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading evidence file {}", file.display()))?;
    let config = EvidenceStoreConfig::from_env().context("loading evidence store configuration")?;
    let client = EvidenceClient::from_config(&config).context("building evidence client")?;

    let content_hash = crate::runtime()?
        .block_on(client.submit(dispute_id, party, party_address, &content))
        .with_context(|| format!("submitting evidence for {party}"))?;

    tracing::info!(
        dispute_id = %dispute_id,
        %party,
        content_hash = %content_hash,
        "evidence stored; record the content hash on-chain"
    );
    crate::print_json(&SubmitReport {
        dispute_id: *dispute_id,
        party,
        party_address,
        content_hash,
        content_bytes: content.len(),
    })?;
    Ok(0)
}
