//! # Verdict-Hash Subcommand
//!
//! Recomputes the canonical hash and ABI encoding of a `WorkflowVerdict`
//! JSON file, the same bytes the verifier contract re-hashes. Optionally
//! signs it with the operator key, or recovers the signer of an existing
//! signature.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use tribunal_arbitration::{
    recover_verdict_signer, sign_verdict, submit_verdict_calldata, WorkflowVerdict,
};
use tribunal_core::{Address, Bytes32};
use tribunal_crypto::{EnvKeyProvider, RecoverableSignature};
use tribunal_workflow::OPERATOR_KEY_VAR;

/// Arguments for `tribunal verdict-hash`.
#[derive(Args, Debug)]
pub struct VerdictHashArgs {
    /// Path to a verdict JSON file (camelCase fields).
    pub file: PathBuf,

    /// Sign the verdict with `TRIBUNAL_OPERATOR_KEY` and print the
    /// `submitVerdict` calldata.
    #[arg(long, conflicts_with = "signature")]
    pub sign: bool,

    /// Recover the signer of this 65-byte `0x`-hex signature.
    #[arg(long)]
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictReport {
    pub verdict_hash: Bytes32,
    pub encoding: String,
    pub encoded_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calldata: Option<String>,
}

/// Parse a verdict file.
pub fn load_verdict(path: &Path) -> Result<WorkflowVerdict> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading verdict file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing verdict file {}", path.display()))
}

/// Hash and encode a verdict, recovering the signer of `signature` if given.
pub fn describe_verdict(verdict: &WorkflowVerdict, signature: Option<&str>) -> Result<VerdictReport> {
    let encoded = verdict.abi_encode();
    let hash = verdict.hash();
    let signer = match signature {
        Some(sig) => {
            let bytes = hex::decode(sig.trim().trim_start_matches("0x"))
                .context("signature is not valid hex")?;
            let parsed = RecoverableSignature::from_bytes(&bytes).context("parsing signature")?;
            Some(recover_verdict_signer(&hash, &parsed).context("recovering signer")?)
        }
        None => None,
    };
    Ok(VerdictReport {
        verdict_hash: hash,
        encoding: format!("0x{}", hex::encode(&encoded)),
        encoded_bytes: encoded.len(),
        signature: signature.map(|s| s.trim().to_string()),
        signer,
        calldata: None,
    })
}

/// Execute the verdict-hash subcommand.
pub fn run_verdict_hash(args: &VerdictHashArgs) -> Result<u8> {
    let verdict = load_verdict(&args.file)?;
    let mut report = describe_verdict(&verdict, args.signature.as_deref())?;

    if args.sign {
        let key = EnvKeyProvider::from_env(OPERATOR_KEY_VAR).context("loading operator key")?;
        let signed = sign_verdict(verdict, &key).context("signing verdict")?;
        report.signature = Some(signed.signature().to_hex());
        report.signer = Some(signed.signer());
        report.calldata = Some(format!("0x{}", hex::encode(submit_verdict_calldata(&signed))));
    }

    crate::print_json(&report)?;
    Ok(0)
}
