//! # Run Subcommand
//!
//! Executes the arbitration workflow against live services, configured
//! from the environment. Each successful run prints its `WorkflowOutput`
//! as one JSON line on stdout.
//!
//! With the `first` batch policy only the first dispute id is processed;
//! `TRIBUNAL_BATCH_POLICY=all` processes every id in order.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use tribunal_core::Bytes32;
use tribunal_crypto::{EnvKeyProvider, KeyProvider};
use tribunal_workflow::{StdoutSink, Workflow, WorkflowConfig, OPERATOR_KEY_VAR};

/// Arguments for `tribunal run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dispute identifiers (0x-prefixed 32 bytes). Repeatable.
    #[arg(long = "dispute-id", required = true)]
    pub dispute_ids: Vec<Bytes32>,
}

/// Execute the run subcommand.
///
/// Returns exit code 1 if any processed dispute failed.
pub fn run_run(args: &RunArgs) -> Result<u8> {
    let config = WorkflowConfig::from_env().context("loading workflow configuration")?;
    let signer: Arc<dyn KeyProvider> =
        Arc::new(EnvKeyProvider::from_env(OPERATOR_KEY_VAR).context("loading operator key")?);
    tracing::info!(
        operator = %signer.address(),
        mode = ?config.submission_mode,
        batch = ?config.batch_policy,
        disputes = args.dispute_ids.len(),
        "starting arbitration"
    );

    let workflow = Workflow::from_config(&config, signer, Arc::new(StdoutSink))
        .context("wiring workflow")?;
    let runs = crate::runtime()?
        .block_on(workflow.run_pending(&args.dispute_ids))
        .context("running workflow")?;

    let mut failed = 0usize;
    for run in runs {
        match run.result {
            Ok(report) => {
                if let Some(tx) = report.transaction_hash {
                    tracing::info!(dispute_id = %run.dispute_id, transaction = %tx, "verdict submitted");
                }
            }
            Err(e) => {
                failed += 1;
                let stage = e.stage();
                let e = anyhow::Error::new(e);
                tracing::error!(dispute_id = %run.dispute_id, stage = ?stage, "{e:#}");
            }
        }
    }
    Ok(u8::from(failed > 0))
}
