//! # tribunal CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Diagnostics go to stderr; command results go to stdout as JSON.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tribunal_cli::evidence::{run_evidence, EvidenceArgs};
use tribunal_cli::operator::{run_address, AddressArgs};
use tribunal_cli::run::{run_run, RunArgs};
use tribunal_cli::verdict::{run_verdict_hash, VerdictHashArgs};
use tribunal_cli::what_if::{run_what_if, WhatIfArgs};

/// Tribunal operator CLI
///
/// Resolves escrow disputes with a three-model arbitration panel and signs
/// the consensus verdict for on-chain settlement.
#[derive(Parser, Debug)]
#[command(name = "tribunal", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the arbitration workflow for one or more disputes.
    Run(RunArgs),

    /// Recompute consensus with one vote substituted.
    WhatIf(WhatIfArgs),

    /// Hash, encode and optionally sign a verdict JSON file.
    VerdictHash(VerdictHashArgs),

    /// Print the operator address derived from TRIBUNAL_OPERATOR_KEY.
    Address(AddressArgs),

    /// Private evidence store operations.
    Evidence(EvidenceArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG, when set, overrides the verbosity flag.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "tribunal CLI starting");

    let result = match cli.command {
        Commands::Run(args) => run_run(&args),
        Commands::WhatIf(args) => run_what_if(&args),
        Commands::VerdictHash(args) => run_verdict_hash(&args),
        Commands::Address(args) => run_address(&args),
        Commands::Evidence(args) => run_evidence(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribunal_arbitration::{Outcome, Party};
    use tribunal_cli::evidence::EvidenceCommand;

    const ID: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const ID2: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";

    #[test]
    fn cli_parse_run_multiple_ids() {
        let cli = Cli::try_parse_from(["tribunal", "run", "--dispute-id", ID, "--dispute-id", ID2]).unwrap();
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.dispute_ids.len(), 2);
            assert_eq!(args.dispute_ids[1].to_hex(), ID2);
        } else {
            panic!("expected run");
        }
    }

    #[test]
    fn cli_parse_run_requires_an_id() {
        assert!(Cli::try_parse_from(["tribunal", "run"]).is_err());
        assert!(Cli::try_parse_from(["tribunal", "run", "--dispute-id", "0x1234"]).is_err());
    }

    #[test]
    fn cli_parse_what_if() {
        let cli = Cli::try_parse_from([
            "tribunal",
            "what-if",
            "--votes",
            "FAVOR_PARTY_A,favor_party_a,FAVOR_PARTY_B",
            "--confidence",
            "87,82,76",
            "--replace",
            "2=FAVOR_PARTY_A:90",
        ])
        .unwrap();
        if let Commands::WhatIf(args) = cli.command {
            assert_eq!(
                args.votes,
                vec![Outcome::FavorPartyA, Outcome::FavorPartyA, Outcome::FavorPartyB]
            );
            assert_eq!(args.confidence, Some(vec![87, 82, 76]));
            assert_eq!(args.models.len(), 3);
            let replace = args.replace.unwrap();
            assert_eq!(replace.index, 2);
            assert_eq!(replace.confidence_pct, 90);
        } else {
            panic!("expected what-if");
        }
    }

    #[test]
    fn cli_parse_what_if_rejects_unknown_vote() {
        assert!(Cli::try_parse_from(["tribunal", "what-if", "--votes", "A,B,C"]).is_err());
    }

    #[test]
    fn cli_parse_verdict_hash_sign_conflicts_with_signature() {
        let cli = Cli::try_parse_from(["tribunal", "verdict-hash", "v.json", "--sign"]).unwrap();
        if let Commands::VerdictHash(args) = cli.command {
            assert!(args.sign);
            assert_eq!(args.file, std::path::PathBuf::from("v.json"));
        } else {
            panic!("expected verdict-hash");
        }
        assert!(Cli::try_parse_from([
            "tribunal",
            "verdict-hash",
            "v.json",
            "--sign",
            "--signature",
            "0x00"
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_evidence_submit() {
        let cli = Cli::try_parse_from([
            "tribunal",
            "evidence",
            "submit",
            "--dispute-id",
            ID,
            "--party",
            "B",
            "--file",
            "ev.txt",
            "--party-address",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        ])
        .unwrap();
        let Commands::Evidence(args) = cli.command else {
            panic!("expected evidence");
        };
        let EvidenceCommand::Submit { party, party_address, .. } = args.command;
        assert_eq!(party, Party::B);
        assert_eq!(
            party_address.to_checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from(["tribunal", "address", "-vv", "--log-json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Address(_)));
    }
}
