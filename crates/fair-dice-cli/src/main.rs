//! Fair Dice CLI
//!
//! Plays a provably fair dice round against the system over the console,
//! prints win-probability tables, and audits round transcripts.

mod console;
mod table;

use clap::{Parser, Subcommand};
use console::ConsolePresenter;
use fair_dice_core::{
    crypto, DiceRoundCoordinator, DiceSet, Mac, ProtocolError, RevealedKey, RoundRecord,
    SelectionMode,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fair-dice", version, about = "Provably fair dice over a text channel")]
struct Cli {
    /// Log protocol steps to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play one round against the system
    Play {
        /// Choose the system's die yourself instead of by fair draw
        #[arg(long)]
        manual_selection: bool,

        /// Write the dice, outcome and every draw as JSON to this file
        #[arg(long, value_name = "PATH")]
        transcript: Option<PathBuf>,

        /// Dice as comma-separated faces, e.g. 2,2,4,4,9,9
        #[arg(required = true, allow_hyphen_values = true, value_name = "DIE")]
        dice: Vec<String>,
    },

    /// Print the pairwise win-probability table
    Table {
        #[arg(required = true, allow_hyphen_values = true, value_name = "DIE")]
        dice: Vec<String>,
    },

    /// Recompute every MAC and combination in a round file and replay the outcome
    Audit { path: PathBuf },

    /// Check a single revealed key and value against a published MAC
    Verify {
        #[arg(long)]
        key: String,

        #[arg(long, allow_hyphen_values = true)]
        value: i64,

        #[arg(long)]
        mac: String,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(command: Command) -> Result<(), ProtocolError> {
    match command {
        Command::Play {
            manual_selection,
            transcript,
            dice,
        } => play(&dice, manual_selection, transcript),
        Command::Table { dice } => {
            let dice = DiceSet::parse(&dice)?;
            println!("{}", table::render_probability_table(&dice));
            Ok(())
        }
        Command::Audit { path } => audit(path),
        Command::Verify { key, value, mac } => {
            let key: RevealedKey = key.parse()?;
            let mac: Mac = mac.parse()?;
            crypto::verify(&key, value, &mac)?;
            println!("OK: HMAC-SHA3-256(key, \"{value}\") matches {mac}");
            Ok(())
        }
    }
}

fn play(dice: &[String], manual_selection: bool, transcript: Option<PathBuf>) -> Result<(), ProtocolError> {
    let dice = DiceSet::parse(dice)?;
    let mode = if manual_selection {
        SelectionMode::Manual
    } else {
        SelectionMode::Automatic
    };

    let presenter = ConsolePresenter::new(io::stdin().lock(), io::stdout(), dice.clone());
    let mut round = DiceRoundCoordinator::new(&dice, mode, presenter)?;
    let result = round.play();

    // Aborted rounds are written too; they cover every revealed draw.
    if let Some(path) = transcript {
        let record = match &result {
            Ok(report) => RoundRecord::completed(&dice, mode, report),
            Err(_) => RoundRecord::aborted(&dice, mode, round.transcript()),
        };
        std::fs::write(&path, record.to_json()?)?;
        info!(path = %path.display(), "Transcript written");
    }

    let report = result?;
    info!(round_id = %report.round_id, verdict = %report.verdict, "Done");
    Ok(())
}

fn audit(path: PathBuf) -> Result<(), ProtocolError> {
    let json = std::fs::read_to_string(&path)?;
    let record = RoundRecord::from_json(&json)?;
    let round_id = record.transcript.round_id;
    if let Err(e) = record.verify() {
        warn!(%round_id, error = %e, "Audit failed");
        return Err(e);
    }
    let draws = record.transcript.entries.len();
    match record.outcome {
        Some(outcome) => println!(
            "Round {round_id}: all {draws} draws verified. {} ({} vs {}).",
            outcome.verdict, outcome.system_roll, outcome.peer_roll
        ),
        None => println!("Round {round_id}: all {draws} draws verified (round aborted)."),
    }
    Ok(())
}

fn exit_code(error: &ProtocolError) -> u8 {
    match error {
        ProtocolError::InvalidRange { .. }
        | ProtocolError::InvalidConfiguration(_)
        | ProtocolError::InvalidContribution { .. }
        | ProtocolError::InvalidEncoding(_) => 1,
        ProtocolError::AbortedByPeer => 2,
        ProtocolError::VerificationFailure { .. }
        | ProtocolError::TranscriptMismatch(_)
        | ProtocolError::Transcript(_)
        | ProtocolError::CryptoUnavailable(_) => 3,
        ProtocolError::Io(_) => 4,
    }
}
