//! DTT bridge command-line probe.
//!
//! # Responsibility
//! - Print the exact wire object for a command built from arguments.
//! - Replay a file of core replies through a scripted session and print the
//!   resulting held state.
//!
//! Logging follows `DTT_LOG_LEVEL` / `DTT_LOG_DIR`; a logging failure is
//! reported on stderr and does not stop the command.

mod replay;

use clap::{Parser, Subcommand};
use dtt_bridge::command::{self, Intent};
use dtt_bridge::{Action, BridgeConfig, Domain};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "dtt")]
#[command(version, about = "DTT synchronization bridge probe", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the wire JSON of one command
    Command {
        /// Target domain: todo, secrets, budget
        #[arg(value_parser = Domain::from_str)]
        page: Domain,

        /// Action: insert, update, delete, sync
        #[arg(value_parser = Action::from_str)]
        action: Action,

        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        content: Option<String>,

        /// Signed cent amount (budget only)
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<i64>,
    },

    /// Feed a file of JSON replies (one per line) through a scripted session
    Replay {
        file: PathBuf,

        #[arg(long, default_value = "dtt")]
        user: String,
    },

    /// Print the bridge version
    Version,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = BridgeConfig::from_env().init_logging() {
        eprintln!("dtt: logging disabled: {err}");
    }

    match run(args.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("dtt: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: CliCommand) -> Result<String, String> {
    match command {
        CliCommand::Command {
            page,
            action,
            id,
            content,
            amount,
        } => render_command(
            page,
            action,
            Intent {
                id,
                content,
                amount,
            },
        ),
        CliCommand::Replay { file, user } => {
            let report = replay::run_replay(&file, &user)?;
            info!(
                "event=replay module=cli status=ok accepted={} dropped={}",
                report.accepted, report.dropped
            );
            Ok(report.to_string())
        }
        CliCommand::Version => Ok(format!("dtt_bridge version={}", dtt_bridge::bridge_version())),
    }
}

fn render_command(page: Domain, action: Action, intent: Intent) -> Result<String, String> {
    let command = command::build(page, action, intent).map_err(|err| err.to_string())?;
    let wire = command
        .to_wire()
        .map_err(|err| format!("failed to encode command: {err}"))?;
    serde_json::to_string(&wire).map_err(|err| format!("failed to render command: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{render_command, run, Args, CliCommand};
    use clap::Parser;
    use dtt_bridge::command::Intent;
    use dtt_bridge::{Action, Domain};

    #[test]
    fn command_subcommand_parses_page_action_and_negative_amount() {
        let args = Args::try_parse_from([
            "dtt", "command", "budget", "insert", "--content", "coffee", "--amount", "-350",
        ])
        .expect("arguments should parse");

        match args.command {
            CliCommand::Command {
                page,
                action,
                content,
                amount,
                ..
            } => {
                assert_eq!(page, Domain::Budget);
                assert_eq!(action, Action::Insert);
                assert_eq!(content.as_deref(), Some("coffee"));
                assert_eq!(amount, Some(-350));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_page_is_rejected_by_the_parser() {
        assert!(Args::try_parse_from(["dtt", "command", "notes", "sync"]).is_err());
    }

    #[test]
    fn render_command_prints_wire_json() {
        let output = render_command(
            Domain::Todo,
            Action::Delete,
            Intent {
                id: Some("7".to_string()),
                content: Some("ignored".to_string()),
                amount: None,
            },
        )
        .expect("delete with id should build");

        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(
            value,
            serde_json::json!({"page": "todo", "action": "delete", "id": "7", "content": null})
        );
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = render_command(Domain::Secrets, Action::Delete, Intent::default())
            .expect_err("secrets delete needs content");
        assert!(err.contains("requires content"));
    }

    #[test]
    fn version_prints_bridge_version() {
        let output = run(CliCommand::Version).expect("version never fails");
        assert!(output.contains(dtt_bridge::bridge_version()));
    }
}
