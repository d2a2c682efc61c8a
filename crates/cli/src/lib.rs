pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "comexflow",
    about = "ComExFlow approval-hierarchy CLI",
    long_about = "Inspect extension-program approval chains: who must sign a form next, \
                  which roles participate, and whether a form instance is fully approved.",
    after_help = "Examples:\n  comexflow resolve --form 1 --approved dean\n  comexflow chain --form 3\n  comexflow doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve the next required approver for a form instance")]
    Resolve {
        #[arg(long, help = "Form template code (1-14 in the built-in table)")]
        form: u16,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Roles that have already approved, comma-separated"
        )]
        approved: Vec<String>,
        #[arg(long, help = "Role to check for chain membership")]
        role: Option<String>,
    },
    #[command(about = "Show the configured approval policy for a form template")]
    Chain {
        #[arg(long, help = "Form template code")]
        form: u16,
    },
    #[command(about = "List all configured form templates and their policy shapes")]
    Forms,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate configuration and run resolver readiness checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Command::Resolve { form, approved, role } => {
            commands::resolve::run(form, &approved, role.as_deref())
        }
        Command::Chain { form } => commands::chain::run(form),
        Command::Forms => commands::forms::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
