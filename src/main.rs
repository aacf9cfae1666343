//! Purpose: `linkhook` CLI entry point and command-line definition.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Errors are emitted as a JSON envelope on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Command business logic lives in `command_dispatch`, not here.
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use linkhook::api::{Error, ErrorKind, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LINKHOOK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint(clap_error_hint(&err)));
            }
        },
    };
    command_dispatch::dispatch_command(cli.command, cli.color)
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `linkhook --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "linkhook") else {
        return "Try `linkhook --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `linkhook --help`.".to_string();
    }

    format!("Try `linkhook {} --help`.", parts.join(" "))
}

fn emit_error(err: &Error) {
    let mut body = serde_json::Map::new();
    body.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    if let Some(message) = err.message() {
        body.insert("message".to_string(), json!(message));
    }
    if let Some(hint) = err.hint() {
        body.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        body.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(target) = err.target() {
        body.insert("target".to_string(), json!(target));
    }
    let envelope = json!({ "error": Value::Object(body) });
    let _ = writeln!(io::stderr(), "{envelope}");
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Parser)]
#[command(
    name = "linkhook",
    version,
    about = "Dependency-link annotation for native build graphs",
    long_about = None,
    after_help = r#"EXAMPLES
  $ linkhook apply build.json --json
  $ linkhook arch /usr/bin/aarch64-linux-gnu-gcc
  $ linkhook fetch js --dir web/ -- --omit=dev

Set LINKHOOK_LOG=debug to trace link and hook activity on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize human-readable output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run a configuration pass from a manifest and print the link graph")]
    Apply {
        #[arg(value_hint = ValueHint::FilePath, help = "Path to the JSON manifest")]
        manifest: PathBuf,
        #[arg(long, help = "Emit the full report as JSON")]
        json: bool,
    },
    #[command(about = "Detect cpu architecture and platform from a compiler path")]
    Arch {
        #[arg(value_hint = ValueHint::FilePath, help = "Compiler path to probe")]
        compiler: PathBuf,
        #[arg(long, help = "Emit the result as JSON")]
        json: bool,
    },
    #[command(about = "Run a package-fetch helper in a working directory")]
    Fetch {
        #[command(subcommand)]
        command: FetchCommandCli,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct FetchArgs {
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath, help = "Working directory")]
    dir: PathBuf,
    #[arg(long, help = "Override the package-manager program")]
    program: Option<String>,
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Extra options passed through to the program"
    )]
    options: Vec<String>,
}

#[derive(Subcommand)]
enum FetchCommandCli {
    #[command(about = "Restore native packages (vcpkg install)")]
    Native {
        #[command(flatten)]
        args: FetchArgs,
    },
    #[command(about = "Install JavaScript packages (npm install)")]
    Js {
        #[command(flatten)]
        args: FetchArgs,
    },
}

fn completion_command() -> clap::Command {
    Cli::command()
}
