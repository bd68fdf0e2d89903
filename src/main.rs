//! `safeplate-cli` entry point.
//!
//! ## Subcommands
//!
//! - `guard` - run a JSON payload through the pipeline (exit 0/1/2)
//! - `scan` - list suspicious patterns in a string
//! - `sanitize` - print the sanitized form of a string
//! - `taxonomy` - print the allergen taxonomy
//! - `config` - show, defaults, validate

use std::process::ExitCode;

use safeplate::cli::{self, config_cmd, EXIT_USAGE};
use safeplate::config;
use safeplate::telemetry;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    init_telemetry();

    let code = match command {
        "guard" => cli::run_guard(&args[2..]),
        "scan" => match text_arg(&args, "scan") {
            Some(text) => cli::run_scan(&text),
            None => EXIT_USAGE,
        },
        "sanitize" => match text_arg(&args, "sanitize") {
            Some(text) => cli::run_sanitize(&text),
            None => EXIT_USAGE,
        },
        "taxonomy" => {
            let json_output = args.get(2).map(|s| s.as_str()) == Some("--json");
            cli::run_taxonomy(json_output)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    0
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    0
                }
                "validate" => config_cmd::run_validate(),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    EXIT_USAGE
                }
            }
        }
        "help" | "--help" | "-h" => {
            match args.get(2) {
                Some(subcommand) => print_command_help(subcommand),
                None => print_usage(),
            }
            0
        }
        "version" | "--version" | "-V" => {
            println!("safeplate-cli {}", env!("CARGO_PKG_VERSION"));
            0
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            EXIT_USAGE
        }
    };
    ExitCode::from(code as u8)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_telemetry() {
    let log_config = config::load().logging;
    if let Err(e) = telemetry::init_logging(&log_config) {
        eprintln!("logging disabled: {}", e);
    }
    telemetry::init_metrics();
}

/// Remaining arguments joined by spaces, or a usage message if none.
fn text_arg(args: &[String], command: &str) -> Option<String> {
    if args.len() < 3 {
        print_command_help(command);
        return None;
    }
    Some(args[2..].join(" "))
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "safeplate-cli - SafePlate trust & safety pipeline v{}

USAGE:
    safeplate-cli <COMMAND> [OPTIONS]

COMMANDS:
    guard        Run a JSON payload through rate limit, validation, sanitization and allergen matching
    scan         List suspicious patterns found in text
    sanitize     Print text with all markup stripped
    taxonomy     Print the allergen taxonomy
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

EXAMPLES:
    safeplate-cli guard --caller user-7 --endpoint ai < recipe.json
    safeplate-cli guard --caller 10.0.0.1 --allergens milk,peanuts --file recipe.json
    safeplate-cli scan \"<img src=x onerror=alert(1)>\"
    safeplate-cli sanitize \"<b>Fold</b> gently\"
    safeplate-cli taxonomy --json
    safeplate-cli config validate

ENVIRONMENT:
    SAFEPLATE_LOG_LEVEL   Log filter (default: info)
    SAFEPLATE_LOG_FORMAT  json or pretty (default: json)
    SAFEPLATE_*           Rate-limit overrides, see `safeplate-cli config defaults`

EXIT CODES:
    0  Success / accepted / clean
    1  Rejected / suspicious / invalid configuration
    2  Usage or input error",
        version
    );
}

fn print_command_help(command: &str) {
    match command {
        "guard" => eprintln!(
            "safeplate-cli guard --caller ID [--endpoint CLASS] [--allergens a,b] [--file F]

Reads a JSON payload from F or stdin and prints the outcome as JSON.

OPTIONS:
    --caller ID        Caller identifier (user id or client address)
    --endpoint CLASS   ai, write, feedback or standard (default: standard)
    --allergens LIST   Comma-separated allergen ids to flag
    --file F           Read the payload from F instead of stdin"
        ),
        "scan" => eprintln!("safeplate-cli scan TEXT\n\nExit 1 if TEXT contains a suspicious pattern."),
        "sanitize" => eprintln!("safeplate-cli sanitize TEXT"),
        "taxonomy" => eprintln!("safeplate-cli taxonomy [--json]"),
        "config" => eprintln!(
            "safeplate-cli config <show|defaults|validate>

    show       Print effective configuration
    defaults   Print built-in defaults
    validate   Check configuration, exit 1 on warnings"
        ),
        other => {
            eprintln!("No help for {:?}", other);
            print_usage();
        }
    }
}
