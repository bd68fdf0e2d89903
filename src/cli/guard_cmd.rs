//! `guard` subcommand: run one JSON payload through the pipeline.

use std::io::Read;
use std::path::PathBuf;

use serde_json::Value;

use super::{CliError, EXIT_OK, EXIT_REJECTED, EXIT_USAGE};
use crate::allergens::AllergenProfile;
use crate::guard::CallerIdentity;
use crate::ratelimit::EndpointClass;
use crate::Pipeline;

/// Parsed `guard` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardArgs {
    pub caller: String,
    pub endpoint: EndpointClass,
    pub allergens: AllergenProfile,
    /// Payload file. `None` reads stdin.
    pub file: Option<PathBuf>,
}

/// Parse the options that follow `guard`.
pub fn parse_guard_args(args: &[String]) -> Result<GuardArgs, CliError> {
    let mut caller = None;
    let mut endpoint = EndpointClass::Standard;
    let mut allergens = AllergenProfile::default();
    let mut file = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| CliError::MissingValue(flag.clone()))
        };
        match flag.as_str() {
            "--caller" => caller = Some(value()?),
            "--endpoint" => {
                let raw = value()?;
                endpoint = EndpointClass::parse(&raw).ok_or(CliError::UnknownEndpoint(raw))?;
            }
            "--allergens" => {
                allergens = value()?.split(',').map(str::to_string).collect();
            }
            "--file" => file = Some(PathBuf::from(value()?)),
            other => return Err(CliError::UnknownOption(other.to_string())),
        }
    }

    let caller = caller
        .filter(|c| !c.trim().is_empty())
        .ok_or(CliError::MissingOption("--caller"))?;
    Ok(GuardArgs {
        caller,
        endpoint,
        allergens,
        file,
    })
}

fn read_payload(file: Option<&PathBuf>) -> Result<Value, CliError> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Run `guard`. Prints the outcome as JSON on stdout.
///
/// Returns 0 when accepted, 1 when rejected, 2 on a usage or input error.
pub fn run_guard(args: &[String]) -> i32 {
    let parsed = match parse_guard_args(args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("guard: {}", e);
            eprintln!("usage: safeplate-cli guard --caller ID [--endpoint CLASS] [--allergens a,b] [--file F]");
            return EXIT_USAGE;
        }
    };
    let payload = match read_payload(parsed.file.as_ref()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("guard: {}", e);
            return EXIT_USAGE;
        }
    };

    let pipeline = Pipeline::from_env();
    let caller = CallerIdentity::new(parsed.caller).with_allergens(parsed.allergens);
    let outcome = pipeline.guard(&payload, &caller, parsed.endpoint);

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("guard: failed to render outcome: {}", e);
            return EXIT_USAGE;
        }
    }
    if outcome.is_accepted() {
        EXIT_OK
    } else {
        EXIT_REJECTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_args() {
        let parsed = parse_guard_args(&args(&[
            "--caller", "user-7", "--endpoint", "ai", "--allergens", "milk, peanuts", "--file", "r.json",
        ]))
        .unwrap();
        assert_eq!(parsed.caller, "user-7");
        assert_eq!(parsed.endpoint, EndpointClass::AiGeneration);
        assert!(parsed.allergens.contains("milk"));
        assert!(parsed.allergens.contains("peanuts"));
        assert_eq!(parsed.file, Some(PathBuf::from("r.json")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_guard_args(&args(&[])),
            Err(CliError::MissingOption("--caller"))
        ));
        assert!(matches!(
            parse_guard_args(&args(&["--caller"])),
            Err(CliError::MissingValue(_))
        ));
        assert!(matches!(
            parse_guard_args(&args(&["--caller", "u", "--endpoint", "admin"])),
            Err(CliError::UnknownEndpoint(_))
        ));
        assert!(matches!(
            parse_guard_args(&args(&["--caller", "u", "--verbose"])),
            Err(CliError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_run_guard_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "<i>Soup</i>", "ingredients": ["milk"]}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let code = run_guard(&args(&["--caller", "cli-test", "--allergens", "milk", "--file", &path]));
        assert_eq!(code, EXIT_OK);
    }

    #[test]
    fn test_run_guard_invalid_json_is_usage_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(run_guard(&args(&["--caller", "u", "--file", &path])), EXIT_USAGE);
    }
}
