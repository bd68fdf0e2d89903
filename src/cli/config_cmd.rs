//! Config CLI subcommands: show, defaults, validate.

use crate::config::{self, EffectiveConfig, EnvConfig};
use crate::telemetry;

/// Print effective config as `KEY=VALUE` lines.
pub fn run_show() {
    print_config(&config::load().effective_config());
}

/// Print the built-in defaults, ignoring the environment.
pub fn run_defaults() {
    print_config(&EnvConfig::default().effective_config());
}

/// Check the environment for misconfiguration.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = collect_warnings(&config::load().effective_config());
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        for w in &warnings {
            eprintln!("WARNING: {}", w);
        }
        1
    }
}

fn collect_warnings(cfg: &EffectiveConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = telemetry::build_filter(&cfg.log_level) {
        warnings.push(format!("SAFEPLATE_LOG_LEVEL: {}", e));
    }

    if let Ok(raw) = std::env::var("SAFEPLATE_LOG_FORMAT") {
        if telemetry::LogFormat::parse(&raw).is_none() {
            warnings.push(format!(
                "SAFEPLATE_LOG_FORMAT={:?} is not json or pretty; using {}",
                raw, cfg.log_format
            ));
        }
    }

    // Sweeping much less often than the longest window lets dead keys pile up.
    let longest_window = [
        cfg.ai_window_secs,
        cfg.write_window_secs,
        cfg.feedback_window_secs,
        cfg.default_window_secs,
    ]
    .into_iter()
    .max()
    .unwrap_or(0);
    if cfg.sweep_interval_secs > longest_window.saturating_mul(10) {
        warnings.push(format!(
            "SAFEPLATE_SWEEP_INTERVAL_SECS ({}) exceeds ten times the longest window ({})",
            cfg.sweep_interval_secs, longest_window
        ));
    }

    if cfg.ai_max_requests > cfg.default_max_requests {
        warnings.push(format!(
            "SAFEPLATE_AI_MAX_REQUESTS ({}) is above SAFEPLATE_DEFAULT_MAX_REQUESTS ({})",
            cfg.ai_max_requests, cfg.default_max_requests
        ));
    }

    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    for (key, value) in cfg.entries() {
        println!("{}={}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{clear_env_vars, ENV_LOCK};

    #[test]
    fn test_validate_passes_with_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        assert_eq!(run_validate(), 0, "default config should pass validation");
    }

    #[test]
    fn test_validate_flags_bad_log_format() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SAFEPLATE_LOG_FORMAT", "xml");
        assert_eq!(run_validate(), 1);
        clear_env_vars();
    }

    #[test]
    fn test_validate_flags_inverted_limits() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("SAFEPLATE_AI_MAX_REQUESTS", "500");
        assert_eq!(run_validate(), 1);
        clear_env_vars();
    }

    #[test]
    fn test_warnings_for_slow_sweep() {
        let mut cfg = EnvConfig::default().effective_config();
        assert!(collect_warnings(&cfg).is_empty());
        cfg.sweep_interval_secs = 10_000;
        assert_eq!(collect_warnings(&cfg).len(), 1);
    }

    #[test]
    fn test_print_defaults_smoke() {
        run_defaults();
    }
}
