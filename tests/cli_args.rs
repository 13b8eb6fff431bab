//! Integration tests for CLI argument handling
//!
//! Tests flag parsing and startup validation from the command line. Only
//! invocations that exit before the server binds are run against the binary.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cityweather"))
        .args(args)
        .env_remove("ALLOWED_ORIGIN_PATTERNS")
        .env_remove("UPSTREAM_TIMEOUT_SECS")
        .output()
        .expect("Failed to execute cityweather")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cityweather"), "Help should mention cityweather");
    assert!(stdout.contains("--cache-dir"), "Help should mention --cache-dir");
    assert!(stdout.contains("--memory-cache"), "Help should mention --memory-cache");
    assert!(stdout.contains("--allowed-origin-pattern"));
}

#[test]
fn test_help_hides_api_key_value() {
    let output = Command::new(env!("CARGO_BIN_EXE_cityweather"))
        .arg("--help")
        .env("OPENWEATHER_API_KEY", "super-secret-key")
        .output()
        .expect("Failed to execute cityweather");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("super-secret-key"));
}

#[test]
fn test_invalid_origin_pattern_prints_error_and_exits() {
    let output = run_cli(&["--memory-cache", "--allowed-origin-pattern", "vercel.app"]);
    assert!(
        !output.status.success(),
        "Expected invalid origin pattern to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("vercel.app"),
        "Should print error message about the pattern: {}",
        stderr
    );
}

#[test]
fn test_zero_timeout_exits_with_error() {
    let output = run_cli(&["--memory-cache", "--upstream-timeout-secs", "0"]);
    assert!(!output.status.success());
}

#[test]
fn test_conflicting_cache_flags_exit_with_error() {
    let output = run_cli(&["--memory-cache", "--cache-dir", "/tmp/cityweather-test"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_bind_address_is_rejected() {
    let output = run_cli(&["--memory-cache", "--bind", "not-an-address"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use cityweather::cache::CacheBackend;
    use cityweather::cli::{Cli, CliError, ServerConfig};
    use std::path::PathBuf;

    #[test]
    fn test_cli_cache_dir_flag() {
        let cli = Cli::parse_from(["cityweather", "--cache-dir", "/srv/cache"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/srv/cache")));
        assert!(!cli.memory_cache);
    }

    #[test]
    fn test_cli_openweather_key_flag() {
        let cli = Cli::parse_from(["cityweather", "--openweather-api-key", "abc123"]);
        assert_eq!(cli.openweather_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_server_config_from_cli_memory() {
        let cli = Cli::parse_from(["cityweather", "--memory-cache", "--bind", "127.0.0.1:9000"]);
        let config = ServerConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache, CacheBackend::Memory);
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn test_server_config_default_policy_allows_vercel_previews() {
        let cli = Cli::parse_from(["cityweather", "--memory-cache"]);
        let config = ServerConfig::from_cli(&cli).unwrap();
        assert!(config.origins.allows("http://localhost:5173"));
        assert!(config
            .origins
            .allows("https://weather-dashboard-frontend-tau.vercel.app"));
        assert!(!config.origins.allows("https://example.com"));
    }

    #[test]
    fn test_server_config_invalid_pattern() {
        let cli = Cli::parse_from([
            "cityweather",
            "--memory-cache",
            "--allowed-origin-pattern",
            "example.com",
        ]);
        let result = ServerConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidOriginPattern(_))));
    }
}
