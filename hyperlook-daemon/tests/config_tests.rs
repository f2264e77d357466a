//! Configuration precedence tests: defaults -> file -> env -> CLI.

use std::io::Write;

use clap::Parser;
use serial_test::serial;

use hyperlook_core::config::HyperlookConfig;
use hyperlook_daemon::cli::DaemonCli;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[tokio::test]
#[serial]
async fn cli_overrides_file_values() {
    let file = write_config(
        r#"
[search]
namespace = "from-file"
container = "peer0-org1"

[poller]
interval_secs = 30
"#,
    );
    let cli = DaemonCli::try_parse_from([
        "hyperlook-daemon",
        "--config",
        file.path().to_str().unwrap(),
        "--interval",
        "5",
    ])
    .unwrap();

    let mut config = HyperlookConfig::load(cli.config.as_ref().unwrap())
        .await
        .unwrap();
    cli.apply_overrides(&mut config).unwrap();

    assert_eq!(config.search.namespace, "from-file");
    assert_eq!(config.poller.interval_secs, 5);
    config.validate().unwrap();
}

#[tokio::test]
#[serial]
async fn cli_overrides_environment() {
    let file = write_config("");
    let original = std::env::var("HYPERLOOK_SEARCH_CONTAINER").ok();
    // SAFETY: tests in this file are serialized with #[serial].
    unsafe {
        std::env::set_var("HYPERLOOK_SEARCH_CONTAINER", "from-env");
    }

    let loaded = HyperlookConfig::load(file.path()).await;

    // SAFETY: restore environment
    unsafe {
        match original {
            Some(val) => std::env::set_var("HYPERLOOK_SEARCH_CONTAINER", val),
            None => std::env::remove_var("HYPERLOOK_SEARCH_CONTAINER"),
        }
    }

    let mut config = loaded.unwrap();
    assert_eq!(config.search.container, "from-env");

    let cli =
        DaemonCli::try_parse_from(["hyperlook-daemon", "--container", "from-cli"]).unwrap();
    cli.apply_overrides(&mut config).unwrap();
    assert_eq!(config.search.container, "from-cli");
}

#[test]
fn cli_override_can_produce_invalid_config() {
    let cli = DaemonCli::try_parse_from(["hyperlook-daemon", "--interval", "0"]).unwrap();
    let mut config = HyperlookConfig::default();

    cli.apply_overrides(&mut config).unwrap();

    assert!(config.validate().is_err());
}

#[test]
fn bad_listen_address_is_reported() {
    let cli =
        DaemonCli::try_parse_from(["hyperlook-daemon", "--listen-address", "localhost"]).unwrap();
    let mut config = HyperlookConfig::default();

    let err = cli.apply_overrides(&mut config).unwrap_err();

    assert!(err.to_string().contains("localhost"));
    assert_eq!(config.metrics.port, 8080);
}

#[test]
fn log_overrides_apply() {
    let cli = DaemonCli::try_parse_from([
        "hyperlook-daemon",
        "--log-level",
        "warn",
        "--log-format",
        "pretty",
    ])
    .unwrap();
    let mut config = HyperlookConfig::default();

    cli.apply_overrides(&mut config).unwrap();

    assert_eq!(config.general.log_level, "warn");
    assert_eq!(config.general.log_format, "pretty");
    config.validate().unwrap();
}

#[tokio::test]
#[serial]
async fn env_fixes_invalid_file_value() {
    let file = write_config("[poller]\ninterval_secs = 0\n");
    let cli = DaemonCli::try_parse_from([
        "hyperlook-daemon",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let original = std::env::var("HYPERLOOK_POLLER_INTERVAL_SECS").ok();
    // SAFETY: tests in this file are serialized with #[serial].
    unsafe {
        std::env::set_var("HYPERLOOK_POLLER_INTERVAL_SECS", "30");
    }

    let resolved = cli.resolve_config().await;

    // SAFETY: restore environment
    unsafe {
        match original {
            Some(val) => std::env::set_var("HYPERLOOK_POLLER_INTERVAL_SECS", val),
            None => std::env::remove_var("HYPERLOOK_POLLER_INTERVAL_SECS"),
        }
    }

    assert_eq!(resolved.unwrap().poller.interval_secs, 30);
}

#[tokio::test]
#[serial]
async fn cli_fixes_invalid_file_value() {
    let file = write_config("[search]\nurl = \"\"\n");
    let cli = DaemonCli::try_parse_from([
        "hyperlook-daemon",
        "--config",
        file.path().to_str().unwrap(),
        "--search-url",
        "http://127.0.0.1:3000",
    ])
    .unwrap();

    let config = cli.resolve_config().await.unwrap();

    assert_eq!(config.search.url, "http://127.0.0.1:3000");
}

#[tokio::test]
#[serial]
async fn invalid_value_left_after_all_layers_is_rejected() {
    let file = write_config("[search]\nurl = \"\"\n");
    let cli = DaemonCli::try_parse_from([
        "hyperlook-daemon",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();

    let err = cli.resolve_config().await.unwrap_err();

    assert!(format!("{err:#}").contains("search.url"));
}
