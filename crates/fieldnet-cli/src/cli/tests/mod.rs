//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

mod rest;

#[test]
fn cli_parse_get_defaults() {
    match parse(&["fieldnet", "get", "weather/today"]) {
        CliCommand::Get {
            endpoint,
            cache_key,
            max_age_secs,
        } => {
            assert_eq!(endpoint, "weather/today");
            assert!(cache_key.is_none());
            assert!(max_age_secs.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_with_cache() {
    match parse(&[
        "fieldnet",
        "get",
        "weather/today",
        "--cache-key",
        "weather:today",
        "--max-age-secs",
        "1800",
    ]) {
        CliCommand::Get {
            cache_key,
            max_age_secs,
            ..
        } => {
            assert_eq!(cache_key.as_deref(), Some("weather:today"));
            assert_eq!(max_age_secs, Some(1800));
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_global_offline_flag() {
    let cli = Cli::try_parse_from(["fieldnet", "status", "--offline"]).unwrap();
    assert!(cli.offline);
    let cli = Cli::try_parse_from(["fieldnet", "--offline", "sync"]).unwrap();
    assert!(cli.offline);
    let cli = Cli::try_parse_from(["fieldnet", "sync"]).unwrap();
    assert!(!cli.offline);
}
