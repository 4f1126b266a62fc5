//! Tests for sync, pending, status, purge, watch.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_sync() {
    match parse(&["fieldnet", "sync"]) {
        CliCommand::Sync => {}
        _ => panic!("expected Sync"),
    }
}

#[test]
fn cli_parse_pending() {
    match parse(&["fieldnet", "pending"]) {
        CliCommand::Pending => {}
        _ => panic!("expected Pending"),
    }
}

#[test]
fn cli_parse_status() {
    match parse(&["fieldnet", "status"]) {
        CliCommand::Status { json } => assert!(!json),
        _ => panic!("expected Status"),
    }
    match parse(&["fieldnet", "status", "--json"]) {
        CliCommand::Status { json } => assert!(json),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_purge() {
    match parse(&["fieldnet", "purge"]) {
        CliCommand::Purge { older_than_secs } => assert!(older_than_secs.is_none()),
        _ => panic!("expected Purge"),
    }
    match parse(&["fieldnet", "purge", "--older-than-secs", "3600"]) {
        CliCommand::Purge { older_than_secs } => assert_eq!(older_than_secs, Some(3600)),
        _ => panic!("expected Purge"),
    }
}

#[test]
fn cli_parse_watch() {
    match parse(&["fieldnet", "watch"]) {
        CliCommand::Watch => {}
        _ => panic!("expected Watch"),
    }
}
