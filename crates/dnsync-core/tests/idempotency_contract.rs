//! Contract Test: Reconciliation Idempotency
//!
//! Constraints verified:
//! - A second run against unchanged sources performs no mutation
//! - Stale rewrites are replaced, untouched domains are left alone
//! - Force mode replaces every entry even when nothing changed
//!
//! If this test fails, repeated runs would churn remote state.

mod common;

use common::*;
use dnsync_core::{DesiredSources, Profile, SyncRunner};
use std::sync::Arc;

#[tokio::test]
async fn second_run_performs_no_mutations() {
    let factory = Arc::new(MockClientFactory::new());
    let loader = StaticSourceLoader::new(
        &["ads.example", "track.example"],
        &[("10.0.0.1", "nas.home"), ("10.0.0.2", "tv.home")],
    );
    let config = config_with_sources(vec![Profile::new("abc123", "key")]);
    let sources = DesiredSources::load(&loader, &config).await.unwrap();

    let (runner, _events) = SyncRunner::new(factory.clone(), &config).unwrap();

    let first = runner.run(&sources).await.unwrap();
    assert!(first.is_success());
    let remote = factory.remote("abc123");
    assert_eq!(remote.create_calls(), 4);
    assert_eq!(remote.deny_domains(), vec!["ads.example", "track.example"]);

    remote.reset_counters();
    let second = runner.run(&sources).await.unwrap();

    assert!(second.is_success());
    assert_eq!(
        remote.mutation_calls(),
        0,
        "Expected no creates or deletes on an unchanged second run"
    );
    let report = second.outcomes[0].result.as_ref().unwrap();
    assert_eq!(report.deny.unwrap().unchanged, 2);
    assert_eq!(report.rewrite.unwrap().unchanged, 2);
}

#[tokio::test]
async fn stale_rewrite_is_replaced_and_unrelated_entries_kept() {
    let factory = Arc::new(MockClientFactory::new());
    let remote = factory.remote("abc123");
    remote.seed_rewrite("a.com", "9.9.9.9");
    remote.seed_rewrite("c.com", "3.3.3.3");

    let mut config = fast_config(vec![Profile::new("abc123", "key")]);
    config.rewrite_sources = vec!["https://lists.example/override.txt".to_string()];
    let loader = StaticSourceLoader::new(&[], &[("1.1.1.1", "a.com"), ("2.2.2.2", "b.com")]);
    let sources = DesiredSources::load(&loader, &config).await.unwrap();

    let (runner, _events) = SyncRunner::new(factory.clone(), &config).unwrap();
    let summary = runner.run(&sources).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(remote.delete_calls(), 1);
    assert_eq!(remote.create_calls(), 2);

    let mut pairs = remote.rewrite_pairs();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("a.com".to_string(), "1.1.1.1".to_string()),
            ("b.com".to_string(), "2.2.2.2".to_string()),
            ("c.com".to_string(), "3.3.3.3".to_string()),
        ]
    );
}

#[tokio::test]
async fn force_mode_replaces_everything_on_every_run() {
    let factory = Arc::new(MockClientFactory::new());
    let remote = factory.remote("abc123");
    remote.seed_deny("old.example", true);
    remote.seed_deny("ads.example", true);
    remote.seed_rewrite("c.com", "3.3.3.3");

    let mut config = config_with_sources(vec![Profile::new("abc123", "key")]);
    config.force_rewrite = true;
    let loader = StaticSourceLoader::new(&["ads.example"], &[("1.1.1.1", "a.com")]);
    let sources = DesiredSources::load(&loader, &config).await.unwrap();

    let (runner, _events) = SyncRunner::new(factory.clone(), &config).unwrap();
    runner.run(&sources).await.unwrap();

    assert_eq!(remote.deny_domains(), vec!["ads.example"]);
    assert_eq!(
        remote.rewrite_pairs(),
        vec![("a.com".to_string(), "1.1.1.1".to_string())]
    );

    // Unchanged sources still cause a full replacement
    remote.reset_counters();
    runner.run(&sources).await.unwrap();
    assert_eq!(remote.delete_calls(), 2);
    assert_eq!(remote.create_calls(), 2);
}

#[tokio::test]
async fn inactive_deny_entry_is_recreated() {
    let factory = Arc::new(MockClientFactory::new());
    let remote = factory.remote("abc123");
    remote.seed_deny("ads.example", false);
    remote.seed_deny("keep.example", true);

    let mut config = fast_config(vec![Profile::new("abc123", "key")]);
    config.block_sources = vec!["https://lists.example/block.txt".to_string()];
    let loader = StaticSourceLoader::new(&["ads.example", "keep.example"], &[]);
    let sources = DesiredSources::load(&loader, &config).await.unwrap();

    let (runner, _events) = SyncRunner::new(factory.clone(), &config).unwrap();
    let summary = runner.run(&sources).await.unwrap();

    let report = summary.outcomes[0].result.as_ref().unwrap().deny.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(remote.delete_calls(), 0);
}
