//! Test doubles and common utilities for sync contract tests
//!
//! The in-memory remote behaves like a profile's denylist and rewrite
//! resources: entries get identifiers, creation appends, deletion removes by
//! id. Failures can be injected per profile.

#![allow(dead_code)]

use async_trait::async_trait;
use dnsync_core::error::{Error, Result};
use dnsync_core::traits::{
    DenylistApi, ProfileClientFactory, RemoteEntry, RewriteApi, SourceLoader,
};
use dnsync_core::{Profile, RateLimitConfig, RewriteRoute, SyncConfig};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// How an in-memory remote should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Every call answers HTTP 500
    ServerError,
    /// Every call answers HTTP 401
    Unauthorized,
    /// Every call answers HTTP 403
    Forbidden,
}

/// One profile's remote state
#[derive(Default)]
pub struct InMemoryRemote {
    denies: Mutex<Vec<RemoteEntry>>,
    rewrites: Mutex<Vec<RemoteEntry>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    mutation_times: Mutex<Vec<Instant>>,
    failure: Mutex<Option<FailureMode>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a denylist entry (id = domain)
    pub fn seed_deny(&self, domain: &str, active: bool) {
        self.denies
            .lock()
            .unwrap()
            .push(RemoteEntry::deny(domain, domain, active));
    }

    /// Seed a rewrite entry and return its id
    pub fn seed_rewrite(&self, domain: &str, target: &str) -> String {
        let id = self.allocate_id();
        self.rewrites
            .lock()
            .unwrap()
            .push(RemoteEntry::rewrite(id.clone(), domain, target));
        id
    }

    /// Make every subsequent call fail
    pub fn fail_with(&self, mode: FailureMode) {
        *self.failure.lock().unwrap() = Some(mode);
    }

    /// Current denylist domains, in remote order
    pub fn deny_domains(&self) -> Vec<String> {
        self.denies
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.domain.clone())
            .collect()
    }

    /// Current rewrites as (domain, target), in remote order
    pub fn rewrite_pairs(&self) -> Vec<(String, String)> {
        self.rewrites
            .lock()
            .unwrap()
            .iter()
            .map(|entry| {
                (
                    entry.domain.clone(),
                    entry.target.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of mutating calls (creates + deletes)
    pub fn mutation_calls(&self) -> usize {
        self.create_calls() + self.delete_calls()
    }

    /// Reset call counters, keeping the state
    pub fn reset_counters(&self) {
        self.list_calls.store(0, Ordering::SeqCst);
        self.create_calls.store(0, Ordering::SeqCst);
        self.delete_calls.store(0, Ordering::SeqCst);
    }

    /// When each create/delete reached the remote, in arrival order
    pub fn mutation_times(&self) -> Vec<Instant> {
        self.mutation_times.lock().unwrap().clone()
    }

    fn record_mutation(&self) {
        self.mutation_times.lock().unwrap().push(Instant::now());
    }

    fn allocate_id(&self) -> String {
        format!("rw-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_failure(&self) -> Result<()> {
        match *self.failure.lock().unwrap() {
            Some(FailureMode::ServerError) => Err(Error::remote_api(500, "internal error")),
            Some(FailureMode::Unauthorized) => Err(Error::Authentication {
                body: r#"{"errors":[{"code":"unauthorized"}]}"#.to_string(),
            }),
            Some(FailureMode::Forbidden) => Err(Error::Authorization {
                body: r#"{"errors":[{"code":"forbidden"}]}"#.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn delete_from(entries: &Mutex<Vec<RemoteEntry>>, id: &str) -> Result<()> {
        let mut entries = entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(Error::remote_api(404, "not found"));
        }
        Ok(())
    }
}

/// Denylist client bound to one in-memory remote
pub struct MockDenyClient {
    remote: Arc<InMemoryRemote>,
}

#[async_trait]
impl DenylistApi for MockDenyClient {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        self.remote.list_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.check_failure()?;
        Ok(self.remote.denies.lock().unwrap().clone())
    }

    async fn create(&self, domain: &str) -> Result<RemoteEntry> {
        self.remote.create_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.record_mutation();
        self.remote.check_failure()?;
        let entry = RemoteEntry::deny(domain, domain, true);
        let mut denies = self.remote.denies.lock().unwrap();
        denies.retain(|existing| existing.id != domain);
        denies.push(entry.clone());
        Ok(entry)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.remote.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.record_mutation();
        self.remote.check_failure()?;
        InMemoryRemote::delete_from(&self.remote.denies, id)
    }
}

/// Rewrite client bound to one in-memory remote
pub struct MockRewriteClient {
    remote: Arc<InMemoryRemote>,
}

#[async_trait]
impl RewriteApi for MockRewriteClient {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        self.remote.list_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.check_failure()?;
        Ok(self.remote.rewrites.lock().unwrap().clone())
    }

    async fn create(&self, domain: &str, target: IpAddr) -> Result<RemoteEntry> {
        self.remote.create_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.record_mutation();
        self.remote.check_failure()?;
        let entry = RemoteEntry::rewrite(self.remote.allocate_id(), domain, target.to_string());
        self.remote.rewrites.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.remote.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.remote.record_mutation();
        self.remote.check_failure()?;
        InMemoryRemote::delete_from(&self.remote.rewrites, id)
    }
}

/// Factory handing out clients bound to per-profile in-memory remotes
#[derive(Default)]
pub struct MockClientFactory {
    remotes: Mutex<HashMap<String, Arc<InMemoryRemote>>>,
    clients_built: AtomicUsize,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The remote of a profile (created on first access)
    pub fn remote(&self, client_id: &str) -> Arc<InMemoryRemote> {
        Arc::clone(
            self.remotes
                .lock()
                .unwrap()
                .entry(client_id.to_string())
                .or_default(),
        )
    }

    /// Number of clients built so far
    pub fn clients_built(&self) -> usize {
        self.clients_built.load(Ordering::SeqCst)
    }
}

impl ProfileClientFactory for MockClientFactory {
    fn deny_client(&self, profile: &Profile) -> Result<Box<dyn DenylistApi>> {
        self.clients_built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDenyClient {
            remote: self.remote(&profile.client_id),
        }))
    }

    fn rewrite_client(&self, profile: &Profile) -> Result<Box<dyn RewriteApi>> {
        self.clients_built.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRewriteClient {
            remote: self.remote(&profile.client_id),
        }))
    }
}

/// A source loader returning fixed lists
pub struct StaticSourceLoader {
    pub blocklist: Vec<String>,
    pub rewrites: Vec<RewriteRoute>,
    load_calls: AtomicUsize,
}

impl StaticSourceLoader {
    pub fn new(blocklist: &[&str], rewrites: &[(&str, &str)]) -> Self {
        Self {
            blocklist: blocklist.iter().map(|d| d.to_string()).collect(),
            rewrites: rewrites
                .iter()
                .map(|(ip, domain)| RewriteRoute::new(ip.parse().unwrap(), *domain))
                .collect(),
            load_calls: AtomicUsize::new(0),
        }
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceLoader for StaticSourceLoader {
    async fn load_blocklist(&self, _sources: &[String]) -> Result<Vec<String>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blocklist.clone())
    }

    async fn load_rewrites(&self, _sources: &[String]) -> Result<Vec<RewriteRoute>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rewrites.clone())
    }
}

/// Configuration without pacing delays
pub fn fast_config(profiles: Vec<Profile>) -> SyncConfig {
    let mut config = SyncConfig::new(profiles);
    config.rate_limit = RateLimitConfig {
        batch_size: 60,
        cooldown_secs: 0,
    };
    config
}

/// Configuration with one block source and one rewrite source
pub fn config_with_sources(profiles: Vec<Profile>) -> SyncConfig {
    let mut config = fast_config(profiles);
    config.block_sources = vec!["https://lists.example/block.txt".to_string()];
    config.rewrite_sources = vec!["https://lists.example/override.txt".to_string()];
    config
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Configuration with one block source and the given pacing
pub fn paced_config(profiles: Vec<Profile>, batch_size: usize, cooldown_secs: u64) -> SyncConfig {
    let mut config = SyncConfig::new(profiles);
    config.block_sources = vec!["https://lists.example/block.txt".to_string()];
    config.rate_limit = RateLimitConfig {
        batch_size,
        cooldown_secs,
    };
    config
}
