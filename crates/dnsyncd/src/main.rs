// # dnsyncd - dnsync runner
//
// This binary is a THIN integration layer:
// - Reconciliation logic lives in dnsync-core
// - Remote API access lives in dnsync-provider-nextdns
// - List download and parsing live in dnsync-source-http
//
// The runner is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Loading the source lists once
// 4. Running every profile through the SyncRunner
// 5. Mapping the outcome onto an exit code
//
// ## Configuration
//
// ### Profiles
// - `DNS`: Provider (nextdns)
// - `CLIENT_ID`: Profile ids, separated by `,` or `;`
// - `AUTH_SECRET`: One API key for all profiles, or one per profile
// - `EXTERNAL_IP`: One override IP for all profiles, or one per profile
// - `PROFILE_NAME`: Optional display names, one per profile
//
// ### Sources
// - `BLOCK`: Comma-separated block list URLs
// - `REDIRECT`: Comma-separated override list URLs
// - `FORCE_REWRITE`: `true` to replace every remote entry
//
// ### Pacing
// - `BATCH_SIZE`: Requests per rate-limit window (default 60)
// - `BATCH_COOLDOWN_SECS`: Pause between windows (default 60)
// - `MAX_IN_FLIGHT`: Concurrent request ceiling (default 100)
// - `HTTP_TIMEOUT_SECS`: Per-request timeout (default 30)
//
// ### Logging
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DNS=nextdns
// export CLIENT_ID=abc123,def456
// export AUTH_SECRET=your_api_key
// export BLOCK=https://lists.example/hosts.txt
// export REDIRECT=https://lists.example/overrides.txt
//
// dnsyncd
// ```

use anyhow::{Context, Result};
use dnsync_core::{DesiredSources, SyncConfig, SyncEvent, SyncRunner};
use dnsync_provider_nextdns::{NextDnsClientFactory, PROVIDER_NAME};
use dnsync_source_http::HttpSourceLoader;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for the different run outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsyncExitCode {
    /// Every profile was synchronized
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// A profile failed, the sources could not be loaded, or the run was
    /// interrupted
    RuntimeError = 2,
    /// The remote rejected an API key (401/403)
    CredentialsRejected = 3,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    dns: String,
    sync: SyncConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profiles = dnsync_core::config::parse_profiles(
            lookup("CLIENT_ID").as_deref(),
            lookup("AUTH_SECRET").as_deref(),
            lookup("EXTERNAL_IP").as_deref(),
            lookup("PROFILE_NAME").as_deref(),
        )?;

        let mut sync = SyncConfig::new(profiles);
        sync.block_sources = split_urls(lookup("BLOCK"));
        sync.rewrite_sources = split_urls(lookup("REDIRECT"));
        sync.force_rewrite = lookup("FORCE_REWRITE")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        sync.rate_limit.batch_size =
            parse_number(&lookup, "BATCH_SIZE", sync.rate_limit.batch_size)?;
        sync.rate_limit.cooldown_secs =
            parse_number(&lookup, "BATCH_COOLDOWN_SECS", sync.rate_limit.cooldown_secs)?;
        sync.channel.max_in_flight =
            parse_number(&lookup, "MAX_IN_FLIGHT", sync.channel.max_in_flight)?;
        sync.channel.timeout_secs =
            parse_number(&lookup, "HTTP_TIMEOUT_SECS", sync.channel.timeout_secs)?;

        Ok(Self {
            dns: lookup("DNS").unwrap_or_default().trim().to_lowercase(),
            sync,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.dns.as_str() {
            PROVIDER_NAME => {}
            "" => anyhow::bail!(
                "DNS is required. Set it via: export DNS={}",
                PROVIDER_NAME
            ),
            other => anyhow::bail!(
                "DNS '{}' is not supported. Supported providers: {}",
                other,
                PROVIDER_NAME
            ),
        }

        for url in self.sync.block_sources.iter().chain(&self.sync.rewrite_sources) {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("Source list URL must use HTTP or HTTPS scheme. Got: {}", url);
            }
        }

        self.sync.validate()?;
        parse_log_level(&self.log_level)?;

        Ok(())
    }
}

fn split_urls(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{} must be a non-negative integer. Got: {}", key, raw)),
        _ => Ok(default),
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    info!("Starting dnsyncd");
    info!(
        "Configuration loaded: {} profile(s), {} block source(s), {} rewrite source(s)",
        config.sync.profiles.len(),
        config.sync.block_sources.len(),
        config.sync.rewrite_sources.len()
    );
    if config.sync.force_rewrite {
        warn!("FORCE_REWRITE enabled: every remote entry will be replaced");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        tokio::select! {
            code = run_sync(config) => code,
            received = wait_for_shutdown() => {
                match received {
                    Ok(name) => warn!("Received {}, aborting run", name),
                    Err(e) => error!("Signal handling error: {}", e),
                }
                DnsyncExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Run one synchronization of every profile
async fn run_sync(config: Config) -> DnsyncExitCode {
    let factory = match NextDnsClientFactory::from_config(&config.sync.channel) {
        Ok(factory) => factory,
        Err(e) => {
            error!("Failed to create NextDNS client factory: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let loader = match HttpSourceLoader::with_timeout(config.sync.channel.timeout()) {
        Ok(loader) => loader,
        Err(e) => {
            error!("Failed to create source loader: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let (runner, mut events) = match SyncRunner::new(Arc::new(factory), &config.sync) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    let sources = match DesiredSources::load(&loader, &config.sync).await {
        Ok(sources) => sources,
        Err(e) => {
            error!("Failed to load source lists: {}", e);
            return DnsyncExitCode::RuntimeError;
        }
    };

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let result = runner.run(&sources).await;
    drop(runner);
    if let Err(e) = event_logger.await {
        warn!("Event logger stopped abnormally: {}", e);
    }

    match result {
        Ok(summary) if summary.is_success() => {
            info!("All {} profile(s) synchronized", summary.succeeded());
            DnsyncExitCode::Success
        }
        Ok(summary) => {
            for outcome in summary.outcomes.iter().filter(|o| !o.is_success()) {
                if let Err(reason) = &outcome.result {
                    error!("Profile {} failed: {}", outcome.display_name, reason);
                }
            }
            DnsyncExitCode::RuntimeError
        }
        Err(e) if e.is_fatal() => {
            error!("Credentials rejected, run aborted: {}", e);
            DnsyncExitCode::CredentialsRejected
        }
        Err(e) => {
            error!("Run failed: {}", e);
            DnsyncExitCode::RuntimeError
        }
    }
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::ProfileSucceeded { client_id, report } => {
            debug!("Profile {} report: {:?}", client_id, report);
        }
        other => debug!("Sync event: {:?}", other),
    }
}

/// Wait for a shutdown signal (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for a shutdown signal (SIGINT only)
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
