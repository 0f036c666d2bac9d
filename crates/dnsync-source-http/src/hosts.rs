//! Hosts-format list parsing
//!
//! ```text
//! # comment
//! 0.0.0.0 ads.example        -> block
//! ::1     tracker.example    -> block
//! ads2.example               -> block (bare domain)
//! 10.0.0.1 nas.home # NAS    -> override nas.home => 10.0.0.1
//! ```
//!
//! Unspecified and loopback addresses mark a block line; any other address
//! marks an override.

use dnsync_core::RewriteRoute;
use std::net::IpAddr;
use tracing::debug;

/// Host names found in stock hosts files that are never synced
const IGNORED_HOSTS: [&str; 4] = ["localhost", "localhost.localdomain", "broadcasthost", "local"];

/// One entry of a hosts-format list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostsEntry {
    /// Domain to block
    Block(String),
    /// Domain to resolve to a fixed address
    Override(RewriteRoute),
}

/// Parse one line
///
/// A line may carry several host names after the address; each one yields an
/// entry.
pub fn parse_line(line: &str) -> Vec<HostsEntry> {
    let line = strip_comment(line);
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return Vec::new();
    };
    let rest: Vec<&str> = tokens.collect();

    match first.parse::<IpAddr>() {
        Ok(ip) => rest
            .into_iter()
            .filter_map(normalize_domain)
            .map(|domain| {
                if is_block_address(&ip) {
                    HostsEntry::Block(domain)
                } else {
                    HostsEntry::Override(RewriteRoute::new(ip, domain))
                }
            })
            .collect(),
        Err(_) if rest.is_empty() => normalize_domain(first)
            .map(HostsEntry::Block)
            .into_iter()
            .collect(),
        Err(_) => {
            debug!("Skipping unrecognized line: {}", line);
            Vec::new()
        }
    }
}

/// Domains of every block line, in list order
pub fn parse_blocklist(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(parse_line)
        .filter_map(|entry| match entry {
            HostsEntry::Block(domain) => Some(domain),
            HostsEntry::Override(_) => None,
        })
        .collect()
}

/// Routes of every override line, in list order
pub fn parse_overrides(text: &str) -> Vec<RewriteRoute> {
    text.lines()
        .flat_map(parse_line)
        .filter_map(|entry| match entry {
            HostsEntry::Override(route) => Some(route),
            HostsEntry::Block(_) => None,
        })
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => line[..index].trim(),
        None => line.trim(),
    }
}

fn is_block_address(ip: &IpAddr) -> bool {
    ip.is_unspecified() || ip.is_loopback()
}

fn normalize_domain(token: &str) -> Option<String> {
    let domain = token.trim_end_matches('.').to_ascii_lowercase();
    let valid = !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        && !IGNORED_HOSTS.contains(&domain.as_str());

    if valid {
        Some(domain)
    } else {
        debug!("Skipping invalid host name: {}", token);
        None
    }
}
