//! Desired state model
//!
//! The desired state is loaded once per run ([`DesiredSources`]) and turned
//! into a per-profile [`DesiredSet`] keyed by domain.

use indexmap::IndexMap;
use indexmap::map::Entry;
use std::net::IpAddr;
use tracing::{info, warn};

use crate::config::{Profile, SyncConfig};
use crate::traits::SourceLoader;

/// A parsed override line: `domain` should resolve to `ip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRoute {
    /// Target address
    pub ip: IpAddr,
    /// Domain to rewrite
    pub domain: String,
}

impl RewriteRoute {
    /// Create a new route
    pub fn new(ip: IpAddr, domain: impl Into<String>) -> Self {
        Self {
            ip,
            domain: domain.into(),
        }
    }
}

/// Desired entries keyed by domain
///
/// Insertion order is preserved and the first occurrence of a domain wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSet<V> {
    entries: IndexMap<String, V>,
}

impl<V> DesiredSet<V> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert an entry unless its domain is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(&mut self, domain: impl Into<String>, value: V) -> bool {
        match self.entries.entry(domain.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Look up the desired value for a domain
    pub fn get(&self, domain: &str) -> Option<&V> {
        self.entries.get(domain)
    }

    /// Whether a domain is desired
    pub fn contains(&self, domain: &str) -> bool {
        self.entries.contains_key(domain)
    }

    /// Number of desired entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(domain, value)| (domain.as_str(), value))
    }

    /// Iterate domains in insertion order
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<V> Default for DesiredSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl DesiredSet<()> {
    /// Build a deny set from domains
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for domain in domains {
            set.insert(domain, ());
        }
        set
    }
}

impl DesiredSet<IpAddr> {
    /// Build a rewrite set from routes
    pub fn from_routes<'a, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = &'a RewriteRoute>,
    {
        let mut set = Self::new();
        for route in routes {
            set.insert(route.domain.clone(), route.ip);
        }
        set
    }
}

/// Desired lists loaded once per run and shared across profiles
///
/// `None` means no sources were configured for that category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSources {
    /// Domains to block
    pub blocklist: Option<Vec<String>>,
    /// Domains to rewrite
    pub rewrites: Option<Vec<RewriteRoute>>,
}

impl DesiredSources {
    /// Load every configured category through the given loader
    pub async fn load(loader: &dyn SourceLoader, config: &SyncConfig) -> crate::Result<Self> {
        let blocklist = if config.block_sources.is_empty() {
            warn!("No block sources provided");
            None
        } else {
            info!(
                "Obtaining block lists from {} sources",
                config.block_sources.len()
            );
            let domains = loader.load_blocklist(&config.block_sources).await?;
            info!("Loaded {} domains to block", domains.len());
            Some(domains)
        };

        let rewrites = if config.rewrite_sources.is_empty() {
            warn!("No rewrite sources provided");
            None
        } else {
            info!(
                "Obtaining rewrite lists from {} sources",
                config.rewrite_sources.len()
            );
            let routes = loader.load_rewrites(&config.rewrite_sources).await?;
            info!("Loaded {} domains to redirect", routes.len());
            Some(routes)
        };

        Ok(Self {
            blocklist,
            rewrites,
        })
    }

    /// Whether no category has any configured source
    pub fn is_empty(&self) -> bool {
        self.blocklist.is_none() && self.rewrites.is_none()
    }

    /// Desired deny set for a profile
    pub fn deny_set(&self) -> Option<DesiredSet<()>> {
        self.blocklist
            .as_ref()
            .map(|domains| DesiredSet::from_domains(domains.iter().map(String::as_str)))
    }

    /// Desired rewrite set for a profile
    ///
    /// When the profile has an external IP override, every route targets that
    /// IP instead. The shared route list is left untouched.
    pub fn rewrite_set(&self, profile: &Profile) -> Option<DesiredSet<IpAddr>> {
        let routes = self.rewrites.as_ref()?;

        match profile.external_ip {
            Some(external_ip) => {
                info!(
                    "Applying external IP {} to {} routes",
                    external_ip,
                    routes.len()
                );
                let overridden: Vec<RewriteRoute> = routes
                    .iter()
                    .map(|route| RewriteRoute::new(external_ip, route.domain.clone()))
                    .collect();
                Some(DesiredSet::from_routes(&overridden))
            }
            None => Some(DesiredSet::from_routes(routes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_occurrence_wins() {
        let routes = vec![
            RewriteRoute::new(ip("1.1.1.1"), "a.com"),
            RewriteRoute::new(ip("2.2.2.2"), "b.com"),
            RewriteRoute::new(ip("9.9.9.9"), "a.com"),
        ];

        let set = DesiredSet::from_routes(&routes);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a.com"), Some(&ip("1.1.1.1")));
        assert_eq!(set.domains().collect::<Vec<_>>(), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_deny_set_deduplicates() {
        let set = DesiredSet::from_domains(["x.com", "y.com", "x.com"]);
        assert_eq!(set.domains().collect::<Vec<_>>(), vec!["x.com", "y.com"]);
    }

    #[test]
    fn test_external_ip_override_does_not_touch_base_list() {
        let sources = DesiredSources {
            blocklist: None,
            rewrites: Some(vec![RewriteRoute::new(ip("10.0.0.1"), "a.com")]),
        };
        let profile = Profile::new("abc", "key").with_external_ip(ip("192.168.1.1"));

        let set = sources.rewrite_set(&profile).unwrap();

        assert_eq!(set.get("a.com"), Some(&ip("192.168.1.1")));
        assert_eq!(sources.rewrites.as_ref().unwrap()[0].ip, ip("10.0.0.1"));

        let plain = sources.rewrite_set(&Profile::new("def", "key")).unwrap();
        assert_eq!(plain.get("a.com"), Some(&ip("10.0.0.1")));
    }

    #[test]
    fn test_missing_category_yields_none() {
        let sources = DesiredSources::default();
        assert!(sources.is_empty());
        assert!(sources.deny_set().is_none());
        assert!(sources.rewrite_set(&Profile::new("abc", "key")).is_none());
    }
}
