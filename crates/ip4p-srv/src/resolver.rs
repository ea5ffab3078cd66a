//! Domain resolution behind a small trait seam.
//!
//! The router only needs "domain in, textual addresses out". Production uses
//! hickory; tests and offline tooling use [`StaticResolver`].

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use tracing::debug;

use crate::config::ResolverSettings;
use crate::error::ResolveError;
use crate::SrvError;

/// DNS port used for configured nameservers.
const DNS_PORT: u16 = 53;

/// Resolves a domain to its addresses in textual form.
///
/// Implementations own any timeout, retry or caching policy; the router makes
/// exactly one call per request.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// All addresses for `domain`, in the order the resolver produced them.
    async fn resolve(&self, domain: &str) -> Result<Vec<String>, ResolveError>;
}

/// Resolver backed by hickory, querying A and AAAA together.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioResolver,
}

impl DnsResolver {
    /// Create a resolver from config.
    ///
    /// With no nameservers configured the system configuration
    /// (`/etc/resolv.conf` or platform equivalent) is used.
    pub fn new(settings: &ResolverSettings) -> crate::Result<Self> {
        let mut builder = if settings.nameservers.is_empty() {
            TokioResolver::builder_tokio()
                .map_err(|e| SrvError::Resolver(format!("failed to read system config: {e}")))?
        } else {
            let group =
                NameServerConfigGroup::from_ips_clear(&settings.nameservers, DNS_PORT, true);
            TokioResolver::builder_with_config(
                ResolverConfig::from_parts(None, Vec::new(), group),
                TokioConnectionProvider::default(),
            )
        };

        apply_settings(builder.options_mut(), settings);

        Ok(Self {
            inner: builder.build(),
        })
    }
}

fn apply_settings(opts: &mut ResolverOpts, settings: &ResolverSettings) {
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    opts.timeout = settings.timeout();
    opts.attempts = settings.attempts;
    opts.cache_size = settings.cache_size.try_into().unwrap_or(0);
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        let lookup = self
            .inner
            .lookup_ip(domain)
            .await
            .map_err(|e| ResolveError::new(domain, e.to_string()))?;

        let addresses: Vec<String> = lookup.iter().map(|ip: IpAddr| ip.to_string()).collect();
        debug!(domain, count = addresses.len(), "resolved domain");

        Ok(addresses)
    }
}

/// Fixed domain -> addresses table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: HashMap<String, Vec<String>>,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the addresses returned for `domain`.
    #[must_use]
    pub fn with<I, S>(mut self, domain: impl Into<String>, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.records
            .insert(domain.into(), addresses.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        self.records
            .get(domain)
            .cloned()
            .ok_or_else(|| ResolveError::new(domain, "no records"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with("example.com", ["1.2.3.4", "2001::1bbc:10b0:201e"])
            .with("empty.example.com", Vec::<String>::new());

        assert_eq!(
            resolver.resolve("example.com").await.unwrap(),
            vec!["1.2.3.4".to_string(), "2001::1bbc:10b0:201e".to_string()]
        );
        assert!(resolver.resolve("empty.example.com").await.unwrap().is_empty());

        let err = resolver.resolve("missing.example.com").await.unwrap_err();
        assert_eq!(err.domain, "missing.example.com");
    }

    #[test]
    fn test_apply_settings() {
        let settings = ResolverSettings {
            timeout_secs: 3,
            attempts: 4,
            cache_size: 0,
            ..ResolverSettings::default()
        };
        let mut opts = ResolverOpts::default();
        apply_settings(&mut opts, &settings);

        assert_eq!(opts.ip_strategy, LookupIpStrategy::Ipv4AndIpv6);
        assert_eq!(opts.timeout, std::time::Duration::from_secs(3));
        assert_eq!(opts.attempts, 4);
        assert_eq!(opts.cache_size, 0);
    }

    #[tokio::test]
    async fn test_dns_resolver_with_nameservers_builds() {
        let settings = ResolverSettings {
            nameservers: vec!["127.0.0.1".parse().unwrap()],
            ..ResolverSettings::default()
        };
        assert!(DnsResolver::new(&settings).is_ok());
    }
}
