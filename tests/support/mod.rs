pub mod socket_guard;

use linkmeta_core::resolver::ProviderEndpoints;
use linkmeta_core::{ProxyChain, ResolverConfig};

/// Resolver config pointing every provider at `base_url`, with direct fetching.
#[allow(dead_code)]
#[must_use]
pub fn config_for_mock(base_url: &str) -> ResolverConfig {
    ResolverConfig {
        proxy_chain: ProxyChain::direct(),
        endpoints: ProviderEndpoints::all_at(base_url),
        ..ResolverConfig::default()
    }
}
