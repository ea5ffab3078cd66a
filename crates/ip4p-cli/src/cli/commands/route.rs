//! Route command - one lookup, printed instead of served.

use anyhow::{bail, Context, Result};
use ip4p_srv::{Config, DnsResolver, Resolve, Router, StaticResolver};

use crate::cli::args::RouteArgs;

/// Execute the route command.
pub async fn execute(args: RouteArgs) -> Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("cannot load {}", args.config.display()))?;
    let table = config.mapping_table();

    if args.addresses.is_empty() {
        let resolver = DnsResolver::new(&config.resolver)?;
        print_route(&Router::new(table, resolver), &args.identifier).await
    } else {
        // Answer every mapped domain with the given addresses.
        let resolver = config.mappings.iter().fold(StaticResolver::new(), |resolver, mapping| {
            resolver.with(mapping.domain.clone(), args.addresses.iter().cloned())
        });
        print_route(&Router::new(table, resolver), &args.identifier).await
    }
}

async fn print_route<R: Resolve>(router: &Router<R>, identifier: &str) -> Result<()> {
    match router.route(identifier).await {
        Ok(target) => {
            println!("301 {}", target.location());
            Ok(())
        }
        Err(e) => bail!("{} {e}", e.status_code()),
    }
}
