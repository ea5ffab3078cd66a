//! Serve command - run the redirect endpoint.

use anyhow::{Context, Result};
use ip4p_srv::{server, Config, DnsResolver};
use tracing::info;

use crate::cli::args::ServeArgs;

/// Execute the serve command.
///
/// Any failure before the listener is up (config, resolver, TLS, bind) is
/// returned and ends the process.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("cannot start with {}", args.config.display()))?;
    info!(config = %args.config.display(), mappings = config.mappings.len(), "config loaded");

    let resolver = DnsResolver::new(&config.resolver)?;
    let server = server::bind_from_config(&config, resolver).await?;
    server.serve().await?;

    info!("server stopped");
    Ok(())
}
