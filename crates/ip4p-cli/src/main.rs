//! ip4p301 - HTTPS redirector for IP4P-published endpoints.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ip4p_cli::run().await
}
