//! Encode command - build the AAAA record value for an endpoint.

use anyhow::Result;
use ip4p_core::DecodedEndpoint;

use crate::cli::args::EncodeArgs;

/// Execute the encode command.
pub fn execute(args: &EncodeArgs) -> Result<()> {
    let endpoint = DecodedEndpoint::new(args.ipv4, args.port);
    println!("{}", ip4p_core::encode(&endpoint));
    Ok(())
}
