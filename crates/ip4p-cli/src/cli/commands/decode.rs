//! Decode command - offline IP4P decoding.

use anyhow::Result;

use crate::cli::args::DecodeArgs;

/// Execute the decode command.
pub fn execute(args: &DecodeArgs) -> Result<()> {
    let expanded = ip4p_core::expand(&args.address)?;
    let endpoint = ip4p_core::decode(&args.address)?;

    println!("expanded: {expanded}");
    println!("ipv4:     {}", endpoint.ipv4);
    println!("port:     {}", endpoint.port);
    println!("target:   {}", endpoint.redirect_url());

    Ok(())
}
