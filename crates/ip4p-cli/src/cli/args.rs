//! Command-line argument definitions using clap.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ip4p_srv::config::DEFAULT_CONFIG_PATH;

/// HTTPS redirector for hosts published as IP4P AAAA records
///
/// Maps /{identifier} to a domain, resolves its AAAA record, decodes the
/// IPv4 address and port hidden in it, and answers with a 301 redirect.
#[derive(Parser, Debug)]
#[command(name = "ip4p301")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the redirect server
    Serve(ServeArgs),

    /// Decode an IP4P address into IPv4 address and port
    Decode(DecodeArgs),

    /// Encode an IPv4 address and port as an IP4P address
    Encode(EncodeArgs),

    /// Resolve one identifier the way the server would
    Route(RouteArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Config file (YAML, or TOML when the extension is .toml)
    #[arg(short, long, env = "IP4P301_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Compressed IPv6 address, e.g. 2001::1bbc:10b0:201e
    pub address: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// IPv4 address of the endpoint
    pub ipv4: Ipv4Addr,

    /// Port of the endpoint
    pub port: u16,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Identifier as it would appear in the request path
    pub identifier: String,

    /// Config file (YAML, or TOML when the extension is .toml)
    #[arg(short, long, env = "IP4P301_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Use these addresses instead of querying DNS (repeatable)
    #[arg(short, long = "address", value_name = "ADDRESS")]
    pub addresses: Vec<String>,
}
