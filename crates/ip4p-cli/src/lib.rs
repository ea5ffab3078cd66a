//! # ip4p-cli
//!
//! Command-line front end for the ip4p301 redirector.
//!
//! - **serve**: run the HTTPS redirect endpoint from a config file
//! - **decode** / **encode**: convert between IP4P addresses and endpoints
//! - **route**: perform a single lookup the way the server would

pub mod cli;
pub mod logging;

pub use cli::run;
