//! CLI domain: parse and route only.
//! No hashing or codec logic here; the route table dispatches to the
//! manifest facade.

mod parse;
mod route;

pub use parse::{Cli, Commands};
pub use route::{CommandOutcome, RunContext};
