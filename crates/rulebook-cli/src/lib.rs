//! Rulebook CLI
//!
//! Library half of the `rulebook-lint` binary: command definition, input
//! loading and output rendering, kept out of `main` so they can be tested.
//!
//! # Commands
//!
//! - `compile`: compile the rulebooks and print templates, patterns and the
//!   policy fingerprint
//! - `check`: run the compliance pipeline over a JSON batch of scenario
//!   records; exit code 0 when the report is clean, 1 otherwise

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod command;
pub mod load;
pub mod output;

pub use command::{build_command, execute, init_tracing};
pub use load::{load_settings, read_batch, read_rulebook, PolicyInputs};
pub use output::{compile_summary, render_compile_text};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
