//! Command-line interface for levelup.

pub mod commands;
pub mod context;
pub mod id_resolver;
pub mod output;
pub mod table;
pub mod types;

pub use context::CliContext;
pub use types::{Cli, Commands};

/// Print an error and exit with a non-zero status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let payload = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
