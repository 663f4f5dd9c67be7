//! `check-config`: validate a config file and show what it routes to.

use std::fmt::Write as _;

use relay_core::{BackendConfig, RelayConfig};

use crate::commands::ConfigArgs;
use crate::handlers::load_routable_config;

pub fn execute(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = load_routable_config(&args.config)?;
    println!("Configuration OK: {}", args.config.display());
    println!();
    print!("{}", render_backend_table(&config));
    Ok(())
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn row(backend: &BackendConfig) -> [String; 6] {
    [
        backend.name.clone(),
        if backend.is_external() { "external" } else { "local" }.to_string(),
        backend.base_url(),
        if backend.enabled { "yes" } else { "no" }.to_string(),
        optional(backend.priority),
        optional(backend.max_memory_gb),
    ]
}

/// Fixed-width table of every backend, locals first.
pub fn render_backend_table(config: &RelayConfig) -> String {
    let header = ["NAME", "KIND", "URL", "ENABLED", "PRIORITY", "MAX_GB"].map(str::to_string);
    let rows: Vec<[String; 6]> = config.backends().iter().map(row).collect();

    let mut widths = header.clone().map(|h| h.len());
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for r in std::iter::once(&header).chain(&rows) {
        let line: Vec<String> = r
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}
