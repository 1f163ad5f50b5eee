//! Portfolio and scan-list symbol loading.
//!
//! Symbols live in plain text files, one per line; blank lines and `#`
//! comments are ignored and everything is uppercase-normalized. When the
//! portfolio file is absent a built-in default list is used; an absent
//! scan list just disables scanning.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

pub const PORTFOLIO_FILE: &str = "my_portfolio.txt";
pub const SCAN_LIST_FILE: &str = "scan_list.txt";

pub const DEFAULT_PORTFOLIO: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "NFLX", "JPM", "V",
];

fn read_symbol_file(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_uppercase)
        .collect())
}

/// Load the portfolio symbol list, falling back to the defaults when the
/// file is missing or unreadable.
pub fn load_portfolio(path: &Path) -> Vec<String> {
    match read_symbol_file(path) {
        Ok(symbols) if !symbols.is_empty() => {
            info!(count = symbols.len(), path = %path.display(), "loaded portfolio symbols");
            symbols
        }
        Ok(_) => {
            warn!(path = %path.display(), "portfolio file is empty, using default symbols");
            DEFAULT_PORTFOLIO.iter().map(|s| s.to_string()).collect()
        }
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to read portfolio file");
            }
            info!("using default portfolio symbols");
            DEFAULT_PORTFOLIO.iter().map(|s| s.to_string()).collect()
        }
    }
}

/// Load the scan list, excluding symbols already covered elsewhere (for
/// example the portfolio). Returns an empty list when the file is absent.
pub fn load_scan_list(path: &Path, exclude: &[String]) -> Vec<String> {
    match read_symbol_file(path) {
        Ok(symbols) => {
            let total = symbols.len();
            let filtered: Vec<String> = symbols
                .into_iter()
                .filter(|s| !exclude.contains(s))
                .collect();
            info!(
                total = total,
                excluded = total - filtered.len(),
                path = %path.display(),
                "loaded scan list"
            );
            filtered
        }
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to read scan list");
            }
            Vec::new()
        }
    }
}
