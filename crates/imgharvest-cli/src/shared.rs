use std::io::{self, IsTerminal, Write};
use std::path::Path;

use imgharvest::{Document, HarvestConfig, SiteLayout};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set and `-v` is not given; otherwise the level is
/// `warn`, `debug` (`-v`) or `trace` (`-vv`).
pub fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load the configuration, falling back to defaults when the file is absent.
///
/// Returns `Err(1)` with a message printed to stderr if the file exists but
/// cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<HarvestConfig, i32> {
    HarvestConfig::load_or_default(path).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })
}

/// Open the configured document with user-friendly error messages.
pub fn open_document(layout: &SiteLayout) -> Result<Document, i32> {
    let path = layout.document();
    Document::open_file(path).map_err(|e| {
        eprintln!("[ERROR] {e}");
        1
    })
}

/// Format an integer with `,` thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn rule_line() -> String {
    "=".repeat(60)
}

/// A progress reporter that prints "Processing page N/M..." to stderr,
/// but only when stderr is connected to a TTY (terminal).
pub struct ProgressReporter {
    total: usize,
    is_tty: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter for `total` pages.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Report progress for page `current` (1-indexed).
    pub fn report(&self, current: usize) {
        if self.is_tty {
            eprint!("\rProcessing page {}/{}...", current, self.total);
            let _ = io::stderr().flush();
        }
    }

    /// Clear the progress line (if TTY).
    pub fn finish(&self) {
        if self.is_tty {
            eprint!("\r{}\r", " ".repeat(40));
            let _ = io::stderr().flush();
        }
    }
}
