//! Logging with colored module prefixes.
//!
//! Log lines go to stderr, leaving stdout to command output (SDL, query
//! responses).
//!
//! # Example
//!
//! ```ignore
//! log!("store"; "loaded {} pages", count);
//! log!("warn"; "page type \"{}\" does not exist", name);
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{self, IsTerminal, StderrLock, Write, stderr},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the terminal width when stderr is a
/// terminal; redirected output is written in full.
pub fn log(module: &str, message: &str) {
    let mut out = log_writer();
    let is_terminal = out.is_terminal();
    if is_terminal && !message.contains('\n') {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
    }
    let width = is_terminal.then(|| get_terminal_width() as usize);
    write_line(&mut out, module, message, width).ok();
}

/// Stream all log lines are written to.
fn log_writer() -> StderrLock<'static> {
    stderr().lock()
}

/// Write one prefixed line, truncating single-line messages to `width`.
fn write_line(out: &mut impl Write, module: &str, message: &str, width: Option<usize>) -> io::Result<()> {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let message = match width {
        Some(width) if !message.contains('\n') => {
            truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
        }
        _ => message,
    };

    writeln!(out, "{prefix} {message}")?;
    out.flush()
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "mutation" => prefix.bright_green().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    // Find the last valid UTF-8 boundary within max_len
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
