//! Output formatting module

pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context from the terminal and the `NO_COLOR` convention.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let mut styles = Styles::default();
        if colors_enabled(
            Term::stdout().is_term(),
            std::env::var_os("NO_COLOR").is_some(),
        ) {
            styles.colorize();
        }

        Self { styles, quiet }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }

    /// Print a dimmed block of diagnostic text to stderr. Never suppressed.
    pub fn diagnostic(&self, title: &str, body: &str) {
        eprintln!();
        eprintln!("  {}", title.style(self.styles.bold));
        for line in body.lines() {
            eprintln!("    {}", line.style(self.styles.dim));
        }
    }
}

/// Colors only go to a terminal, and never when `NO_COLOR` is set.
fn colors_enabled(is_tty: bool, no_color_env: bool) -> bool {
    is_tty && !no_color_env
}
