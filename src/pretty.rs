//! Pretty printing for schema diagnostics.
//!
//! This module provides colorized, grouped output with support for hints,
//! redaction of sensitive values, and truncation.
//!
//! # Example
//!
//! ```ignore
//! use map_schema::{Diagnostics, PrettyPrintOptions};
//!
//! let normalized = schema.normalize(&config, None)?;
//! normalized.diagnostics.pretty_print(&PrettyPrintOptions::default());
//! ```
//!
//! # Output Format
//!
//! ```text
//! Schema problems (2 errors, 1 warning):
//!
//!   missing:
//!     • Required field "name" is missing
//!
//!   invalidType:
//!     • expected "keywords" to be an array but got "string"
//!
//!   invalidField:
//!     • invalid property: "extra". Since `options.knownOnly` is true, ...
//!
//! Hints:
//!   • Add 'name' to your configuration
//! ```

use std::io::Write;

use stillwater::Validation;

use crate::error::{group_by_kind, Diagnostic, Diagnostics, SchemaValidation, Severity, Violations};

/// Options for pretty printing diagnostics.
#[derive(Debug, Clone)]
pub struct PrettyPrintOptions {
    /// Enable colored output (auto-detected by default).
    pub color: ColorOption,
    /// Group entries by kind.
    pub group_by_kind: bool,
    /// Show fix suggestions.
    pub show_suggestions: bool,
    /// Maximum entries to display (None for all).
    pub max_entries: Option<usize>,
    /// Redact sensitive values.
    pub redact_sensitive: bool,
    /// Include warnings, not just errors.
    pub show_warnings: bool,
}

impl Default for PrettyPrintOptions {
    fn default() -> Self {
        Self {
            color: ColorOption::Auto,
            group_by_kind: true,
            show_suggestions: true,
            max_entries: Some(20),
            redact_sensitive: true,
            show_warnings: true,
        }
    }
}

impl PrettyPrintOptions {
    /// Create options with colors disabled.
    pub fn no_color() -> Self {
        Self {
            color: ColorOption::Never,
            ..Default::default()
        }
    }

    /// Create options that show all entries (no truncation).
    pub fn show_all() -> Self {
        Self {
            max_entries: None,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: ColorOption) -> Self {
        self.color = color;
        self
    }

    pub fn with_grouping(mut self, group: bool) -> Self {
        self.group_by_kind = group;
        self
    }

    pub fn with_suggestions(mut self, show: bool) -> Self {
        self.show_suggestions = show;
        self
    }

    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_sensitive = redact;
        self
    }

    /// The verbosity gate: false prints errors only.
    pub fn with_warnings(mut self, show: bool) -> Self {
        self.show_warnings = show;
        self
    }
}

/// Color output option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOption {
    /// Auto-detect based on terminal capability.
    Auto,
    Always,
    Never,
}

/// ANSI color codes for terminal output.
struct Colors {
    error: &'static str,
    warning: &'static str,
    info: &'static str,
    hint: &'static str,
    reset: &'static str,
}

impl Colors {
    fn enabled() -> Self {
        Self {
            error: "\x1b[1;31m",   // bold red
            warning: "\x1b[1;33m", // bold yellow
            info: "\x1b[1;36m",    // bold cyan
            hint: "\x1b[32m",      // green
            reset: "\x1b[0m",
        }
    }

    fn disabled() -> Self {
        Self {
            error: "",
            warning: "",
            info: "",
            hint: "",
            reset: "",
        }
    }
}

struct DiagnosticPrinter<'a> {
    options: &'a PrettyPrintOptions,
    colors: Colors,
}

impl<'a> DiagnosticPrinter<'a> {
    fn new(options: &'a PrettyPrintOptions, use_color: bool) -> Self {
        let colors = if use_color {
            Colors::enabled()
        } else {
            Colors::disabled()
        };
        Self { options, colors }
    }

    fn print(&self, entries: &[&Diagnostic], writer: &mut dyn Write) {
        let c = &self.colors;
        let errors = entries
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count();
        let warnings = entries.len() - errors;

        let mut counts = vec![plural(errors, "error")];
        if self.options.show_warnings {
            counts.push(plural(warnings, "warning"));
        }
        writeln!(
            writer,
            "\n{}Schema problems ({}):{}\n",
            c.error,
            counts.join(", "),
            c.reset
        )
        .ok();

        if self.options.group_by_kind {
            self.print_grouped(entries, writer);
        } else {
            self.print_flat(entries, writer);
        }

        if self.options.show_suggestions {
            self.print_suggestions(entries, writer);
        }
    }

    fn print_grouped(&self, entries: &[&Diagnostic], writer: &mut dyn Write) {
        let groups = group_by_kind(entries.iter().copied());
        let c = &self.colors;
        let mut shown = 0;

        for (kind, group) in groups {
            writeln!(writer, "  {}{}:{}", c.info, kind, c.reset).ok();

            for diagnostic in group {
                if self.truncated(shown, entries.len(), writer) {
                    return;
                }
                self.print_entry(diagnostic, writer);
                shown += 1;
            }
            writeln!(writer).ok();
        }
    }

    fn print_flat(&self, entries: &[&Diagnostic], writer: &mut dyn Write) {
        for (shown, diagnostic) in entries.iter().enumerate() {
            if self.truncated(shown, entries.len(), writer) {
                return;
            }
            self.print_entry(diagnostic, writer);
        }
        writeln!(writer).ok();
    }

    fn truncated(&self, shown: usize, total: usize, writer: &mut dyn Write) -> bool {
        let c = &self.colors;
        match self.options.max_entries {
            Some(max) if shown >= max => {
                writeln!(
                    writer,
                    "\n  {}...and {} more{}\n",
                    c.warning,
                    total - shown,
                    c.reset
                )
                .ok();
                true
            }
            _ => false,
        }
    }

    fn print_entry(&self, diagnostic: &Diagnostic, writer: &mut dyn Write) {
        let c = &self.colors;
        let bullet = match diagnostic.severity() {
            Severity::Error => c.error,
            Severity::Warning => c.warning,
        };
        let mut line = format!(
            "    {}•{} {}",
            bullet,
            c.reset,
            self.maybe_redact(diagnostic)
        );
        if let Some(detail) = &diagnostic.detail {
            line.push_str(&format!(" ({})", detail));
        }
        writeln!(writer, "{}", line).ok();
    }

    fn print_suggestions(&self, entries: &[&Diagnostic], writer: &mut dyn Write) {
        let c = &self.colors;
        let suggestions: Vec<_> = entries
            .iter()
            .filter_map(|d| d.suggestion())
            .take(3)
            .collect();

        if !suggestions.is_empty() {
            writeln!(writer, "{}Hints:{}", c.hint, c.reset).ok();
            for suggestion in suggestions {
                writeln!(writer, "  • {}", suggestion).ok();
            }
            writeln!(writer).ok();
        }
    }

    fn maybe_redact(&self, diagnostic: &Diagnostic) -> String {
        match &diagnostic.value {
            Some(value) if self.options.redact_sensitive && is_sensitive_key(&diagnostic.key) => {
                diagnostic
                    .message
                    .replace(&value.to_string(), "[REDACTED]")
            }
            _ => diagnostic.message.clone(),
        }
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Check if a key appears to hold sensitive data.
fn is_sensitive_key(key: &str) -> bool {
    let sensitive_patterns = [
        "password",
        "secret",
        "key",
        "token",
        "credential",
        "api_key",
    ];
    let lower = key.to_lowercase();
    sensitive_patterns.iter().any(|p| lower.contains(p))
}

/// Detect if stderr is a TTY for color support.
fn should_use_color(color_option: ColorOption) -> bool {
    match color_option {
        ColorOption::Always => true,
        ColorOption::Never => false,
        ColorOption::Auto => {
            use std::io::IsTerminal;
            std::io::stderr().is_terminal()
        }
    }
}

fn render(entries: &[&Diagnostic], options: &PrettyPrintOptions, use_color: bool, writer: &mut dyn Write) {
    let printer = DiagnosticPrinter::new(options, use_color);
    printer.print(entries, writer);
}

fn string_color(options: &PrettyPrintOptions) -> bool {
    // No color for string formatting unless asked for
    options.color == ColorOption::Always
}

impl Diagnostics {
    fn visible(&self, options: &PrettyPrintOptions) -> Vec<&Diagnostic> {
        self.errors
            .iter()
            .chain(self.warnings.iter().filter(|_| options.show_warnings))
            .collect()
    }

    /// Pretty print to stderr. Prints nothing when there is nothing to show.
    pub fn pretty_print(&self, options: &PrettyPrintOptions) {
        let entries = self.visible(options);
        if entries.is_empty() {
            return;
        }
        render(&entries, options, should_use_color(options.color), &mut std::io::stderr());
    }

    /// Pretty print to a string.
    pub fn format(&self, options: &PrettyPrintOptions) -> String {
        let entries = self.visible(options);
        if entries.is_empty() {
            return String::new();
        }
        let mut buf = Vec::new();
        render(&entries, options, string_color(options), &mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Violations {
    /// Pretty print errors to stderr.
    pub fn pretty_print(&self, options: &PrettyPrintOptions) {
        let entries: Vec<&Diagnostic> = self.iter().collect();
        render(&entries, options, should_use_color(options.color), &mut std::io::stderr());
    }

    /// Pretty print to a string.
    pub fn format(&self, options: &PrettyPrintOptions) -> String {
        let entries: Vec<&Diagnostic> = self.iter().collect();
        let mut buf = Vec::new();
        render(&entries, options, string_color(options), &mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }

    pub fn pretty_print_default(&self) {
        self.pretty_print(&PrettyPrintOptions::default());
    }
}

/// Unwrap a `SchemaValidation`, pretty printing the errors on failure.
pub trait ValidationExt<T> {
    /// Unwrap or pretty print errors and exit with code 1.
    ///
    /// ```ignore
    /// let config = schema.normalize(&raw, None)?.into_validation().unwrap_or_exit();
    /// ```
    fn unwrap_or_exit(self) -> T;

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T;

    /// Convert to Result, pretty printing on error but not exiting.
    fn unwrap_or_print(self) -> Result<T, Violations>;
}

impl<T> ValidationExt<T> for SchemaValidation<T> {
    fn unwrap_or_exit(self) -> T {
        self.unwrap_or_exit_with(&PrettyPrintOptions::default())
    }

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T {
        match self {
            Validation::Success(value) => value,
            Validation::Failure(errors) => {
                errors.pretty_print(options);
                std::process::exit(1);
            }
        }
    }

    fn unwrap_or_print(self) -> Result<T, Violations> {
        match self {
            Validation::Success(value) => Ok(value),
            Validation::Failure(errors) => {
                errors.pretty_print_default();
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeSet, TypeTag};
    use crate::value::Value;

    fn create_test_diagnostics() -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::missing("name"));
        diags.push(Diagnostic::invalid_type(
            "keywords",
            &TypeSet::from(TypeTag::Array),
            &Value::from("foo"),
        ));
        diags.push(Diagnostic::unknown_field("extra"));
        diags
    }

    #[test]
    fn test_format_contains_header() {
        let output = create_test_diagnostics().format(&PrettyPrintOptions::no_color());
        assert!(output.contains("Schema problems (2 errors, 1 warning):"));
    }

    #[test]
    fn test_format_contains_all_entries() {
        let output = create_test_diagnostics().format(&PrettyPrintOptions::no_color());
        assert!(output.contains("Required field \"name\" is missing"));
        assert!(output.contains("expected \"keywords\" to be an array but got \"string\""));
        assert!(output.contains("invalid property: \"extra\""));
    }

    #[test]
    fn test_grouping_by_kind() {
        let output = create_test_diagnostics().format(&PrettyPrintOptions::no_color());
        assert!(output.contains("missing:"));
        assert!(output.contains("invalidType:"));
        assert!(output.contains("invalidField:"));
    }

    #[test]
    fn test_flat_output_without_grouping() {
        let options = PrettyPrintOptions::no_color().with_grouping(false);
        let output = create_test_diagnostics().format(&options);
        assert!(!output.contains("missing:"));
        assert!(output.contains("Required field \"name\" is missing"));
    }

    #[test]
    fn test_warnings_hidden_by_verbosity_gate() {
        let options = PrettyPrintOptions::no_color().with_warnings(false);
        let output = create_test_diagnostics().format(&options);
        assert!(output.contains("Schema problems (2 errors):"));
        assert!(!output.contains("extra"));
    }

    #[test]
    fn test_empty_diagnostics_format_to_nothing() {
        assert_eq!(Diagnostics::new().format(&PrettyPrintOptions::no_color()), "");

        let mut only_warnings = Diagnostics::new();
        only_warnings.push(Diagnostic::deprecated("licenses", "license"));
        let options = PrettyPrintOptions::no_color().with_warnings(false);
        assert_eq!(only_warnings.format(&options), "");
    }

    #[test]
    fn test_redaction_of_sensitive_values() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::invalid_value(
            "api_token",
            &Value::from("super_secret_123"),
            None,
        ));

        let output = diags.format(&PrettyPrintOptions::no_color());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super_secret_123"));

        let output = diags.format(&PrettyPrintOptions::no_color().with_redaction(false));
        assert!(output.contains("super_secret_123"));
    }

    #[test]
    fn test_truncation_with_max_entries() {
        let mut diags = Diagnostics::new();
        for i in 1..=5 {
            diags.push(Diagnostic::missing(&format!("field{}", i)));
        }

        let options = PrettyPrintOptions::no_color().with_max_entries(Some(3));
        let output = diags.format(&options);
        assert!(output.contains("field3"));
        assert!(!output.contains("field4"));
        assert!(output.contains("...and 2 more"));

        let output = diags.format(&PrettyPrintOptions::no_color().with_max_entries(None));
        assert!(output.contains("field5"));
        assert!(!output.contains("...and"));
    }

    #[test]
    fn test_suggestions() {
        let output = create_test_diagnostics().format(&PrettyPrintOptions::no_color());
        assert!(output.contains("Hints:"));
        assert!(output.contains("Add 'name' to your configuration"));

        let options = PrettyPrintOptions::no_color().with_suggestions(false);
        assert!(!create_test_diagnostics().format(&options).contains("Hints:"));
    }

    #[test]
    fn test_detail_is_printed() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::invalid_value(
            "main",
            &Value::from("x"),
            Some("file does not exist".to_string()),
        ));
        let output = diags.format(&PrettyPrintOptions::no_color());
        assert!(output.contains("(file does not exist)"));
    }

    #[test]
    fn test_color_options() {
        let diags = create_test_diagnostics();
        let colored = diags.format(&PrettyPrintOptions::default().with_color(ColorOption::Always));
        assert!(colored.contains("\x1b["));

        let plain = diags.format(&PrettyPrintOptions::default().with_color(ColorOption::Never));
        assert!(!plain.contains("\x1b["));
    }

    #[test]
    fn test_is_sensitive_key() {
        assert!(is_sensitive_key("password"));
        assert!(is_sensitive_key("API_KEY"));
        assert!(is_sensitive_key("secret_token"));
        assert!(!is_sensitive_key("host"));
    }

    #[test]
    fn test_violations_format() {
        let violations = Violations::single(Diagnostic::missing("host"));
        let output = violations.format(&PrettyPrintOptions::no_color());
        assert!(output.contains("Schema problems (1 error, 0 warnings):"));
        assert!(output.contains("Required field \"host\" is missing"));
    }

    #[test]
    fn test_validation_ext_unwrap_or_print() {
        let ok: SchemaValidation<i32> = Validation::Success(42);
        assert_eq!(ok.unwrap_or_print().ok(), Some(42));

        let failed: SchemaValidation<i32> =
            Validation::Failure(Violations::single(Diagnostic::missing("host")));
        assert!(failed.unwrap_or_print().is_err());
    }
}
