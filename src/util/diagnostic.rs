//! Terminal rendering for build diagnostics.
//!
//! Every reported defect carries its root cause, the layers involved,
//! and a suggested fix, so an author can repair a fragment without
//! digging through the composed output.

use std::fmt;

/// Common suggestion messages for consistent wording.
pub mod suggestions {
    /// Suggestion when a manifest cannot be found or parsed.
    pub const BAD_MANIFEST: &str =
        "help: the manifest must list every target version with its ordered layers";

    /// Suggestion when a referenced layer fragment is missing.
    pub const MISSING_LAYER: &str =
        "help: every layer named in the manifest needs a `<layer>.json` fragment file";

    /// Suggestion when a version build fails validation.
    pub const INVALID_SURFACE: &str =
        "help: fix the listed conflicts in the fragments; no artifact is written for this version";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with context lines and suggested fixes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            for suggestion in &self.suggestions {
                output.push_str(&format!("{}: {}\n", help_prefix, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("`soundSequenceInterface.filename` is declared twice")
            .with_context("layer `harmony_docs` declares the method")
            .with_context("layer `harmony_post` declares the property")
            .with_suggestion("rename the property or drop the duplicate declaration");

        let output = diag.format(false);
        assert!(output.contains("error: `soundSequenceInterface.filename`"));
        assert!(output.contains("-> layer `harmony_docs`"));
        assert!(output.contains("help: rename the property"));
    }

    #[test]
    fn test_warning_severity() {
        let output = Diagnostic::warning("layer `extras` contributed no events").format(false);
        assert!(output.starts_with("warning:"));
    }
}
