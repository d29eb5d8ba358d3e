//! Diagnostic infrastructure for error reporting
//!
//! Every error the engine produces can be turned into a [`Diagnostic`],
//! rendered with source context or serialized to JSON.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use termcolor::NoColor;

use super::error::CheckError;
use crate::parser::lexer::LexError;
use crate::parser::parser::{ParseError, ParseErrorKind};
use crate::parser::token::Span;
use crate::vm::VmError;

/// Error code for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    /// Code text, such as `E2001`
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a note diagnostic
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self.inner = self.inner.with_code(code.0);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a secondary label (related location)
    pub fn with_secondary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::secondary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Error code, if any
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Main message
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Create diagnostic from a CheckError
    ///
    /// The message is the error's own text, so a rendered diagnostic and an
    /// `@Fails` directive agree on wording.
    pub fn from_check_error(error: &CheckError, file_id: usize) -> Self {
        use CheckError::*;

        let diag = Diagnostic::error(error.to_string()).with_code(error_code(error));
        match error {
            SubtypeError { expected, span, .. } => {
                diag.with_primary_label(file_id, *span, format!("expected `{}'", expected))
            }

            ArityMismatch { span, .. } => {
                diag.with_primary_label(file_id, *span, "wrong number of arguments")
                    .with_note("trailing lambdas count as arguments")
            }

            UnknownConstructor { ty, span, .. } => {
                diag.with_primary_label(file_id, *span, format!("not a member of `{}'", ty))
            }

            UndefinedVariable { span, .. } => {
                diag.with_primary_label(file_id, *span, "not found in this scope")
            }

            MethodNotFound { method, receiver, span } => {
                diag.with_primary_label(file_id, *span, "method not found").with_help(format!(
                    "declare it with `fun .{}(self:{} ...)`",
                    method, receiver
                ))
            }

            InvalidMethodReceiver { span, .. } => {
                diag.with_primary_label(file_id, *span, "not an instance of a class")
            }

            NotCallable { span, .. } => diag.with_primary_label(file_id, *span, "cannot be called"),

            UnexpectedLambda { span, .. } => {
                diag.with_primary_label(file_id, *span, "lambda not expected here")
            }

            NotAType { span, .. } => diag.with_primary_label(file_id, *span, "not a type"),

            DuplicateSymbol { span, original, .. } => diag
                .with_primary_label(file_id, *span, "duplicate declaration")
                .with_secondary_label(file_id, *original, "first declaration here"),

            Declaration { span, .. } => diag.with_primary_label(file_id, *span, "in this class"),

            Evaluation { span, .. } => {
                diag.with_primary_label(file_id, *span, "while evaluating this type")
            }

            UnexpectedSuccess { span, .. } | WrongDiagnostic { span, .. } => {
                diag.with_primary_label(file_id, *span, "expected failure declared here")
            }
        }
    }

    /// Create diagnostic from a ParseError
    pub fn from_parse_error(error: &ParseError, file_id: usize) -> Self {
        let code = match &error.kind {
            ParseErrorKind::UnexpectedToken { .. } => "E1001",
            ParseErrorKind::UnexpectedEof { .. } => "E1002",
            ParseErrorKind::InvalidSyntax { .. } => "E1003",
            ParseErrorKind::UnknownOperator { .. } => "E1004",
            ParseErrorKind::DuplicateOperator { .. } => "E1005",
            ParseErrorKind::NonAssociative { .. } => "E1006",
            ParseErrorKind::AssociativityConflict { .. } => "E1007",
            ParseErrorKind::InvalidPrecedence { .. } => "E1008",
            ParseErrorKind::InvalidDirective { .. } => "E1009",
            ParseErrorKind::ParserLimitExceeded { .. } => "E1010",
        };
        let mut diag = Diagnostic::error(error.message.clone())
            .with_code(ErrorCode(code))
            .with_primary_label(file_id, error.span, "here");
        if let Some(suggestion) = &error.suggestion {
            diag = diag.with_help(suggestion.clone());
        }
        diag
    }

    /// Create diagnostic from a LexError
    pub fn from_lex_error(error: &LexError, file_id: usize) -> Self {
        Diagnostic::error(error.to_string())
            .with_code(ErrorCode("E1000"))
            .with_primary_label(file_id, *error.span(), "invalid token")
    }

    /// Create diagnostic from a run-time error
    pub fn from_vm_error(error: &VmError) -> Self {
        let code = match error {
            VmError::UndefinedGlobal { .. } => "E4001",
            VmError::CyclicInitialization { .. } => "E4002",
            VmError::NotCallable { .. } => "E4003",
            VmError::ArityMismatch { .. } => "E4004",
            VmError::UnexpectedValue { .. } => "E4005",
            VmError::UnresolvedMethod { .. } => "E4006",
            VmError::MissingCoreType { .. } => "E4007",
            VmError::StackOverflow { .. } => "E4008",
            VmError::IndexOutOfBounds { .. } => "E4009",
            VmError::Elim(_) => "E4010",
            VmError::Host(_) => "E4011",
            VmError::Type(_) => "E4012",
        };
        Diagnostic::error(error.to_string()).with_code(ErrorCode(code))
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Render without colors
    pub fn render_to_string(
        &self,
        files: &SimpleFiles<String, String>,
    ) -> Result<String, codespan_reporting::files::Error> {
        let mut writer = NoColor::new(Vec::new());
        let config = term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Get the underlying codespan diagnostic
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        let json_diag = JsonDiagnostic::from_diagnostic(self, files);
        serde_json::to_string_pretty(&json_diag)
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E2001")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File path
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Label message
    pub message: Option<String>,
    /// Label style (primary or secondary)
    pub style: String,
}

impl JsonDiagnostic {
    /// Convert a Diagnostic to JSON representation
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for a CheckError
pub fn error_code(error: &CheckError) -> ErrorCode {
    use CheckError::*;

    match error {
        SubtypeError { .. } => ErrorCode("E2001"),
        ArityMismatch { .. } => ErrorCode("E2002"),
        UnknownConstructor { .. } => ErrorCode("E2003"),
        UndefinedVariable { .. } => ErrorCode("E2004"),
        MethodNotFound { .. } => ErrorCode("E2005"),
        InvalidMethodReceiver { .. } => ErrorCode("E2006"),
        NotCallable { .. } => ErrorCode("E2007"),
        UnexpectedLambda { .. } => ErrorCode("E2008"),
        NotAType { .. } => ErrorCode("E2009"),
        UnexpectedSuccess { .. } => ErrorCode("E2010"),
        WrongDiagnostic { .. } => ErrorCode("E2011"),
        DuplicateSymbol { .. } => ErrorCode("E3001"),
        Declaration { .. } => ErrorCode("E3002"),
        Evaluation { .. } => ErrorCode("E4000"),
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::TypeError;

    fn subtype_error() -> CheckError {
        CheckError::SubtypeError {
            got: "Int".to_string(),
            expected: "String".to_string(),
            span: Span::new(15, 16, 1, 16),
        }
    }

    #[test]
    fn test_create_error_diagnostic() {
        let diag = Diagnostic::error("Test error message");
        assert_eq!(diag.inner.severity, Severity::Error);
        assert_eq!(diag.code(), None);
    }

    #[test]
    fn test_check_error_keeps_exact_message() {
        let diag = Diagnostic::from_check_error(&subtype_error(), 0);
        assert_eq!(diag.code(), Some(ErrorCode("E2001")));
        assert_eq!(diag.message(), "`Int' is not a subtype of `String'");
    }

    #[test]
    fn test_duplicate_symbol_has_two_labels() {
        let error = CheckError::DuplicateSymbol {
            name: "x".to_string(),
            span: Span::new(20, 21, 2, 5),
            original: Span::new(4, 5, 1, 5),
        };
        let diag = Diagnostic::from_check_error(&error, 0);
        assert_eq!(diag.inner().labels.len(), 2);
        assert_eq!(diag.inner().labels[1].style, LabelStyle::Secondary);
    }

    #[test]
    fn test_declaration_code() {
        let error = CheckError::Declaration {
            error: TypeError::EmptyTupleType,
            span: Span::default(),
        };
        assert_eq!(error_code(&error).as_str(), "E3002");
    }

    #[test]
    fn test_parse_error_carries_suggestion() {
        let error = ParseError::unknown_operator("~", Span::new(2, 3, 1, 3));
        let diag = Diagnostic::from_parse_error(&error, 0);
        assert_eq!(diag.code(), Some(ErrorCode("E1004")));
        assert!(diag.inner().notes[0].starts_with("help: declare it"));
    }

    #[test]
    fn test_render_to_string() {
        let files = create_files("test.meml", "let n: String = 1");
        let rendered = Diagnostic::from_check_error(&subtype_error(), 0)
            .render_to_string(&files)
            .unwrap();
        assert!(rendered.contains("error[E2001]"));
        assert!(rendered.contains("test.meml:1:16"));
    }

    #[test]
    fn test_json_output() {
        let files = create_files("test.meml", "let n: String = 1");
        let json = Diagnostic::from_check_error(&subtype_error(), 0)
            .to_json(&files)
            .unwrap();

        let parsed: JsonDiagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("E2001"));
        assert_eq!(parsed.severity, "error");
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].start_line, 1);
        assert_eq!(parsed.labels[0].start_column, 16);
        assert_eq!(parsed.labels[0].style, "primary");
    }
}
