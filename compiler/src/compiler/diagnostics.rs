use std::fmt;

/// The kinds of semantic error the analyser can report. Each kind maps to a
/// single human readable message keyed by source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    DuplicateDeclaration,
    VoidVariable,
    ReturnTypeMismatch,
    AssignmentTypeMismatch,
    InvalidFunctionCall,
    UndeclaredVariable,
    UndeclaredFunction,
}

/// One reported semantic error. Kinds whose message names the offending
/// identifier carry it in `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub name: Option<String>,
}

impl Diagnostic {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::DuplicateDeclaration => {
                write!(f, "error : already declared variable {} at line {}", self.name(), self.line)
            }
            DiagnosticKind::VoidVariable => {
                write!(f, "error : Variable type cannot be Void at line {}", self.line)
            }
            DiagnosticKind::ReturnTypeMismatch => {
                write!(f, "type error at line {} : return type inconsistance", self.line)
            }
            DiagnosticKind::AssignmentTypeMismatch => {
                write!(f, "error : type inconsistance at line {}", self.line)
            }
            DiagnosticKind::InvalidFunctionCall => {
                write!(f, "type error at line {} : invalid function call", self.line)
            }
            DiagnosticKind::UndeclaredVariable => {
                write!(f, "error : undeclared variable {} at line {}", self.name(), self.line)
            }
            DiagnosticKind::UndeclaredFunction => {
                write!(f, "error : undeclared function {} at line {}", self.name(), self.line)
            }
        }
    }
}

/// Accumulating sink for semantic errors. Analysis keeps traversing after a
/// report; code generation is only attempted when the sink stayed empty.
pub(crate) struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self { diagnostics: vec![] }
    }

    fn report(&mut self, kind: DiagnosticKind, line: usize, name: Option<&str>) {
        self.diagnostics.push(Diagnostic {
            kind,
            line,
            name: name.map(String::from),
        });
    }

    pub fn duplicate_declaration(&mut self, line: usize, name: &str) {
        self.report(DiagnosticKind::DuplicateDeclaration, line, Some(name));
    }

    pub fn void_variable(&mut self, line: usize) {
        self.report(DiagnosticKind::VoidVariable, line, None);
    }

    pub fn return_type_mismatch(&mut self, line: usize) {
        self.report(DiagnosticKind::ReturnTypeMismatch, line, None);
    }

    pub fn assignment_type_mismatch(&mut self, line: usize) {
        self.report(DiagnosticKind::AssignmentTypeMismatch, line, None);
    }

    pub fn invalid_function_call(&mut self, line: usize) {
        self.report(DiagnosticKind::InvalidFunctionCall, line, None);
    }

    pub fn undeclared_variable(&mut self, line: usize, name: &str) {
        self.report(DiagnosticKind::UndeclaredVariable, line, Some(name));
    }

    pub fn undeclared_function(&mut self, line: usize, name: &str) {
        self.report(DiagnosticKind::UndeclaredFunction, line, Some(name));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticKind, ErrorReporter};

    #[test]
    fn test_diagnostic_messages() {
        let duplicate = Diagnostic {
            kind: DiagnosticKind::DuplicateDeclaration,
            line: 3,
            name: Some(String::from("x")),
        };
        assert_eq!(format!("{}", duplicate), "error : already declared variable x at line 3");

        let return_mismatch = Diagnostic {
            kind: DiagnosticKind::ReturnTypeMismatch,
            line: 7,
            name: None,
        };
        assert_eq!(format!("{}", return_mismatch), "type error at line 7 : return type inconsistance");

        let undeclared = Diagnostic {
            kind: DiagnosticKind::UndeclaredFunction,
            line: 2,
            name: Some(String::from("gcd")),
        };
        assert_eq!(format!("{}", undeclared), "error : undeclared function gcd at line 2");
    }

    #[test]
    fn test_reporter_accumulates() {
        let mut reporter = ErrorReporter::new();
        assert!(!reporter.has_errors());

        reporter.void_variable(1);
        reporter.duplicate_declaration(2, "x");
        assert!(reporter.has_errors());

        let diagnostics = reporter.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::VoidVariable);
        assert_eq!(diagnostics[1].kind, DiagnosticKind::DuplicateDeclaration);
    }
}
