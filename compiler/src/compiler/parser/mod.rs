use super::ast::AbstractSyntaxTree;
use std::error::Error;
use std::fmt;

pub mod cminus_pest_parser;

/// A source string the grammar rejects. Carries the rendered pest error,
/// which includes the offending line and column.
#[derive(Debug)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax Error: {}", self.message)
    }
}

impl Error for ParseError {}

/// Parser handles interpretation of high-level tokens into the intermediate
/// representation. Put another way the parser turns a source string into an
/// abstract syntax tree.
pub trait AstParser {
    /// Creates a default configuration of an AstParser
    fn default() -> Self;

    /// Parse a source string into an abstract syntax tree
    fn parse(&self, source: &str) -> Result<AbstractSyntaxTree, ParseError>;
}

// Concrete Definition Export
pub use self::cminus_pest_parser::PestCMinusParser;
