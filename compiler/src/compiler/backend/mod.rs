mod emitter;
mod tm_code_generator;

use super::semantic_analyser::AnnotatedSyntaxTree;
use tm_common::ProgramCode;

// Abstract Definitions

/// BackEndGenerator takes an annotated syntax tree and generates ProgramCode.
/// Generation is only attempted on trees that analysed cleanly; a symbol
/// missing at this point is a bug, not a user error, and may panic.
pub trait BackEndGenerator {
    /// Generate default generator configuration
    fn default() -> Self;

    /// Generate program code from an annotated syntax tree
    fn generate(self, tree: AnnotatedSyntaxTree) -> ProgramCode;
}

// Concrete Definition Export
pub use self::tm_code_generator::TmCodeGenerator;
