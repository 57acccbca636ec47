pub(crate) mod ast;
pub mod backend;
pub mod parser;
pub mod semantic_analyser;
pub(crate) mod diagnostics;

use std::error::Error;
use std::fmt;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

// Interface Definitions
use tm_common::ProgramCode;

// Concrete Definitions Re-Export
pub use self::ast::AbstractSyntaxTree;
pub use self::ast::symbol_table::SymbolTable;
pub use self::backend::{BackEndGenerator, TmCodeGenerator};
pub use self::diagnostics::{Diagnostic, DiagnosticKind};
pub use self::parser::{AstParser, ParseError, PestCMinusParser};
pub use self::semantic_analyser::{AnnotatedSyntaxTree, CMinusSemanticAnalyser, SemanticAnalyser};

/// Failure of a compilation run: either the source string did not parse, or
/// semantic analysis reported diagnostics and generation was not attempted.
#[derive(Debug)]
pub enum CompileError {
    Parse(ParseError),
    Semantic(Vec<Diagnostic>),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(error) => write!(f, "{}", error),
            CompileError::Semantic(diagnostics) => {
                for (index, diagnostic) in diagnostics.iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", diagnostic)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        CompileError::Parse(error)
    }
}

/// Compiler is a simple class that holds the configuration of a compilation.
/// Compiler takes three typed parameters defining:
///  the AstParser being used,
///  the SemanticAnalyser being used,
///  and the BackEndGenerator being used.
///
/// # Compilation Diagram
/// cminus_code -> AstParser -> AbstractSyntaxTree -> SemanticAnalyser -> AnnotatedSyntaxTree -> BackEndGenerator -> ProgramCode
pub struct Compiler<P: AstParser, A: SemanticAnalyser, G: BackEndGenerator> {
    parser: P,
    semantic_analyser: A,
    generator: G,
}

#[allow(dead_code)] // Many of the functions on compiler act as a library interface and are not used
impl<P: AstParser, A: SemanticAnalyser, G: BackEndGenerator> Compiler<P, A, G> {

    /// Default generates a default compiler configuration. Default configuration is determined by
    /// the default methods of the parser, analyser and generator.
    pub fn default() -> Self {
        Compiler {
            parser: P::default(),
            semantic_analyser: A::default(),
            generator: G::default(),
        }
    }

    /// Create new compiler using a preconfigured parser, analyser and generator.
    pub fn new(parser: P, semantic_analyser: A, generator: G) -> Self {
        Compiler {
            parser,
            semantic_analyser,
            generator,
        }
    }

    /// Compiles a string representing an interpretable language by the parser into program code.
    pub fn compile_str(self, source: &str) -> Result<ProgramCode, CompileError> {
        let ast = self.parser.parse(source)?;
        let annotated_ast = self.semantic_analyser.analyse(ast)
            .map_err(CompileError::Semantic)?;
        let program_code = self.generator.generate(annotated_ast);

        Ok(program_code)
    }

    /// Compiles a program file containing an interpretable language by the parser into program code.
    /// @return: ProgramCode if Ok. Otherwise the compile error or an IO error from a failed read.
    pub fn compile(self, source_filename: &Path) -> Result<ProgramCode, Box<dyn Error>> {
        let source_str = fs::read_to_string(source_filename)?;

        Ok(self.compile_str(source_str.as_str())?)
    }

    /// Compiles a program file and writes program code encoded as string into the destination file
    /// path.
    /// @return: Ok on success. Otherwise the compile error or an IO error from a failed read/write.
    pub fn compile_and_save(self, source_filename: &Path, dest_filename: &Path, decorated: bool) -> Result<(), Box<dyn Error>> {
        let mut compiled_program = self.compile(source_filename)?;
        if decorated {
            compiled_program = compiled_program.decorated();
        }

        let program_str = format!("{}", compiled_program);

        let mut file = File::create(dest_filename)?;
        file.write_all(program_str.as_bytes())?;

        Ok(())
    }
}
