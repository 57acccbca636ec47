// External Modules
extern crate pest;
#[macro_use]
extern crate pest_derive;

// Internal Modules
mod compiler;

pub use compiler::{
    AbstractSyntaxTree,
    AnnotatedSyntaxTree,
    AstParser,
    BackEndGenerator,
    CMinusSemanticAnalyser,
    CompileError,
    Compiler,
    Diagnostic,
    DiagnosticKind,
    ParseError,
    PestCMinusParser,
    SemanticAnalyser,
    SymbolTable,
    TmCodeGenerator,
};

#[cfg(test)]
mod test;
