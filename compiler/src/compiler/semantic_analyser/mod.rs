pub(crate) mod scope_walker;
pub mod cminus_semantic_analyser;

use super::ast::AbstractSyntaxTree;
use super::ast::symbol_table::SymbolTable;
use super::ast::tree_node::TreeNode;
use super::diagnostics::Diagnostic;

/// Analysis output: the syntax tree with every expression type slot filled
/// in, plus the scope tree the code generator replays.
#[derive(Debug)]
pub struct AnnotatedSyntaxTree {
    root: Option<TreeNode>,
    symbol_table: SymbolTable,
}

impl AnnotatedSyntaxTree {
    pub(crate) fn new(root: Option<TreeNode>, symbol_table: SymbolTable) -> Self {
        Self { root, symbol_table }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub(crate) fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Option<TreeNode>, SymbolTable) {
        (self.root, self.symbol_table)
    }
}

/// SemanticAnalyser checks declaration validity, type consistency and call
/// conformance of an abstract syntax tree. Errors are accumulated rather
/// than fatal; an analysis with any diagnostic yields no annotated tree and
/// code generation is skipped.
pub trait SemanticAnalyser {
    /// Creates a default configuration of a SemanticAnalyser
    fn default() -> Self;

    /// Analyse an abstract syntax tree into an annotated syntax tree
    fn analyse(self, tree: AbstractSyntaxTree) -> Result<AnnotatedSyntaxTree, Vec<Diagnostic>>;
}

// Concrete Definition Export
pub use self::cminus_semantic_analyser::CMinusSemanticAnalyser;
