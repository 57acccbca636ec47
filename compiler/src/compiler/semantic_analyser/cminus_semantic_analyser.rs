use super::scope_walker::ScopeWalker;
use super::{AnnotatedSyntaxTree, SemanticAnalyser};
use super::super::ast::{
    AbstractSyntaxTree,
    Attribute,
    DeclarationKind,
    ExpressionKind,
    NodeKind,
    Operator,
    StatementKind,
    TreeNode,
    Type,
};
use super::super::ast::symbol_table::{Bucket, Param, ScopeId, SymbolTable};
use super::super::diagnostics::{Diagnostic, ErrorReporter};

/// CMinusSemanticAnalyser is a concrete SemanticAnalyser.
///
/// It makes two passes over the tree. The first builds the scope tree and
/// symbol tables while annotating expression types; the second replays the
/// scope entries and checks return types, assignments and call sites. Both
/// passes keep going after an error so one run reports everything.
pub struct CMinusSemanticAnalyser {
    table: SymbolTable,
    current_scope: ScopeId,
    function_scope_active: bool,
    walker: ScopeWalker,
    reporter: ErrorReporter,
}

/// Symbol table construction pass.
impl CMinusSemanticAnalyser {
    /// The two builtin functions exist in the global scope before any user
    /// declaration is processed: `int input(void)` reads an integer and
    /// `void output(int arg)` writes one.
    fn insert_builtins(&mut self) {
        let mut input = TreeNode::declaration(DeclarationKind::IdDec, 0);
        input.attr = Attribute::Name(String::from("input"));
        input.node_type = Type::Integer;
        self.table.insert(ScopeId::global(), &input, true)
            .expect("the global scope starts out empty");

        let mut output = TreeNode::declaration(DeclarationKind::IdDec, 0);
        output.attr = Attribute::Name(String::from("output"));
        output.node_type = Type::Void;
        let output = self.table.insert(ScopeId::global(), &output, true)
            .expect("the global scope starts out empty");
        self.table.append_param(output, Param {
            name: String::from("arg"),
            line: 0,
            param_type: Type::Integer,
        });
    }

    /// Pre-order traversal hook of the first pass, applied to every node
    /// before its children. Followed post-order by leaving compound scopes.
    fn build_node(&mut self, node: &mut TreeNode) {
        self.insert_node(node);

        for child in node.children.iter_mut() {
            if let Some(child) = child {
                self.build_node(child);
            }
        }

        if node.kind == NodeKind::Statement(StatementKind::Compound) {
            self.current_scope = self.table.scope(self.current_scope).parent
                .unwrap_or_else(ScopeId::global);
        }

        if let Some(sibling) = node.sibling.as_mut() {
            self.build_node(sibling);
        }
    }

    fn insert_node(&mut self, node: &mut TreeNode) {
        match node.kind {
            NodeKind::Declaration(DeclarationKind::IdDec) => {
                if node.is_function_site() {
                    self.insert_function(node);
                } else {
                    self.insert_variable(node);
                }
            }
            NodeKind::Declaration(DeclarationKind::ParamDec) => {
                self.insert_parameter(node);
            }
            NodeKind::Declaration(DeclarationKind::SizeDec) => {}
            NodeKind::Statement(StatementKind::Compound) => {
                // The compound directly under a function site is the
                // function body and shares the scope created at the site.
                if self.function_scope_active {
                    self.function_scope_active = false;
                } else {
                    let function_name = self.table.scope(self.current_scope).function_name.clone();
                    self.current_scope = self.table.add_scope(self.current_scope, &function_name);
                }
            }
            NodeKind::Statement(_) => {}
            NodeKind::Expression(ExpressionKind::Op) => {
                if node.operator() != Operator::ASSIGN {
                    node.node_type = Type::Integer;
                }
            }
            NodeKind::Expression(ExpressionKind::Const) => {
                node.node_type = Type::Integer;
            }
            NodeKind::Expression(ExpressionKind::Id) => {
                self.annotate_identifier(node);
            }
            NodeKind::Empty => {}
        }
    }

    /// A function site declares the function in the containing scope and
    /// opens a child scope named after it. The scope is opened even when the
    /// declaration is a duplicate so later scope replays stay aligned.
    fn insert_function(&mut self, node: &TreeNode) {
        if self.table.insert(self.current_scope, node, true).is_err() {
            self.reporter.duplicate_declaration(node.line, node.name());
        }

        self.current_scope = self.table.add_scope(self.current_scope, node.name());
        self.function_scope_active = true;
    }

    fn insert_variable(&mut self, node: &TreeNode) {
        if node.node_type == Type::Void || node.node_type == Type::VoidArray {
            self.reporter.void_variable(node.line);
        }

        if self.table.insert(self.current_scope, node, false).is_err() {
            self.reporter.duplicate_declaration(node.line, node.name());
        }
    }

    /// Parameters are declared in the function body scope and appended to
    /// the enclosing function's parameter chain in declaration order.
    fn insert_parameter(&mut self, node: &TreeNode) {
        if self.table.insert(self.current_scope, node, false).is_err() {
            self.reporter.duplicate_declaration(node.line, node.name());
        }

        let function_name = self.table.scope(self.current_scope).function_name.clone();
        if let Some(function) = self.table.lookup(ScopeId::global(), &function_name) {
            self.table.append_param(function, Param {
                name: String::from(node.name()),
                line: node.line,
                param_type: node.node_type,
            });
        }
    }

    /// Resolves an identifier use against the scope chain and annotates the
    /// node's type. An indexed use of an integer array has type Integer, any
    /// other use inherits the declared type.
    fn annotate_identifier(&mut self, node: &mut TreeNode) {
        match self.table.lookup(self.current_scope, node.name()) {
            Some(id) => {
                let bucket = self.table.bucket(id);
                if bucket.bucket_type == Type::IntegerArray && node.child(0).is_some() {
                    node.node_type = Type::Integer;
                } else {
                    node.node_type = bucket.bucket_type;
                }
            }
            None => {
                if node.node_type == Type::Func {
                    self.reporter.undeclared_function(node.line, node.name());
                } else {
                    self.reporter.undeclared_variable(node.line, node.name());
                }
            }
        }
    }
}

/// Type checking pass.
impl CMinusSemanticAnalyser {
    /// Second traversal over the annotated tree. Scope entries replay the
    /// creation sequence of the first pass; the checks run post-order once
    /// every child type is known.
    fn check_node(&mut self, node: &mut TreeNode) {
        if node.is_function_site() {
            self.walker.enter_function_scope(&self.table, node.name());
        } else if node.kind == NodeKind::Statement(StatementKind::Compound) {
            self.walker.enter_compound(&mut self.table);
        }

        for child in node.children.iter_mut() {
            if let Some(child) = child {
                self.check_node(child);
            }
        }

        self.check(node);

        if let Some(sibling) = node.sibling.as_mut() {
            self.check_node(sibling);
        }
    }

    fn check(&mut self, node: &mut TreeNode) {
        match node.kind {
            NodeKind::Statement(StatementKind::Return) => {
                self.check_return(node);
            }
            NodeKind::Statement(StatementKind::Compound) => {
                self.walker.exit_scope(&self.table);
            }
            NodeKind::Expression(ExpressionKind::Op) => {
                if node.operator() == Operator::ASSIGN {
                    self.check_assignment(node);
                }
            }
            NodeKind::Expression(ExpressionKind::Id) => {
                self.check_call(node);
            }
            _ => {}
        }
    }

    /// A return conforms when the type of its expression, Void if absent,
    /// equals the declared return type of the enclosing function.
    fn check_return(&mut self, node: &TreeNode) {
        let return_type = match node.child(0) {
            Some(expression) => expression.node_type,
            None => Type::Void,
        };

        let function_name = self.table.scope(self.walker.current()).function_name.clone();
        let conforms = match self.table.lookup(ScopeId::global(), &function_name) {
            Some(id) => self.table.bucket(id).bucket_type == return_type,
            None => false,
        };

        if !conforms {
            self.reporter.return_type_mismatch(node.line);
        }
    }

    /// Both sides of an assignment must agree; the operation takes the
    /// common type. Whole arrays are not assignable, only their elements,
    /// so a common array type is rejected as well.
    fn check_assignment(&mut self, node: &mut TreeNode) {
        let lhs = node.child(0).expect("assignment without a target").node_type;
        let rhs = node.child(1).expect("assignment without a value").node_type;

        if lhs != rhs || lhs == Type::IntegerArray {
            self.reporter.assignment_type_mismatch(node.line);
        } else {
            node.node_type = lhs;
        }
    }

    /// An identifier resolving to a function is checked against its
    /// parameter chain, whether or not the parser saw it as a call.
    fn check_call(&mut self, node: &TreeNode) {
        if let Some(id) = self.table.lookup(self.walker.current(), node.name()) {
            if self.table.bucket(id).is_function
                && !Self::conforming_call(self.table.bucket(id), node) {
                self.reporter.invalid_function_call(node.line);
            }
        }
    }

    /// Arity and per-parameter types of a call site must match the
    /// function's parameter chain.
    fn conforming_call(bucket: &Bucket, node: &TreeNode) -> bool {
        let mut params = bucket.params.iter();
        let mut argument = node.child(0);

        loop {
            match (params.next(), argument) {
                (None, None) => return true,
                (Some(param), Some(expression)) => {
                    if param.param_type != expression.node_type {
                        return false;
                    }
                    argument = expression.sibling.as_deref();
                }
                _ => return false,
            }
        }
    }
}

/// SemanticAnalyser Trait Concrete Implementation
impl SemanticAnalyser for CMinusSemanticAnalyser {
    fn default() -> Self {
        Self {
            table: SymbolTable::new(),
            current_scope: ScopeId::global(),
            function_scope_active: false,
            walker: ScopeWalker::new(),
            reporter: ErrorReporter::new(),
        }
    }

    fn analyse(mut self, tree: AbstractSyntaxTree) -> Result<AnnotatedSyntaxTree, Vec<Diagnostic>> {
        self.insert_builtins();

        let mut root = tree.into_root();
        if let Some(node) = root.as_mut() {
            self.build_node(node);
        }
        if let Some(node) = root.as_mut() {
            self.check_node(node);
        }

        // The generated program starts by calling main, so a program
        // without one is rejected before generation is ever attempted.
        let main_is_function = match self.table.lookup(ScopeId::global(), "main") {
            Some(id) => self.table.bucket(id).is_function,
            None => false,
        };
        if !main_is_function {
            self.reporter.undeclared_function(0, "main");
        }

        if self.reporter.has_errors() {
            Err(self.reporter.into_diagnostics())
        } else {
            Ok(AnnotatedSyntaxTree::new(root, self.table))
        }
    }
}
