use super::super::ast::symbol_table::{ScopeId, SymbolTable};

/// Tracks the current scope while re-walking a tree whose scopes were
/// created by the analysis pass. Both consumers re-enter scopes in the exact
/// order analysis created them, through two mechanisms:
///
///   + The type checking pass enters a function's scope by name at the
///     definition site and resolves nested compounds to the first child
///     scope not yet marked visited.
///   + The code generator counts compound statements and resolves each to
///     the scope carrying the matching creation order number. Function
///     scopes line up because analysis creates them at the definition site
///     and the body compound, which does not get a scope of its own, is the
///     next compound the generator encounters.
pub(crate) struct ScopeWalker {
    current: ScopeId,
    function_scope_active: bool,
    order: usize,
}

impl ScopeWalker {
    pub fn new() -> Self {
        ScopeWalker {
            current: ScopeId::global(),
            function_scope_active: false,
            order: 0,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Enter the scope created for a function definition site, found by name
    /// among the children of the current scope. The immediately following
    /// compound statement shares this scope, so a flag swallows that
    /// compound's entry.
    pub fn enter_function_scope(&mut self, table: &SymbolTable, name: &str) {
        let mut child = table.scope(self.current).first_child;
        while let Some(id) = child {
            if table.scope(id).function_name == name {
                break;
            }
            child = table.scope(id).next_sibling;
        }

        self.current = child.expect("function scope missing while replaying the scope tree");
        self.function_scope_active = true;
    }

    /// Enter the scope of the next compound statement, resolved to the first
    /// child scope not yet visited. A compound directly following a function
    /// site is the function body and stays in the function's own scope.
    pub fn enter_compound(&mut self, table: &mut SymbolTable) {
        if self.function_scope_active {
            self.function_scope_active = false;
            return;
        }

        let mut child = table.scope(self.current).first_child;
        while let Some(id) = child {
            if !table.scope(id).visited {
                break;
            }
            child = table.scope(id).next_sibling;
        }

        let id = child.expect("compound scope missing while replaying the scope tree");
        table.scope_mut(id).visited = true;
        self.current = id;
    }

    /// Enter the scope of the next compound statement by replaying creation
    /// order: each compound advances the counter by one and resolves to the
    /// scope created at that position during analysis.
    pub fn enter_compound_in_order(&mut self, table: &SymbolTable) {
        self.order += 1;
        self.current = table.find_by_order(ScopeId::global(), self.order)
            .expect("scope replay ran ahead of the scopes created during analysis");
    }

    /// Leave the current scope, returning to its parent.
    pub fn exit_scope(&mut self, table: &SymbolTable) {
        self.current = table.scope(self.current).parent.unwrap_or_else(ScopeId::global);
    }
}
