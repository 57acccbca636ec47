use std::fmt;

use super::tree_node::{DeclarationKind, NodeKind, TreeNode};
use super::types::Type;

/// SIZE is the size of each scope's hash table.
pub const SIZE: usize = 211;

/// SHIFT is the power of two used as multiplier in the hash function.
const SHIFT: u32 = 4;

/// Scope name of the single global scope.
pub const GLOBAL_SCOPE_NAME: &str = "__GLOBAL__";

fn hash(key: &str) -> usize {
    let mut ret = 0;
    for byte in key.bytes() {
        ret = ((ret << SHIFT) + byte as usize) % SIZE;
    }
    ret
}

/// Handle of a scope within a SymbolTable. Scopes are stored in an arena so
/// the parent/child/sibling links of the scope tree never dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The root scope holding globals and function declarations.
    pub fn global() -> Self {
        ScopeId(0)
    }
}

/// Handle of a bucket within a SymbolTable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketId(usize);

/// Returned by insert when the name is already bound in the target scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate;

/// One record of a function's parameter chain, kept in declaration order.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub line: usize,
    pub param_type: Type,
}

/// The record in the bucket lists for each declared name, including the
/// declared type and the storage slot assigned during code generation.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub name: String,
    pub line: usize,
    pub is_function: bool,
    pub bucket_type: Type,
    /// Parameter chain of a function bucket, in declaration order.
    pub params: Vec<Param>,
    pub is_param: bool,
    pub is_global: bool,
    /// Storage slot index. Assigned by the code generator; the two builtin
    /// functions never receive one.
    pub location: Option<u32>,
    /// Hash chain link.
    next: Option<BucketId>,
}

/// A single lexical scope: a chained hash table of buckets plus its position
/// in the scope tree. Every scope below the global one belongs to a function
/// body and carries that function's name.
#[derive(Debug, Clone)]
pub struct Scope {
    table: [Option<BucketId>; SIZE],
    pub function_name: String,
    /// Nesting level, 0 for the global scope.
    pub depth: usize,
    pub parent: Option<ScopeId>,
    pub first_child: Option<ScopeId>,
    pub next_sibling: Option<ScopeId>,
    /// Marks scopes already re-entered while replaying the tree during the
    /// type checking pass.
    pub visited: bool,
    /// Creation sequence number; totally orders all scopes of a compilation.
    pub order: usize,
}

/// Symbol table of a whole compilation unit: the tree of scopes created by
/// semantic analysis. Lookups walk from a scope towards the global root, so
/// a name declared in a nested scope shadows outer declarations.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    buckets: Vec<Bucket>,
    next_order: usize,
}

impl SymbolTable {
    /// Create a symbol table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                table: [None; SIZE],
                function_name: String::from(GLOBAL_SCOPE_NAME),
                depth: 0,
                parent: None,
                first_child: None,
                next_sibling: None,
                visited: true,
                order: 0,
            }],
            buckets: vec![],
            next_order: 1,
        }
    }

    /// Create a scope below a parent, appending it to the end of the
    /// parent's child chain. Each new scope takes the next creation order
    /// number; code generation later replays scope entries in this order.
    pub fn add_scope(&mut self, parent: ScopeId, function_name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let depth = self.scope(parent).depth + 1;

        self.scopes.push(Scope {
            table: [None; SIZE],
            function_name: String::from(function_name),
            depth,
            parent: Some(parent),
            first_child: None,
            next_sibling: None,
            visited: false,
            order: self.next_order,
        });
        self.next_order += 1;

        match self.scope(parent).first_child {
            None => self.scope_mut(parent).first_child = Some(id),
            Some(first) => {
                let mut child = first;
                while let Some(next) = self.scope(child).next_sibling {
                    child = next;
                }
                self.scope_mut(child).next_sibling = Some(id);
            }
        }

        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn bucket(&self, id: BucketId) -> &Bucket {
        &self.buckets[id.0]
    }

    pub fn bucket_mut(&mut self, id: BucketId) -> &mut Bucket {
        &mut self.buckets[id.0]
    }

    /// Inserts a declaration into one scope. Does not search parent scopes;
    /// a name already bound in this scope is a duplicate, shadowing an outer
    /// binding is not.
    pub fn insert(&mut self, scope: ScopeId, node: &TreeNode, is_function: bool) -> Result<BucketId, Duplicate> {
        if self.lookup_local(scope, node.name()).is_some() {
            return Err(Duplicate);
        }

        let h = hash(node.name());
        let id = BucketId(self.buckets.len());
        self.buckets.push(Bucket {
            name: String::from(node.name()),
            line: node.line,
            is_function,
            bucket_type: node.node_type,
            params: vec![],
            is_param: node.kind == NodeKind::Declaration(DeclarationKind::ParamDec),
            is_global: self.scope(scope).depth == 0,
            location: None,
            next: self.scope(scope).table[h],
        });
        self.scope_mut(scope).table[h] = Some(id);

        Ok(id)
    }

    /// Searches a single scope's hash table.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<BucketId> {
        let h = hash(name);
        let mut entry = self.scope(scope).table[h];

        while let Some(id) = entry {
            if self.bucket(id).name == name {
                return Some(id);
            }
            entry = self.bucket(id).next;
        }

        None
    }

    /// Searches a scope and then its ancestors up to the global scope,
    /// returning the innermost binding of the name.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<BucketId> {
        match self.lookup_local(scope, name) {
            Some(id) => Some(id),
            None => match self.scope(scope).parent {
                Some(parent) => self.lookup(parent, name),
                None => None,
            },
        }
    }

    /// Appends a parameter record to the end of a function's parameter
    /// chain, preserving declaration order.
    pub fn append_param(&mut self, function: BucketId, param: Param) {
        self.bucket_mut(function).params.push(param);
    }

    /// Finds the scope carrying a creation order number, searching depth
    /// first: the scope itself, then its children in sibling order.
    pub fn find_by_order(&self, root: ScopeId, order: usize) -> Option<ScopeId> {
        if self.scope(root).order == order {
            return Some(root);
        }

        let mut child = self.scope(root).first_child;
        while let Some(id) = child {
            if let Some(found) = self.find_by_order(id, order) {
                return Some(found);
            }
            child = self.scope(id).next_sibling;
        }

        None
    }

    /// Buckets of one scope in hash table order.
    fn scope_buckets(&self, scope: ScopeId) -> Vec<&Bucket> {
        let mut buckets = vec![];
        for h in 0..SIZE {
            let mut entry = self.scope(scope).table[h];
            while let Some(id) = entry {
                buckets.push(self.bucket(id));
                entry = self.bucket(id).next;
            }
        }
        buckets
    }

    /// Number of scopes in the table, the global scope included.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

/// Formatted listing of the symbol table contents: function declarations
/// with their parameter chains, the global names, and then every function
/// scope in creation order with its parameters and local variables.
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<FUNCTION DECLARATIONS>")?;
        for bucket in self.scope_buckets(ScopeId::global()) {
            if !bucket.is_function {
                continue;
            }

            writeln!(f, "Function Name     Data Type")?;
            writeln!(f, "-------------   -------------")?;
            writeln!(f, "{:<16}{}", bucket.name, bucket.bucket_type)?;

            writeln!(f, "Function Parameters     Data Type")?;
            writeln!(f, "-------------------   -------------")?;
            if bucket.params.is_empty() {
                writeln!(f, "{:<22}{}", "Void", "Void")?;
            } else {
                for param in &bucket.params {
                    writeln!(f, "{:<22}{}", param.name, param.param_type)?;
                }
            }
            writeln!(f)?;
        }

        writeln!(f, "<FUNCTION AND GLOBAL VARIABLES>")?;
        writeln!(f, "   ID NAME        ID TYPE        DATA TYPE")?;
        writeln!(f, "-------------  -------------   --------------")?;
        for bucket in self.scope_buckets(ScopeId::global()) {
            let id_type = if bucket.is_function { "Function" } else { "Variable" };
            writeln!(f, "{:<15}{:<16}{}", bucket.name, id_type, bucket.bucket_type)?;
        }

        writeln!(f)?;
        writeln!(f, "<FUNCTION PARAMETERS AND LOCAL VARIABLES>")?;
        for order in 1..self.next_order {
            let id = match self.find_by_order(ScopeId::global(), order) {
                Some(id) => id,
                None => continue,
            };
            let scope = self.scope(id);

            writeln!(f, "function name : {} (nested level : {})", scope.function_name, scope.depth)?;
            writeln!(f, "   ID NAME        ID TYPE        DATA TYPE")?;
            writeln!(f, "-------------  -------------   --------------")?;
            for bucket in self.scope_buckets(id) {
                let id_type = if bucket.is_function { "Function" } else { "Variable" };
                writeln!(f, "{:<15}{:<16}{}", bucket.name, id_type, bucket.bucket_type)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Param, ScopeId, SymbolTable};
    use crate::compiler::ast::tree_node::{DeclarationKind, TreeNode};
    use crate::compiler::ast::types::Type;
    use crate::compiler::ast::Attribute;

    fn declaration(kind: DeclarationKind, name: &str, node_type: Type, line: usize) -> TreeNode {
        let mut node = TreeNode::declaration(kind, line);
        node.attr = Attribute::Name(String::from(name));
        node.node_type = node_type;
        node
    }

    fn variable(name: &str) -> TreeNode {
        declaration(DeclarationKind::IdDec, name, Type::Integer, 1)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = SymbolTable::new();
        let id = table.insert(ScopeId::global(), &variable("x"), false).unwrap();

        assert_eq!(table.lookup_local(ScopeId::global(), "x"), Some(id));
        assert_eq!(table.lookup(ScopeId::global(), "x"), Some(id));
        assert_eq!(table.lookup(ScopeId::global(), "y"), None);
        assert!(table.bucket(id).is_global);
        assert!(!table.bucket(id).is_param);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut table = SymbolTable::new();
        table.insert(ScopeId::global(), &variable("x"), false).unwrap();
        assert!(table.insert(ScopeId::global(), &variable("x"), false).is_err());
    }

    #[test]
    fn test_hash_collision_chains() {
        // "j" and "aaa" land in the same hash slot of the 211 entry table.
        let mut table = SymbolTable::new();
        let first = table.insert(ScopeId::global(), &variable("j"), false).unwrap();
        let second = table.insert(ScopeId::global(), &variable("aaa"), false).unwrap();

        assert_eq!(table.lookup_local(ScopeId::global(), "j"), Some(first));
        assert_eq!(table.lookup_local(ScopeId::global(), "aaa"), Some(second));
    }

    #[test]
    fn test_shadowing_resolves_to_innermost() {
        let mut table = SymbolTable::new();
        let outer = table.insert(ScopeId::global(), &variable("x"), false).unwrap();

        let function_scope = table.add_scope(ScopeId::global(), "main");
        let inner = table.insert(function_scope, &variable("x"), false).unwrap();

        assert_ne!(outer, inner);
        assert_eq!(table.lookup(function_scope, "x"), Some(inner));
        assert_eq!(table.lookup(ScopeId::global(), "x"), Some(outer));
        assert!(!table.bucket(inner).is_global);
    }

    #[test]
    fn test_lookup_walks_to_global() {
        let mut table = SymbolTable::new();
        let global_var = table.insert(ScopeId::global(), &variable("g"), false).unwrap();

        let function_scope = table.add_scope(ScopeId::global(), "main");
        let nested = table.add_scope(function_scope, "main");

        assert_eq!(table.lookup(nested, "g"), Some(global_var));
        assert_eq!(table.lookup_local(nested, "g"), None);
    }

    #[test]
    fn test_scope_orders_are_distinct() {
        let mut table = SymbolTable::new();
        let first = table.add_scope(ScopeId::global(), "f");
        let nested = table.add_scope(first, "f");
        let second = table.add_scope(ScopeId::global(), "g");

        let orders = vec![
            table.scope(ScopeId::global()).order,
            table.scope(first).order,
            table.scope(nested).order,
            table.scope(second).order,
        ];
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_find_by_order() {
        let mut table = SymbolTable::new();
        let first = table.add_scope(ScopeId::global(), "f");
        let nested = table.add_scope(first, "f");
        let second = table.add_scope(ScopeId::global(), "g");

        assert_eq!(table.find_by_order(ScopeId::global(), 0), Some(ScopeId::global()));
        assert_eq!(table.find_by_order(ScopeId::global(), 1), Some(first));
        assert_eq!(table.find_by_order(ScopeId::global(), 2), Some(nested));
        assert_eq!(table.find_by_order(ScopeId::global(), 3), Some(second));
        assert_eq!(table.find_by_order(ScopeId::global(), 4), None);
    }

    #[test]
    fn test_append_param_preserves_order() {
        let mut table = SymbolTable::new();
        let function = declaration(DeclarationKind::IdDec, "f", Type::Void, 1);
        let id = table.insert(ScopeId::global(), &function, true).unwrap();

        table.append_param(id, Param { name: String::from("a"), line: 1, param_type: Type::Integer });
        table.append_param(id, Param { name: String::from("v"), line: 1, param_type: Type::IntegerArray });

        let bucket = table.bucket(id);
        assert_eq!(bucket.params.len(), 2);
        assert_eq!(bucket.params[0].name, "a");
        assert_eq!(bucket.params[0].param_type, Type::Integer);
        assert_eq!(bucket.params[1].name, "v");
        assert_eq!(bucket.params[1].param_type, Type::IntegerArray);
    }

    #[test]
    fn test_param_insert_flags() {
        let mut table = SymbolTable::new();
        let scope = table.add_scope(ScopeId::global(), "f");
        let param = declaration(DeclarationKind::ParamDec, "v", Type::IntegerArray, 2);
        let id = table.insert(scope, &param, false).unwrap();

        assert!(table.bucket(id).is_param);
        assert!(!table.bucket(id).is_global);
        assert_eq!(table.bucket(id).bucket_type, Type::IntegerArray);
    }
}
