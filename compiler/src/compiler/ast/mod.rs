pub(crate) mod tree_node;
pub(crate) mod operators;
pub(crate) mod types;
pub(crate) mod symbol_table;

use std::fmt;

pub(crate) use self::{
    tree_node::{
        Attribute,
        DeclarationKind,
        ExpressionKind,
        NodeKind,
        StatementKind,
        TreeNode,
    },
    operators::Operator,
    types::Type,
};

/// Intermediate representation of the compiler model. The tree is a chain of
/// top level declarations linked through sibling pointers; an empty program
/// has no root node at all.
pub struct AbstractSyntaxTree {
    root: Option<TreeNode>,
}

impl AbstractSyntaxTree {
    pub(crate) fn new(root: Option<TreeNode>) -> Self {
        Self { root }
    }

    pub(crate) fn into_root(self) -> Option<TreeNode> {
        self.root
    }
}

/// Syntax tree listing, written with indentation to indicate subtrees.
impl fmt::Display for AbstractSyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "{}", root),
            None => Ok(()),
        }
    }
}
