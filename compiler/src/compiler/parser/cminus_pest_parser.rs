use crate::pest::Parser;
use pest::iterators::Pair;

use super::{AstParser, ParseError};
use super::super::ast::{
    AbstractSyntaxTree,
    Attribute,
    DeclarationKind,
    ExpressionKind,
    Operator,
    StatementKind,
    TreeNode,
    Type,
};

/// Pest C-Minus parser parses a string into a series of tokens.
/// These tokens are defined as a context free grammar in the
/// src/cminus.pest file.
#[derive(Parser)]
#[grammar = "cminus.pest"]
struct CMinusParser;

/// PestCMinusParser is a concrete AstParser.
/// It uses the pest library to generate a token sequence from a source
/// string that is then formalised into the syntax tree the analyser and
/// backend traverse. Call-site identifiers are stamped with the Func type
/// so undeclared uses can be told apart from undeclared variables later.
pub struct PestCMinusParser;

fn line_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

impl PestCMinusParser {
    /// Parses a type specifier token into a declared scalar type.
    fn parse_type_specifier(pair: &Pair<Rule>) -> Type {
        match pair.as_str() {
            "int" => Type::Integer,
            "void" => Type::Void,
            _ => panic!("Malformed AST! Unknown type specifier '{}'.", pair.as_str()),
        }
    }

    /// Widens a declared scalar type to its array form.
    fn array_type_of(scalar: Type) -> Type {
        match scalar {
            Type::Integer => Type::IntegerArray,
            Type::Void => Type::VoidArray,
            _ => panic!("Malformed AST! Type {:?} has no array form.", scalar),
        }
    }

    fn parse_number(pair: &Pair<Rule>) -> i32 {
        match pair.as_str().parse() {
            Ok(value) => value,
            Err(_) => panic!("Integer literal '{}' at line {} is out of range.",
                             pair.as_str(), line_of(pair)),
        }
    }

    fn parse_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::variable_declaration => self.parse_variable_declaration(inner),
            Rule::function_declaration => self.parse_function_declaration(inner),
            rule => panic!("Malformed AST! Unexpected declaration rule {:?}.", rule),
        }
    }

    fn parse_variable_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();

        let declared_type = Self::parse_type_specifier(&inner.next().unwrap());
        let identifier = inner.next().unwrap();

        let mut node = TreeNode::declaration(DeclarationKind::IdDec, line);
        node.attr = Attribute::Name(String::from(identifier.as_str()));

        match inner.next() {
            Some(size) => {
                node.node_type = Self::array_type_of(declared_type);

                let mut size_node = TreeNode::declaration(DeclarationKind::SizeDec, line);
                size_node.attr = Attribute::Value(Self::parse_number(&size));
                node.set_child(0, size_node);
            }
            None => {
                node.node_type = declared_type;
            }
        }

        node
    }

    fn parse_function_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();

        let return_type = Self::parse_type_specifier(&inner.next().unwrap());
        let identifier = inner.next().unwrap();
        let parameters = inner.next().unwrap();
        let body = inner.next().unwrap();

        let mut node = TreeNode::declaration(DeclarationKind::IdDec, line);
        node.attr = Attribute::Name(String::from(identifier.as_str()));
        node.node_type = return_type;

        node.children[0] = self.parse_parameters(parameters);
        node.set_child(1, self.parse_compound_statement(body));

        node
    }

    /// Parses a parameter list into a sibling chain of ParamDec nodes.
    /// A (void) parameter list yields no nodes at all.
    fn parse_parameters(&self, pair: Pair<Rule>) -> Option<Box<TreeNode>> {
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::void_parameters => None,
            Rule::parameter_list => {
                let parameters = inner.into_inner()
                    .map(|parameter| self.parse_parameter(parameter))
                    .collect();
                TreeNode::link_siblings(parameters)
            }
            rule => panic!("Malformed AST! Unexpected parameter rule {:?}.", rule),
        }
    }

    fn parse_parameter(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();

        let declared_type = Self::parse_type_specifier(&inner.next().unwrap());
        let identifier = inner.next().unwrap();

        let mut node = TreeNode::declaration(DeclarationKind::ParamDec, line);
        node.attr = Attribute::Name(String::from(identifier.as_str()));
        node.node_type = match inner.next() {
            Some(_brackets) => Self::array_type_of(declared_type),
            None => declared_type,
        };

        node
    }

    fn parse_compound_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut declarations = vec![];
        let mut statements = vec![];

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::variable_declaration => declarations.push(self.parse_variable_declaration(inner)),
                Rule::statement => statements.push(self.parse_statement(inner)),
                rule => panic!("Malformed AST! Unexpected compound rule {:?}.", rule),
            }
        }

        let mut node = TreeNode::statement(StatementKind::Compound, line);
        node.children[0] = TreeNode::link_siblings(declarations);
        node.children[1] = TreeNode::link_siblings(statements);
        node
    }

    fn parse_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::selection_statement => self.parse_selection_statement(inner),
            Rule::iteration_statement => self.parse_iteration_statement(inner),
            Rule::return_statement => self.parse_return_statement(inner),
            Rule::compound_statement => self.parse_compound_statement(inner),
            Rule::expression_statement => self.parse_expression_statement(inner),
            rule => panic!("Malformed AST! Unexpected statement rule {:?}.", rule),
        }
    }

    /// The keyword tokens of a statement carry no content of their own and
    /// are dropped before the children are read off.
    fn content_pairs<'a>(pair: Pair<'a, Rule>) -> impl Iterator<Item = Pair<'a, Rule>> + 'a {
        pair.into_inner().filter(|inner| !matches!(
            inner.as_rule(),
            Rule::if_keyword | Rule::else_keyword | Rule::while_keyword | Rule::return_keyword
        ))
    }

    fn parse_selection_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = Self::content_pairs(pair);

        let mut node = TreeNode::statement(StatementKind::Selection, line);
        node.set_child(0, self.parse_expression(inner.next().unwrap()));
        node.set_child(1, self.parse_statement(inner.next().unwrap()));
        if let Some(else_branch) = inner.next() {
            node.set_child(2, self.parse_statement(else_branch));
        }
        node
    }

    fn parse_iteration_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = Self::content_pairs(pair);

        let mut node = TreeNode::statement(StatementKind::Iteration, line);
        node.set_child(0, self.parse_expression(inner.next().unwrap()));
        node.set_child(1, self.parse_statement(inner.next().unwrap()));
        node
    }

    fn parse_return_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = Self::content_pairs(pair);

        let mut node = TreeNode::statement(StatementKind::Return, line);
        if let Some(expression) = inner.next() {
            node.set_child(0, self.parse_expression(expression));
        }
        node
    }

    /// An expression statement is just its expression; a bare semicolon
    /// leaves an empty node behind.
    fn parse_expression_statement(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        match pair.into_inner().next() {
            Some(expression) => self.parse_expression(expression),
            None => TreeNode::empty(line),
        }
    }

    fn parse_expression(&self, pair: Pair<Rule>) -> TreeNode {
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::assignment => self.parse_assignment(inner),
            Rule::simple_expression => self.parse_simple_expression(inner),
            rule => panic!("Malformed AST! Unexpected expression rule {:?}.", rule),
        }
    }

    fn parse_assignment(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();

        let mut node = TreeNode::expression(ExpressionKind::Op, line);
        node.attr = Attribute::Op(Operator::ASSIGN);
        node.set_child(0, self.parse_var(inner.next().unwrap()));
        node.set_child(1, self.parse_expression(inner.next().unwrap()));
        node
    }

    fn parse_simple_expression(&self, pair: Pair<Rule>) -> TreeNode {
        let mut inner = pair.into_inner();
        let lhs = self.parse_additive_expression(inner.next().unwrap());

        match inner.next() {
            Some(relop) => {
                let operator = match relop.as_str() {
                    "<=" => Operator::LESS_EQUAL,
                    ">=" => Operator::GREATER_EQUAL,
                    "==" => Operator::EQUAL,
                    "!=" => Operator::NOT_EQUAL,
                    "<" => Operator::LESS_THAN,
                    ">" => Operator::GREATER_THAN,
                    token => panic!("Malformed AST! Unknown relational operator '{}'.", token),
                };

                let mut node = TreeNode::expression(ExpressionKind::Op, line_of(&relop));
                node.attr = Attribute::Op(operator);
                node.set_child(0, lhs);
                node.set_child(1, self.parse_additive_expression(inner.next().unwrap()));
                node
            }
            None => lhs,
        }
    }

    /// Folds an operand (operator operand)* chain into left associated
    /// Op nodes.
    fn parse_operator_chain(&self, pair: Pair<Rule>) -> TreeNode {
        let mut inner = pair.into_inner();
        let mut node = self.parse_operand(inner.next().unwrap());

        while let Some(op) = inner.next() {
            let operator = match op.as_str() {
                "+" => Operator::ADD,
                "-" => Operator::SUB,
                "*" => Operator::MUL,
                "/" => Operator::DIV,
                token => panic!("Malformed AST! Unknown arithmetic operator '{}'.", token),
            };

            let mut parent = TreeNode::expression(ExpressionKind::Op, line_of(&op));
            parent.attr = Attribute::Op(operator);
            parent.set_child(0, node);
            parent.set_child(1, self.parse_operand(inner.next().unwrap()));
            node = parent;
        }

        node
    }

    fn parse_additive_expression(&self, pair: Pair<Rule>) -> TreeNode {
        self.parse_operator_chain(pair)
    }

    fn parse_operand(&self, pair: Pair<Rule>) -> TreeNode {
        match pair.as_rule() {
            Rule::term => self.parse_operator_chain(pair),
            Rule::factor => self.parse_factor(pair),
            rule => panic!("Malformed AST! Unexpected operand rule {:?}.", rule),
        }
    }

    fn parse_factor(&self, pair: Pair<Rule>) -> TreeNode {
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::expression => self.parse_expression(inner),
            Rule::call => self.parse_call(inner),
            Rule::var => self.parse_var(inner),
            Rule::number => {
                let mut node = TreeNode::expression(ExpressionKind::Const, line_of(&inner));
                node.attr = Attribute::Value(Self::parse_number(&inner));
                node
            }
            rule => panic!("Malformed AST! Unexpected factor rule {:?}.", rule),
        }
    }

    fn parse_call(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let identifier = inner.next().unwrap();
        let arguments = inner.next().unwrap();

        let mut node = TreeNode::expression(ExpressionKind::Id, line);
        node.attr = Attribute::Name(String::from(identifier.as_str()));
        node.node_type = Type::Func;

        let argument_nodes = arguments.into_inner()
            .map(|argument| self.parse_expression(argument))
            .collect();
        node.children[0] = TreeNode::link_siblings(argument_nodes);

        node
    }

    fn parse_var(&self, pair: Pair<Rule>) -> TreeNode {
        let line = line_of(&pair);
        let mut inner = pair.into_inner();
        let identifier = inner.next().unwrap();

        let mut node = TreeNode::expression(ExpressionKind::Id, line);
        node.attr = Attribute::Name(String::from(identifier.as_str()));
        if let Some(index) = inner.next() {
            node.set_child(0, self.parse_expression(index));
        }
        node
    }
}

/// AstParser Trait Concrete Implementation
impl AstParser for PestCMinusParser {
    fn default() -> Self {
        Self
    }

    /// Parse processes a source string into an abstract syntax tree
    fn parse(&self, source: &str) -> Result<AbstractSyntaxTree, ParseError> {
        let mut pairs = CMinusParser::parse(Rule::program, source)
            .map_err(|error| ParseError::new(error.to_string()))?;

        let program = pairs.next().unwrap();
        let declarations = program.into_inner()
            .filter(|pair| pair.as_rule() == Rule::declaration)
            .map(|pair| self.parse_declaration(pair))
            .collect();

        Ok(AbstractSyntaxTree::new(
            TreeNode::link_siblings(declarations).map(|root| *root)
        ))
    }
}
