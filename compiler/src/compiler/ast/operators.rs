/// Binary operations are symbolic functions with two arguments. C-Minus
/// treats assignment as an operator with a variable on the left hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Operator {
    ASSIGN,         // <lhs> =  <rhs>
    ADD,            // <lhs> +  <rhs>
    SUB,            // <lhs> -  <rhs>
    MUL,            // <lhs> *  <rhs>
    DIV,            // <lhs> /  <rhs>

    EQUAL,          // <lhs> == <rhs>
    NOT_EQUAL,      // <lhs> != <rhs>
    LESS_THAN,      // <lhs> <  <rhs>
    LESS_EQUAL,     // <lhs> <= <rhs>
    GREATER_THAN,   // <lhs> >  <rhs>
    GREATER_EQUAL,  // <lhs> >= <rhs>
}

impl Operator {
    /// Source token of the operator, used when listing the syntax tree.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::ASSIGN => "=",
            Operator::ADD => "+",
            Operator::SUB => "-",
            Operator::MUL => "*",
            Operator::DIV => "/",
            Operator::EQUAL => "==",
            Operator::NOT_EQUAL => "!=",
            Operator::LESS_THAN => "<",
            Operator::LESS_EQUAL => "<=",
            Operator::GREATER_THAN => ">",
            Operator::GREATER_EQUAL => ">=",
        }
    }
}
