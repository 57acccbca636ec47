use std::fmt;

/// Source-level data types of the C-Minus language. The parser stamps
/// declarations with their declared type and marks call-site identifiers
/// as Func; semantic analysis rewrites every expression slot to one of
/// Integer, Void or IntegerArray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Void,
    IntegerArray,
    VoidArray,
    Func,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "Integer"),
            Type::Void => write!(f, "Void"),
            Type::IntegerArray => write!(f, "IntegerArray"),
            Type::VoidArray => write!(f, "VoidArray"),
            Type::Func => write!(f, "Function"),
        }
    }
}
