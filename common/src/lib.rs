#[macro_use]
extern crate simple_error;

mod program_code;

pub use program_code::{
    ProgramCode,
    TmInstruction,
    TmOpcode,
    OpClass,
    Register
};

mod parser;

pub use parser::{
    ProgramCodeParser,
    tm_parser::TmCodeTextParser
};
