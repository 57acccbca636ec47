use num_derive::FromPrimitive;
use num_derive::ToPrimitive;
use strum_macros::{Display, EnumString};
use enum_assoc::Assoc;
use std::fmt;

/// Operand layout of a TM instruction.
/// The TM machine splits its instruction set into register-only operations
/// and two flavours of register-memory operations. Register-memory operations
/// address data memory through `d(s)`, register-address operations use the
/// same written form but treat `d + reg[s]` as a plain value.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum OpClass {
    RegisterOnly,
    RegisterMemory,
    RegisterAddress,
}

/// TmOpcode is an enum of all operations of the TM machine.
/// Each enum is set to the associated opcode. The numbering follows the
/// machine's instruction encoding so opcodes can round-trip through their
/// primitive value.
#[allow(dead_code)]
#[derive(Debug,
         Eq, PartialEq,
         Copy, Clone,
         FromPrimitive, ToPrimitive,
         EnumString, Display,
         Assoc)]
#[func(pub const fn class(&self) -> OpClass)]
#[repr(u8)]
pub enum TmOpcode {
    /// Stop execution
    #[assoc(class = OpClass::RegisterOnly)]
    HALT = 0,
    /// reg[r] <- integer from stdin
    #[assoc(class = OpClass::RegisterOnly)]
    IN   = 1,
    /// reg[r] -> stdout
    #[assoc(class = OpClass::RegisterOnly)]
    OUT  = 2,
    /// reg[r] = reg[s] + reg[t]
    #[assoc(class = OpClass::RegisterOnly)]
    ADD  = 3,
    /// reg[r] = reg[s] - reg[t]
    #[assoc(class = OpClass::RegisterOnly)]
    SUB  = 4,
    /// reg[r] = reg[s] * reg[t]
    #[assoc(class = OpClass::RegisterOnly)]
    MUL  = 5,
    /// reg[r] = reg[s] / reg[t]
    #[assoc(class = OpClass::RegisterOnly)]
    DIV  = 6,

    /// reg[r] = mem[d + reg[s]]
    #[assoc(class = OpClass::RegisterMemory)]
    LD   = 7,
    /// mem[d + reg[s]] = reg[r]
    #[assoc(class = OpClass::RegisterMemory)]
    ST   = 8,

    /// reg[r] = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    LDA  = 9,
    /// reg[r] = d
    #[assoc(class = OpClass::RegisterAddress)]
    LDC  = 10,
    /// if reg[r] <  0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JLT  = 11,
    /// if reg[r] <= 0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JLE  = 12,
    /// if reg[r] >  0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JGT  = 13,
    /// if reg[r] >= 0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JGE  = 14,
    /// if reg[r] == 0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JEQ  = 15,
    /// if reg[r] != 0 then pc = d + reg[s]
    #[assoc(class = OpClass::RegisterAddress)]
    JNE  = 16,
}

/// Register file of the TM machine. The machine itself only distinguishes
/// the program counter; the remaining assignments are the calling convention
/// shared between the compiler backend and any tooling reading its output.
#[derive(Debug,
         Eq, PartialEq,
         Copy, Clone,
         FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Expression accumulator
    AC       = 0,
    /// Secondary accumulator
    AC1      = 1,
    /// Holds 1 after the program prelude has run
    CONSTANT = 2,
    /// Never written, always 0
    ZERO     = 3,
    /// Global base pointer
    GP       = 4,
    /// Memory pointer, top of the downward growing stack
    MP       = 5,
    /// Frame pointer
    FP       = 6,
    /// Program counter
    PC       = 7,
}

/// A single TM instruction in one of the machine's two written forms:
/// `OP r,s,t` for register-only operations and `OP r,d(s)` for
/// register-memory and register-address operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmInstruction {
    RegisterOnly {
        op: TmOpcode,
        r: Register,
        s: Register,
        t: Register,
    },
    RegisterMemory {
        op: TmOpcode,
        r: Register,
        d: i32,
        s: Register,
    },
}

impl TmInstruction {
    /// Builds an `OP r,s,t` instruction.
    /// Panics if the opcode does not take three registers.
    pub fn ro(op: TmOpcode, r: Register, s: Register, t: Register) -> Self {
        debug_assert!(op.class() == OpClass::RegisterOnly,
                      "opcode {} is not a register-only operation", op);
        TmInstruction::RegisterOnly { op, r, s, t }
    }

    /// Builds an `OP r,d(s)` instruction.
    /// Panics if the opcode does not take a displacement operand.
    pub fn rm(op: TmOpcode, r: Register, d: i32, s: Register) -> Self {
        debug_assert!(op.class() != OpClass::RegisterOnly,
                      "opcode {} does not take a displacement", op);
        TmInstruction::RegisterMemory { op, r, d, s }
    }

    /// Contents of an instruction slot the machine starts up with.
    /// TM zeroes instruction memory and opcode 0 is HALT, so reserved but
    /// never written slots behave as a halt.
    pub fn halt() -> Self {
        TmInstruction::RegisterOnly {
            op: TmOpcode::HALT,
            r: Register::AC,
            s: Register::AC,
            t: Register::AC,
        }
    }

    pub fn opcode(&self) -> TmOpcode {
        match self {
            TmInstruction::RegisterOnly { op, .. } => *op,
            TmInstruction::RegisterMemory { op, .. } => *op,
        }
    }
}

impl fmt::Display for TmInstruction {
    /// Writes the operand form the TM loader reads back in,
    /// e.g. `LD  5,0(0)` or `ADD  2,3,7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TmInstruction::RegisterOnly { op, r, s, t } => {
                write!(f, "{:>5}  {},{},{}", op.to_string(), *r as u8, *s as u8, *t as u8)
            }
            TmInstruction::RegisterMemory { op, r, d, s } => {
                write!(f, "{:>5}  {},{}({})", op.to_string(), *r as u8, d, *s as u8)
            }
        }
    }
}
