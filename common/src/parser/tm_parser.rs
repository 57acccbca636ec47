use super::ProgramCodeParser;
use crate::{
    OpClass,
    ProgramCode,
    Register,
    TmInstruction,
    TmOpcode
};

use num_traits::FromPrimitive;
use regex::Regex;
use simple_error::SimpleError;
use std::str::FromStr;

/// TextParser for TM program listings identified by the extension .tm.
/// Each line carries one instruction prefixed with its location, either
/// `loc:  OP  r,s,t` or `loc:  OP  r,d(s)`. The TM loader places every
/// instruction at its written location, so lines may appear out of order;
/// backpatched listings rely on this. Empty lines and comments starting
/// with * are ignored, as is any trailing comment after the operands.
pub struct TmCodeTextParser {
    line_pattern: Regex,
    register_only_operands: Regex,
    register_memory_operands: Regex,
}

impl TmCodeTextParser {
    const COMMENT_TOKEN: &'static str = "*";

    pub fn new() -> Self {
        Self {
            line_pattern: Regex::new(r"^(\d+)\s*:\s*([A-Z]+)\s+(.*)$").unwrap(),
            register_only_operands: Regex::new(r"^(\d+)\s*,\s*(\d+)\s*,\s*(\d+)").unwrap(),
            register_memory_operands: Regex::new(r"^(\d+)\s*,\s*(-?\d+)\s*\(\s*(\d+)\s*\)").unwrap(),
        }
    }

    /// Tries to parse a register operand from its numeric text.
    /// @return: Register if the number names one of the eight registers.
    fn parse_register(token: &str) -> Result<Register, SimpleError> {
        let number: u8 = match token.parse() {
            Ok(number) => number,
            Err(_) => bail!("Register operand '{}' is not a number.", token),
        };

        match Register::from_u8(number) {
            Some(register) => Ok(register),
            None => bail!("Register operand '{}' is out of range.", token),
        }
    }

    /// Parses the operand text following a mnemonic, selecting the operand
    /// form from the opcode's class.
    fn parse_operands(&self, op: TmOpcode, operands: &str) -> Result<TmInstruction, SimpleError> {
        match op.class() {
            OpClass::RegisterOnly => {
                let captures = match self.register_only_operands.captures(operands) {
                    Some(captures) => captures,
                    None => bail!("Malformed operands '{}' for {}.", operands, op),
                };

                let r = Self::parse_register(&captures[1])?;
                let s = Self::parse_register(&captures[2])?;
                let t = Self::parse_register(&captures[3])?;
                Ok(TmInstruction::ro(op, r, s, t))
            }
            OpClass::RegisterMemory | OpClass::RegisterAddress => {
                let captures = match self.register_memory_operands.captures(operands) {
                    Some(captures) => captures,
                    None => bail!("Malformed operands '{}' for {}.", operands, op),
                };

                let r = Self::parse_register(&captures[1])?;
                let d: i32 = match captures[2].parse() {
                    Ok(d) => d,
                    Err(_) => bail!("Displacement '{}' is out of range.", &captures[2]),
                };
                let s = Self::parse_register(&captures[3])?;
                Ok(TmInstruction::rm(op, r, d, s))
            }
        }
    }
}

impl ProgramCodeParser for TmCodeTextParser {
    fn parse_str(&self, data: &str) -> Result<ProgramCode, SimpleError> {
        let mut code = ProgramCode::default();

        for line in data.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(Self::COMMENT_TOKEN) {
                continue;
            }

            let captures = match self.line_pattern.captures(line) {
                Some(captures) => captures,
                None => bail!("Unknown code line found while parsing '{}'.", line),
            };

            let loc: usize = match captures[1].parse() {
                Ok(loc) => loc,
                Err(_) => bail!("Instruction location '{}' is out of range.", &captures[1]),
            };

            let op = match TmOpcode::from_str(&captures[2]) {
                Ok(op) => op,
                Err(_) => bail!("Unknown opcode '{}' found while parsing '{}'.", &captures[2], line),
            };

            let instruction = self.parse_operands(op, &captures[3])?;
            code.write_instruction(loc, instruction);
        }

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ProgramCode,
        ProgramCodeParser,
        Register::*,
        TmCodeTextParser,
        TmInstruction,
        TmOpcode::*
    };

    #[test]
    fn test_text_parser_basic() {
        let mut expected_program_code = ProgramCode::default();
        expected_program_code.write_instruction(0, TmInstruction::ro(ADD, CONSTANT, ZERO, PC));
        expected_program_code.write_instruction(1, TmInstruction::rm(LD, MP, 0, AC));
        expected_program_code.write_instruction(2, TmInstruction::ro(HALT, AC, AC, AC));

        let text = "  0:    ADD  2,3,7\n  1:     LD  5,0(0)\n  2:   HALT  0,0,0\n";
        let code = TmCodeTextParser::new().parse_str(text).unwrap();
        assert_eq!(expected_program_code, code);
    }

    #[test]
    fn test_text_parser_out_of_order_locations() {
        // Backpatched listings revisit earlier locations after later ones.
        let text = "  1:   HALT  0,0,0\n  2:    OUT  0,0,0\n  0:    JEQ  3,1(7)\n";
        let code = TmCodeTextParser::new().parse_str(text).unwrap();

        assert_eq!(code.get(0), Some(&TmInstruction::rm(JEQ, ZERO, 1, PC)));
        assert_eq!(code.get(1), Some(&TmInstruction::halt()));
        assert_eq!(code.get(2), Some(&TmInstruction::ro(OUT, AC, AC, AC)));
    }

    #[test]
    fn test_text_parser_skips_comments_and_blanks() {
        let text = "* TM Compilation to TM Code\n\n  0:   HALT  0,0,0\n";
        let code = TmCodeTextParser::new().parse_str(text).unwrap();
        assert_eq!(code.len(), 1);
    }

    #[test]
    fn test_text_parser_trailing_comment() {
        let text = "  0:    ADD  2,3,7\tset constant to 1\n";
        let code = TmCodeTextParser::new().parse_str(text).unwrap();
        assert_eq!(code.get(0), Some(&TmInstruction::ro(ADD, CONSTANT, ZERO, PC)));
    }

    #[test]
    fn test_text_parser_negative_displacement() {
        let text = "  4:     ST  1,-1(5)\n";
        let code = TmCodeTextParser::new().parse_str(text).unwrap();
        assert_eq!(code.get(4), Some(&TmInstruction::rm(ST, AC1, -1, MP)));
    }

    #[test]
    fn test_text_parser_invalid_token() {
        let text = "  0:   NOOP  0,0,0\n";
        TmCodeTextParser::new().parse_str(text).expect_err("Testing parser error");
    }

    #[test]
    fn test_text_parser_invalid_register() {
        let text = "  0:    ADD  2,3,9\n";
        TmCodeTextParser::new().parse_str(text).expect_err("Testing parser error");
    }
}
