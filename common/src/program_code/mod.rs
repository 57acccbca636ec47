pub mod instructions;

use std::collections::HashMap;
use std::fmt;

pub use self::instructions::{
    TmInstruction,
    TmOpcode,
    OpClass,
    Register
};

/// Program Code Decorations holds all non functional data related to compiled
/// program code: standalone comment lines rendered above an instruction and
/// trailing comments rendered after one.
#[derive(Debug)]
pub struct ProgramCodeDecorations {
    line_comments: HashMap<usize, Vec<String>>,
    trailing_comments: HashMap<usize, String>,
}

impl ProgramCodeDecorations {
    fn new() -> Self {
        Self {
            line_comments: Default::default(),
            trailing_comments: Default::default(),
        }
    }

    /// Add a comment line above an instruction location.
    /// Multiple comments can be added to the same location.
    fn add_comment(&mut self, loc: usize, comment: String) {
        if let Some(existing_comments) = self.line_comments.get_mut(&loc) {
            existing_comments.push(comment);
        } else {
            self.line_comments.insert(loc, vec![comment]);
        }
    }

    /// Get all comment lines above an instruction location.
    fn get_comments(&self, loc: usize) -> Option<&Vec<String>> {
        self.line_comments.get(&loc)
    }
}

/// ProgramCode is the linear instruction buffer produced by the compiler
/// backend and consumed by the TM machine. Instructions are addressed by
/// location; writing past the end grows the buffer with halting slots the
/// same way the machine treats unwritten instruction memory.
#[derive(Debug)]
pub struct ProgramCode {
    instructions: Vec<TmInstruction>,

    /// Render decorations is used when formatting to determine whether to
    /// include comments in the listing.
    render_decorations: bool,

    /// Non functional meta data
    decorations: ProgramCodeDecorations,
}

#[allow(dead_code)]
impl ProgramCode {
    /// Generates an empty ProgramCode. Useful when using the writer functions.
    pub fn default() -> ProgramCode {
        ProgramCode {
            instructions: vec![],
            render_decorations: false,
            decorations: ProgramCodeDecorations::new(),
        }
    }

    pub fn new(instructions: Vec<TmInstruction>) -> ProgramCode {
        ProgramCode {
            instructions,
            render_decorations: false,
            decorations: ProgramCodeDecorations::new(),
        }
    }

    /// Replaces self with a decorated version of program code
    pub fn decorated(mut self) -> Self {
        self.render_decorations = true;
        self
    }

    /// Writes an instruction at a location, growing the buffer with halting
    /// slots when the location lies past the current end. Locations may be
    /// written out of order and rewritten, which is how backpatching reaches
    /// previously reserved slots.
    pub fn write_instruction(&mut self, loc: usize, instruction: TmInstruction) {
        if loc >= self.instructions.len() {
            self.instructions.resize(loc + 1, TmInstruction::halt());
        }
        self.instructions[loc] = instruction;
    }

    /// Adds a comment line rendered above the instruction at a location.
    pub fn add_comment(&mut self, loc: usize, comment: String) {
        self.decorations.add_comment(loc, comment);
    }

    /// Sets the trailing comment rendered after the instruction at a location.
    pub fn set_trailing_comment(&mut self, loc: usize, comment: String) {
        if !comment.is_empty() {
            self.decorations.trailing_comments.insert(loc, comment);
        }
    }

    pub fn instructions(&self) -> &[TmInstruction] {
        &self.instructions
    }

    pub fn get(&self, loc: usize) -> Option<&TmInstruction> {
        self.instructions.get(loc)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

// Implement equality traits for comparing program code.
// Decorations carry no meaning, only the instructions are compared.
impl PartialEq for ProgramCode {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
    }
}
impl Eq for ProgramCode {}

impl fmt::Display for ProgramCode {
    /// This allows for program code to be converted into a string.
    /// For files this format is stored with the extension .tm and can be
    /// loaded into the TM machine for execution.
    ///
    /// # Format
    /// Each line holds one instruction as `loc:  OP  r,s,t` or
    /// `loc:  OP  r,d(s)`. Lines starting with * are comments and are
    /// ignored by the loader; they are only written for decorated listings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (loc, instruction) in self.instructions.iter().enumerate() {
            if self.render_decorations {
                if let Some(comments) = self.decorations.get_comments(loc) {
                    for comment in comments {
                        writeln!(f, "* {}", comment)?;
                    }
                }
            }

            write!(f, "{:3}:  {}", loc, instruction)?;

            if self.render_decorations {
                if let Some(comment) = self.decorations.trailing_comments.get(&loc) {
                    write!(f, "\t{}", comment)?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ProgramCode, Register, TmInstruction, TmOpcode};
    use super::Register::*;

    #[test]
    fn test_write_instruction_grows_with_halts() {
        let mut code = ProgramCode::default();
        code.write_instruction(2, TmInstruction::rm(TmOpcode::LD, MP, 0, AC));

        assert_eq!(code.len(), 3);
        assert_eq!(code.get(0), Some(&TmInstruction::halt()));
        assert_eq!(code.get(1), Some(&TmInstruction::halt()));
        assert_eq!(code.get(2), Some(&TmInstruction::rm(TmOpcode::LD, MP, 0, AC)));
    }

    #[test]
    fn test_write_instruction_backpatch() {
        let mut code = ProgramCode::default();
        code.write_instruction(0, TmInstruction::halt());
        code.write_instruction(1, TmInstruction::ro(TmOpcode::ADD, AC, AC, AC1));
        code.write_instruction(0, TmInstruction::rm(TmOpcode::JNE, AC, 4, Register::PC));

        assert_eq!(code.get(0), Some(&TmInstruction::rm(TmOpcode::JNE, AC, 4, Register::PC)));
    }

    #[test]
    fn test_equality_ignores_decorations() {
        let mut plain = ProgramCode::default();
        plain.write_instruction(0, TmInstruction::halt());

        let mut commented = ProgramCode::default();
        commented.write_instruction(0, TmInstruction::halt());
        commented.add_comment(0, String::from("End of execution."));
        commented.set_trailing_comment(0, String::from("stop"));

        assert_eq!(plain, commented);
    }

    #[test]
    fn test_display_plain_listing() {
        let mut code = ProgramCode::default();
        code.write_instruction(0, TmInstruction::ro(TmOpcode::ADD, CONSTANT, ZERO, PC));
        code.write_instruction(1, TmInstruction::rm(TmOpcode::LD, MP, 0, AC));
        code.add_comment(0, String::from("Standard prelude:"));

        let listing = format!("{}", code);
        assert_eq!(listing, "  0:    ADD  2,3,7\n  1:     LD  5,0(0)\n");
    }

    #[test]
    fn test_display_decorated_listing() {
        let mut code = ProgramCode::default();
        code.write_instruction(0, TmInstruction::ro(TmOpcode::ADD, CONSTANT, ZERO, PC));
        code.add_comment(0, String::from("Standard prelude:"));
        code.set_trailing_comment(0, String::from("set constant to 1"));

        let listing = format!("{}", code.decorated());
        assert_eq!(listing, "* Standard prelude:\n  0:    ADD  2,3,7\tset constant to 1\n");
    }
}
