use tm_common::{ProgramCode, Register, TmInstruction, TmOpcode};

/// Instruction writer the code generator emits through. Emission normally
/// advances one location at a time, but slots can be reserved with
/// emit_skip and filled in later by backing up to them, which is how jump
/// targets that are unknown while a construct is being generated get
/// patched once its size is settled. A high water mark remembers the
/// emission frontier across such excursions.
pub(crate) struct TmCodeEmitter {
    code: ProgramCode,
    emit_loc: usize,
    high_emit_loc: usize,
}

impl TmCodeEmitter {
    pub fn new() -> Self {
        Self {
            code: ProgramCode::default(),
            emit_loc: 0,
            high_emit_loc: 0,
        }
    }

    fn write(&mut self, instruction: TmInstruction, comment: &str) {
        self.code.write_instruction(self.emit_loc, instruction);
        self.code.set_trailing_comment(self.emit_loc, String::from(comment));
        self.emit_loc += 1;
        if self.high_emit_loc < self.emit_loc {
            self.high_emit_loc = self.emit_loc;
        }
    }

    /// Emits a three register instruction.
    pub fn emit_ro(&mut self, op: TmOpcode, r: Register, s: Register, t: Register, comment: &str) {
        self.write(TmInstruction::ro(op, r, s, t), comment);
    }

    /// Emits a register-memory instruction with an explicit displacement.
    pub fn emit_rm(&mut self, op: TmOpcode, r: Register, d: i32, s: Register, comment: &str) {
        self.write(TmInstruction::rm(op, r, d, s), comment);
    }

    /// Emits a register-memory instruction against the program counter with
    /// the displacement `abs - (emit_loc + 1)`, so that adding the program
    /// counter at run time yields `abs`. Used both for jumps to absolute
    /// locations and, with LDA, for loading constants.
    pub fn emit_rm_abs(&mut self, op: TmOpcode, r: Register, abs: i32, comment: &str) {
        let displacement = abs - (self.emit_loc as i32 + 1);
        self.write(TmInstruction::rm(op, r, displacement, Register::PC), comment);
    }

    /// Skips a number of instruction slots for later backpatching and
    /// returns the first skipped location. Skipping zero slots reads the
    /// current location.
    pub fn emit_skip(&mut self, slots: usize) -> usize {
        let location = self.emit_loc;
        self.emit_loc += slots;
        if self.high_emit_loc < self.emit_loc {
            self.high_emit_loc = self.emit_loc;
        }
        location
    }

    /// Moves emission back to a previously skipped location.
    pub fn emit_backup(&mut self, loc: usize) {
        debug_assert!(loc <= self.high_emit_loc, "backed up to a location never reached");
        self.emit_loc = loc;
    }

    /// Returns emission to the highest location reached so far.
    pub fn emit_restore(&mut self) {
        self.emit_loc = self.high_emit_loc;
    }

    /// Attaches a comment line above the next emitted instruction.
    pub fn emit_comment(&mut self, comment: &str) {
        self.code.add_comment(self.emit_loc, String::from(comment));
    }

    /// Finishes emission, yielding the program code.
    pub fn finalize(self) -> ProgramCode {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::TmCodeEmitter;
    use tm_common::{Register::*, TmInstruction, TmOpcode::*};

    #[test]
    fn test_emit_advances_locations() {
        let mut emitter = TmCodeEmitter::new();
        emitter.emit_ro(ADD, CONSTANT, ZERO, PC, "set constant to 1");
        emitter.emit_rm(LD, MP, 0, AC, "load maxaddress from location 0");

        let code = emitter.finalize();
        assert_eq!(code.len(), 2);
        assert_eq!(code.get(0), Some(&TmInstruction::ro(ADD, CONSTANT, ZERO, PC)));
        assert_eq!(code.get(1), Some(&TmInstruction::rm(LD, MP, 0, AC)));
    }

    #[test]
    fn test_emit_rm_abs_is_pc_relative() {
        let mut emitter = TmCodeEmitter::new();
        emitter.emit_skip(3);
        // At location 3, reaching absolute location 7 takes a displacement
        // of 7 - (3 + 1).
        emitter.emit_rm_abs(LDA, PC, 7, "jump to function");

        let code = emitter.finalize();
        assert_eq!(code.get(3), Some(&TmInstruction::rm(LDA, PC, 3, PC)));
    }

    #[test]
    fn test_skip_backup_restore() {
        let mut emitter = TmCodeEmitter::new();
        let saved = emitter.emit_skip(2);
        assert_eq!(saved, 0);

        emitter.emit_ro(OUT, AC, AC, AC, "write integer value");
        assert_eq!(emitter.emit_skip(0), 3);

        emitter.emit_backup(saved);
        emitter.emit_rm(JEQ, AC, 1, PC, "");
        emitter.emit_rm(JNE, AC, 2, PC, "");

        emitter.emit_restore();
        assert_eq!(emitter.emit_skip(0), 3);

        let code = emitter.finalize();
        assert_eq!(code.get(0), Some(&TmInstruction::rm(JEQ, AC, 1, PC)));
        assert_eq!(code.get(1), Some(&TmInstruction::rm(JNE, AC, 2, PC)));
        assert_eq!(code.get(2), Some(&TmInstruction::ro(OUT, AC, AC, AC)));
    }

    #[test]
    fn test_skipped_slots_fall_back_to_halt() {
        let mut emitter = TmCodeEmitter::new();
        emitter.emit_skip(1);
        emitter.emit_ro(IN, AC, AC, AC, "read integer value");

        let code = emitter.finalize();
        assert_eq!(code.get(0), Some(&TmInstruction::halt()));
    }
}
