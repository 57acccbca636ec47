use crate::{
    CMinusSemanticAnalyser,
    CompileError,
    Compiler,
    DiagnosticKind,
    PestCMinusParser,
    TmCodeGenerator,
};
use tm_common::{
    ProgramCode,
    ProgramCodeParser,
    Register::*,
    TmCodeTextParser,
    TmInstruction,
    TmOpcode::*,
};

fn compile(source: &str) -> Result<ProgramCode, CompileError> {
    let compiler: Compiler<PestCMinusParser, CMinusSemanticAnalyser, TmCodeGenerator> =
        Compiler::default();
    compiler.compile_str(source)
}

fn semantic_errors(source: &str) -> Vec<crate::Diagnostic> {
    match compile(source) {
        Err(CompileError::Semantic(diagnostics)) => diagnostics,
        other => panic!("expected semantic errors, got {:?}", other.map(|_| "program code")),
    }
}

fn contains(code: &ProgramCode, instruction: TmInstruction) -> bool {
    code.instructions().iter().any(|candidate| *candidate == instruction)
}

#[test]
fn test_minimal_program_layout() {
    let code = compile("int x; void main(void) { x = 3; output(x); }").unwrap();
    let instructions = code.instructions();

    // The five instruction prelude is followed by the six slot startup
    // sequence, so main's body starts at location 11.
    assert_eq!(instructions[0], TmInstruction::ro(ADD, CONSTANT, ZERO, PC));
    assert_eq!(instructions[1], TmInstruction::rm(LD, MP, 0, AC));

    // Startup loads the global area size: one slot for x, one for main.
    assert_eq!(instructions[5], TmInstruction::rm(LDA, AC, -4, PC));
    // The startup jump reaches main's entry at location 11.
    assert_eq!(instructions[9], TmInstruction::rm(LDA, PC, 1, PC));

    // Exactly one HALT, sitting in the last startup slot.
    let halts: Vec<usize> = instructions.iter().enumerate()
        .filter(|(_, instruction)| instruction.opcode() == HALT)
        .map(|(loc, _)| loc)
        .collect();
    assert_eq!(halts, vec![10]);

    // x lives at gp - 1: stored by the assignment, loaded for output.
    assert!(contains(&code, TmInstruction::rm(ST, AC1, -1, GP)));
    assert!(contains(&code, TmInstruction::rm(LD, AC, -1, GP)));
    assert!(contains(&code, TmInstruction::ro(OUT, AC, AC, AC)));
}

#[test]
fn test_empty_program_reports_missing_main() {
    let diagnostics = semantic_errors("");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UndeclaredFunction);
    assert_eq!(diagnostics[0].name.as_deref(), Some("main"));
}

#[test]
fn test_duplicate_declaration_blocks_generation() {
    let diagnostics = semantic_errors("int x; int x; void main(void) { }");
    let duplicates = diagnostics.iter()
        .filter(|diagnostic| diagnostic.kind == DiagnosticKind::DuplicateDeclaration)
        .count();
    assert_eq!(duplicates, 1);
}

#[test]
fn test_array_element_addressing() {
    let code = compile("int a[10]; void main(void) { a[3] = 7; output(a[3]); }").unwrap();

    // Store: the element address is (gp - index) - location with a at
    // location 1, so slot 0 sits at gp - 1 and slot 9 at gp - 10.
    assert!(contains(&code, TmInstruction::ro(SUB, AC, GP, AC)));
    assert!(contains(&code, TmInstruction::rm(ST, AC1, -1, AC)));

    // Load: same address arithmetic through ac1.
    assert!(contains(&code, TmInstruction::ro(SUB, AC1, GP, AC)));
    assert!(contains(&code, TmInstruction::rm(LD, AC, -1, AC1)));
}

#[test]
fn test_array_argument_passes_base_address() {
    let code = compile(
        "void f(int v[]) { v[0] = 1; } void main(void) { int a[5]; f(a); }"
    ).unwrap();

    // The call site takes the base address of the local array a.
    assert!(contains(&code, TmInstruction::ro(ADD, AC, FP, AC)));
    // The address is stored in the first parameter slot below the control
    // area, together with the return address bookkeeping.
    assert!(contains(&code, TmInstruction::rm(ST, AC, -3, MP)));
    assert!(contains(&code, TmInstruction::rm(ST, PC, -1, MP)));

    // Inside f the reference is read back from fp - 0 and dereferenced.
    assert!(contains(&code, TmInstruction::rm(LD, AC1, 0, FP)));
    assert!(contains(&code, TmInstruction::rm(ST, AC1, 0, AC)));
}

#[test]
fn test_shadowed_local_writes_frame_slot() {
    let code = compile("int x; void main(void) { int x; x = 1; }").unwrap();

    // The inner x owns frame slot 1; the global slot is never stored to.
    assert!(contains(&code, TmInstruction::rm(ST, AC1, -1, FP)));
    assert!(!contains(&code, TmInstruction::rm(ST, AC1, -1, GP)));
}

#[test]
fn test_selection_backpatches_branch_pair() {
    let code = compile(
        "void main(void) { if (1 == 2) output(1); else output(2); }"
    ).unwrap();
    let instructions = code.instructions();

    // Every reserved slot was patched: the only HALT left is the startup one.
    let halts: Vec<usize> = instructions.iter().enumerate()
        .filter(|(_, instruction)| instruction.opcode() == HALT)
        .map(|(loc, _)| loc)
        .collect();
    assert_eq!(halts, vec![10]);

    // The dual target conditional branch pair exists, plus the jump over
    // the else block.
    assert!(instructions.iter().any(|instruction| matches!(
        instruction, TmInstruction::RegisterMemory { op: JEQ, r: AC, .. })));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction, TmInstruction::RegisterMemory { op: JNE, r: AC, .. })));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction, TmInstruction::RegisterMemory { op: JEQ, r: ZERO, d, s: PC } if *d > 0)));
}

#[test]
fn test_iteration_jumps_back_and_patches_exit() {
    let code = compile(
        "void main(void) { int i; i = 0; while (i < 3) i = i + 1; }"
    ).unwrap();
    let instructions = code.instructions();

    // The loop closes with a backward unconditional jump and exits through
    // the patched conditional slot.
    assert!(instructions.iter().any(|instruction| matches!(
        instruction, TmInstruction::RegisterMemory { op: JEQ, r: ZERO, d, s: PC } if *d < 0)));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction, TmInstruction::RegisterMemory { op: JNE, r: AC, .. })));

    // Comparison polarity: 0 for true, 1 for false.
    assert!(contains(&code, TmInstruction::rm(JLT, AC, 2, PC)));
    assert!(contains(&code, TmInstruction::ro(ADD, AC, CONSTANT, ZERO)));
    assert!(contains(&code, TmInstruction::ro(ADD, AC, ZERO, ZERO)));
}

#[test]
fn test_builtin_input_output() {
    let code = compile("int x; void main(void) { x = input(); output(x); }").unwrap();
    assert!(contains(&code, TmInstruction::ro(IN, AC, AC, AC)));
    assert!(contains(&code, TmInstruction::ro(OUT, AC, AC, AC)));
}

#[test]
fn test_gcd_program_compiles() {
    let code = compile(
        "int gcd(int u, int v) { \
             if (v == 0) return u; \
             else return gcd(v, u - u / v * v); \
         } \
         void main(void) { output(gcd(1071, 1029)); }"
    ).unwrap();

    let halts = code.instructions().iter()
        .filter(|instruction| instruction.opcode() == HALT)
        .count();
    assert_eq!(halts, 1);

    // Three calls save a return address: startup to main, main to gcd and
    // the recursive call.
    let saved_return_addresses = code.instructions().iter()
        .filter(|instruction| **instruction == TmInstruction::rm(ST, PC, -1, MP))
        .count();
    assert_eq!(saved_return_addresses, 3);
}

#[test]
fn test_emission_is_deterministic() {
    let source = "int a[10]; \
                  int sum(int v[], int n) { \
                      int i; int s; s = 0; i = 0; \
                      while (i < n) { s = s + v[i]; i = i + 1; } \
                      return s; \
                  } \
                  void main(void) { a[0] = 4; output(sum(a, 10)); }";

    let first = compile(source).unwrap();
    let second = compile(source).unwrap();
    assert_eq!(first, second);
    assert_eq!(format!("{}", first), format!("{}", second));
}

#[test]
fn test_listing_round_trips_through_text_parser() {
    let code = compile("int x; void main(void) { x = 3; output(x); }").unwrap();
    let listing = format!("{}", code);

    let reloaded = TmCodeTextParser::new().parse_str(listing.as_str()).unwrap();
    assert_eq!(code, reloaded);
}

#[test]
fn test_parse_error_surfaces() {
    match compile("int a[2][3];") {
        Err(CompileError::Parse(_)) => {}
        other => panic!("expected a parse error, got {:?}", other.map(|_| "program code")),
    }
}
