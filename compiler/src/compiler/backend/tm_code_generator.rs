use super::BackEndGenerator;
use super::emitter::TmCodeEmitter;

use super::super::ast::{
    DeclarationKind,
    ExpressionKind,
    NodeKind,
    Operator,
    StatementKind,
    TreeNode,
    Type,
};
use super::super::ast::symbol_table::{ScopeId, SymbolTable};
use super::super::semantic_analyser::AnnotatedSyntaxTree;
use super::super::semantic_analyser::scope_walker::ScopeWalker;

use std::collections::HashMap;
use tm_common::{
    ProgramCode,
    Register as REG,
    TmOpcode as OP,
};

/// TmCodeGenerator is a backend for the TM machine.
/// It generates program code from an annotated syntax tree.
///
/// # Implementation Details
///   + The stack grows downward from the machine's highest address; mp
///     points at the top, gp addresses globals and fp addresses locals and
///     parameters, always as `base - location`.
///   + Each function call reserves a three cell control area: the saved
///     return address at fp+2, the caller's frame pointer at fp+1, and the
///     first argument slot at fp. Further arguments and the callee's locals
///     continue downward from there.
///   + Expression results are formed in ac with ac1 as the scratch side of
///     binary operations; operands in flight are spilled below mp.
///   + Comparison results use machine friendly polarity: 0 for true, 1 for
///     false, matching the JEQ/JNE pair that selection and iteration
///     statements patch in front of their blocks.
pub struct TmCodeGenerator {
    code: TmCodeEmitter,
    table: SymbolTable,
    walker: ScopeWalker,

    /// Entry instruction of every generated function, keyed by the global
    /// slot its declaration reserved.
    function_entry: HashMap<u32, usize>,
    main_entry: usize,

    global_offset: u32,
    local_offset: u32,

    /// Scope of the function whose parameters are being allocated. The
    /// scope walker itself only advances at compound statements.
    function_scope: Option<ScopeId>,
}

impl BackEndGenerator for TmCodeGenerator {
    /// Creates a default configuration of TmCodeGenerator
    fn default() -> Self {
        Self {
            code: TmCodeEmitter::new(),
            table: SymbolTable::new(),
            walker: ScopeWalker::new(),
            function_entry: HashMap::default(),
            main_entry: 0,
            global_offset: 0,
            local_offset: 0,
            function_scope: None,
        }
    }

    /// Generates ProgramCode from an annotated syntax tree.
    fn generate(mut self, tree: AnnotatedSyntaxTree) -> ProgramCode {
        let (root, table) = tree.into_parts();
        self.table = table;

        self.code.emit_comment("C-Minus compilation to TM code.");
        self.code.emit_comment("Standard prelude:");
        self.code.emit_ro(OP::ADD, REG::CONSTANT, REG::ZERO, REG::PC, "set constant to 1");
        self.code.emit_rm(OP::LD, REG::MP, 0, REG::AC, "load maxaddress from location 0");
        self.code.emit_rm(OP::ST, REG::AC, 0, REG::AC, "clear location 0");
        self.code.emit_ro(OP::ADD, REG::FP, REG::MP, REG::ZERO, "fp = mp");
        self.code.emit_ro(OP::ADD, REG::GP, REG::MP, REG::ZERO, "gp = mp");
        self.code.emit_comment("End of standard prelude.");

        // Leave space for the startup sequence; it can only be written once
        // the size of the global area and the entry of main are known.
        let entry_point = self.code.emit_skip(6);

        if let Some(node) = root.as_ref() {
            self.gen_node(node);
        }

        self.code.emit_backup(entry_point);
        self.code.emit_rm_abs(OP::LDA, REG::AC, self.global_offset as i32, "set ac to globalOffset.");
        self.code.emit_ro(OP::SUB, REG::MP, REG::MP, REG::AC, "mp = mp - ac");
        self.code.emit_ro(OP::SUB, REG::FP, REG::FP, REG::AC, "fp = fp - ac");
        self.code.emit_comment("Function Call Statements.");
        self.code.emit_rm(OP::ST, REG::PC, -1, REG::MP, "store previous address to stack");
        self.code.emit_rm_abs(OP::LDA, REG::PC, self.main_entry as i32, "jump to function");
        self.code.emit_comment("End of execution.");
        self.code.emit_ro(OP::HALT, REG::AC, REG::AC, REG::AC, "");

        self.code.finalize()
    }
}

impl TmCodeGenerator {
    fn gen_node(&mut self, node: &TreeNode) {
        match node.kind {
            NodeKind::Declaration(kind) => self.gen_declaration(kind, node),
            NodeKind::Statement(kind) => self.gen_statement(kind, node),
            NodeKind::Expression(_) => self.gen_expression(node),
            NodeKind::Empty => {}
        }

        if let Some(sibling) = node.sibling.as_deref() {
            self.gen_node(sibling);
        }
    }

    fn gen_declaration(&mut self, kind: DeclarationKind, node: &TreeNode) {
        match kind {
            DeclarationKind::IdDec => {
                if node.is_function_site() {
                    self.gen_function(node);
                } else {
                    self.gen_variable(node);
                }
            }
            DeclarationKind::ParamDec => self.gen_parameter(node),
            DeclarationKind::SizeDec => {}
        }
    }

    /// A function declaration reserves one global slot, records its entry
    /// instruction, and wraps the parameter and body emission in the
    /// prologue and epilogue of the calling convention.
    fn gen_function(&mut self, node: &TreeNode) {
        self.global_offset += 1;
        let slot = self.global_offset;

        let bucket = self.table.lookup(self.walker.current(), node.name())
            .expect("function vanished between analysis and generation");
        self.table.bucket_mut(bucket).location = Some(slot);

        self.function_scope = Some(self.find_function_scope(node.name()));

        let entry = self.code.emit_skip(0);
        self.function_entry.insert(slot, entry);
        if node.name() == "main" {
            self.main_entry = entry;
        }

        self.code.emit_comment(&format!("function {}", node.name()));
        self.code.emit_rm(OP::ST, REG::FP, -2, REG::MP, "store previous frame pointer address.");
        self.code.emit_rm_abs(OP::LDA, REG::AC, 3, "load value 3 to ac.");
        self.code.emit_ro(OP::SUB, REG::FP, REG::MP, REG::AC, "fp = mp - 3");
        self.code.emit_ro(OP::SUB, REG::MP, REG::MP, REG::AC, "mp = mp - 3");

        if let Some(parameters) = node.child(0) {
            self.gen_node(parameters);
        }
        if let Some(body) = node.child(1) {
            self.gen_node(body);
        }

        // The return value, if any, is already in ac.
        self.code.emit_comment("Return Statements.");
        self.code.emit_rm_abs(OP::LDA, REG::AC1, 3, "load value 3 to ac1.");
        self.code.emit_ro(OP::ADD, REG::MP, REG::FP, REG::AC1, "mp = fp + 3");
        self.code.emit_rm(OP::LD, REG::FP, 1, REG::FP, "set fp to previous frame pointer.");
        self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "set ac1 to previous address.");
        self.code.emit_ro(OP::ADD, REG::PC, REG::AC1, REG::CONSTANT, "pc = previous address + 1");
        self.code.emit_comment("Return Statements ended.");
    }

    /// Variable declarations emit no code; they advance the global or local
    /// offset and record the slot the name will be addressed through.
    /// Arrays consume as many cells as their declared size, scalars one.
    fn gen_variable(&mut self, node: &TreeNode) {
        let bucket = self.table.lookup(self.walker.current(), node.name())
            .expect("variable vanished between analysis and generation");

        let size = if self.table.bucket(bucket).bucket_type == Type::IntegerArray {
            node.child(0).expect("array declaration carries no size").value() as u32
        } else {
            1
        };

        let slot = if self.table.bucket(bucket).is_global {
            self.global_offset += size;
            self.global_offset - size + 1
        } else {
            self.local_offset += size;
            self.local_offset - size + 1
        };
        self.table.bucket_mut(bucket).location = Some(slot);
    }

    /// Parameters are numbered from zero so that parameter k is addressed
    /// at fp - k, the slot the caller wrote argument k into. Arrays arrive
    /// by reference and consume a single cell like scalars.
    fn gen_parameter(&mut self, node: &TreeNode) {
        let scope = self.function_scope
            .expect("parameter declared outside of a function");
        let bucket = self.table.lookup(scope, node.name())
            .expect("parameter vanished between analysis and generation");

        self.table.bucket_mut(bucket).location = Some(self.local_offset);
        self.local_offset += 1;
    }

    /// Child scope of the current scope belonging to a function, by name.
    fn find_function_scope(&self, name: &str) -> ScopeId {
        let mut child = self.table.scope(self.walker.current()).first_child;
        while let Some(id) = child {
            if self.table.scope(id).function_name == name {
                return id;
            }
            child = self.table.scope(id).next_sibling;
        }
        panic!("no scope for function '{}' survived analysis", name);
    }

    fn gen_statement(&mut self, kind: StatementKind, node: &TreeNode) {
        match kind {
            StatementKind::Compound => self.gen_compound(node),
            StatementKind::Selection => self.gen_selection(node),
            StatementKind::Iteration => self.gen_iteration(node),
            StatementKind::Return => {
                if let Some(expression) = node.child(0) {
                    self.gen_expression(expression);
                }
                // The value stays in ac; the function epilogue unwinds.
            }
        }
    }

    /// A compound statement re-enters the next scope in creation order,
    /// sizes its local declarations, and brackets its statements with the
    /// stack pointer adjustment that reserves and releases the locals.
    fn gen_compound(&mut self, node: &TreeNode) {
        self.walker.enter_compound_in_order(&self.table);

        if let Some(declarations) = node.child(0) {
            self.gen_node(declarations);
        }

        let offset = self.local_offset as i32;
        self.code.emit_rm_abs(OP::LDA, REG::AC, offset, "load size of local vars to ac.");
        self.code.emit_ro(OP::SUB, REG::MP, REG::MP, REG::AC, "mp = mp - localOffset");

        // Nested compounds size their own locals from zero.
        self.local_offset = 0;

        if let Some(statements) = node.child(1) {
            self.gen_node(statements);
        }

        self.code.emit_rm_abs(OP::LDA, REG::AC1, offset, "load size of local vars to ac1.");
        self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::AC1, "mp = mp + localOffset");

        self.walker.exit_scope(&self.table);
    }

    /// Selection evaluates its condition into ac and reserves two slots for
    /// the conditional branch pair, patched once both block boundaries are
    /// known: JEQ into the then block on 0, JNE past it otherwise.
    fn gen_selection(&mut self, node: &TreeNode) {
        self.gen_expression(node.child(0).expect("selection without a condition"));

        let first_loc = self.code.emit_skip(2);

        let first_block = self.code.emit_skip(0);
        if let Some(then_branch) = node.child(1) {
            self.gen_node(then_branch);
        }

        let mut second_block = self.code.emit_skip(0);
        match node.child(2) {
            Some(else_branch) if else_branch.kind != NodeKind::Empty => {
                let second_loc = self.code.emit_skip(1);
                second_block = self.code.emit_skip(0);

                self.gen_node(else_branch);
                let current_loc = self.code.emit_skip(0);

                // The then block jumps over the else block.
                self.code.emit_backup(second_loc);
                self.code.emit_rm_abs(OP::JEQ, REG::ZERO, current_loc as i32, "jump to nonconditional area.");
            }
            _ => {}
        }

        self.code.emit_backup(first_loc);
        self.code.emit_rm_abs(OP::JEQ, REG::AC, first_block as i32, "jump to firstBlock if ac == 0.");
        self.code.emit_rm_abs(OP::JNE, REG::AC, second_block as i32, "jump to secondBlock if ac != 0.");

        self.code.emit_restore();
    }

    /// Iteration re-evaluates its condition at the top of every pass and
    /// exits through a single patched slot when the condition goes false,
    /// with false being any non zero accumulator.
    fn gen_iteration(&mut self, node: &TreeNode) {
        let first_block = self.code.emit_skip(0);

        self.gen_expression(node.child(0).expect("iteration without a condition"));

        let first_loc = self.code.emit_skip(1);

        if let Some(body) = node.child(1) {
            self.gen_node(body);
        }

        self.code.emit_rm_abs(OP::JEQ, REG::ZERO, first_block as i32, "loop of firstBlock.");

        let second_block = self.code.emit_skip(0);
        self.code.emit_backup(first_loc);
        self.code.emit_rm_abs(OP::JNE, REG::AC, second_block as i32, "jump to secondBlock if ac != 0.");

        self.code.emit_restore();
    }

    fn gen_expression(&mut self, node: &TreeNode) {
        match node.kind {
            NodeKind::Expression(ExpressionKind::Op) => self.gen_op(node),
            NodeKind::Expression(ExpressionKind::Const) => {
                self.code.emit_rm_abs(OP::LDA, REG::AC, node.value(), "load constant value to ac.");
            }
            NodeKind::Expression(ExpressionKind::Id) => self.gen_identifier(node),
            _ => panic!("Malformed AST! Node {:?} is not an expression.", node.kind),
        }
    }

    /// Every operation evaluates its right hand side first and spills it
    /// below mp. Plain operators then form the left hand side in ac, pop
    /// the spilled value into ac1 and combine the two; assignment resolves
    /// the target address instead and pops during the store.
    fn gen_op(&mut self, node: &TreeNode) {
        let operator = node.operator();

        self.gen_expression(node.child(1).expect("operation without a right hand side"));
        self.code.emit_rm(OP::ST, REG::AC, -1, REG::MP, "mem[mp - 1] = right expression");
        self.code.emit_ro(OP::SUB, REG::MP, REG::MP, REG::CONSTANT, "mp = mp - 1");

        if operator != Operator::ASSIGN {
            self.gen_expression(node.child(0).expect("operation without a left hand side"));
            self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::CONSTANT, "mp = mp + 1");
            self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "ac1 = mem[mp - 1]");
        }

        match operator {
            Operator::ASSIGN => {
                self.gen_assignment(node.child(0).expect("assignment without a target"));
            }
            Operator::ADD => self.code.emit_ro(OP::ADD, REG::AC, REG::AC, REG::AC1, "ac = ac + ac1"),
            Operator::SUB => self.code.emit_ro(OP::SUB, REG::AC, REG::AC, REG::AC1, "ac = ac - ac1"),
            Operator::MUL => self.code.emit_ro(OP::MUL, REG::AC, REG::AC, REG::AC1, "ac = ac * ac1"),
            Operator::DIV => self.code.emit_ro(OP::DIV, REG::AC, REG::AC, REG::AC1, "ac = ac / ac1"),
            Operator::EQUAL => {
                self.code.emit_ro(OP::SUB, REG::AC, REG::AC, REG::AC1, "operator == : ac == 0 if equal");
            }
            Operator::NOT_EQUAL => self.gen_comparison(OP::JNE, "op !="),
            Operator::LESS_THAN => self.gen_comparison(OP::JLT, "op <"),
            Operator::LESS_EQUAL => self.gen_comparison(OP::JLE, "op <="),
            Operator::GREATER_THAN => self.gen_comparison(OP::JGT, "op >"),
            Operator::GREATER_EQUAL => self.gen_comparison(OP::JGE, "op >="),
        }
    }

    /// Comparisons subtract and settle ac to 0 for true or 1 for false,
    /// the polarity the selection and iteration jump pairs expect.
    fn gen_comparison(&mut self, jump: OP, comment: &str) {
        self.code.emit_ro(OP::SUB, REG::AC, REG::AC, REG::AC1, comment);
        self.code.emit_rm(jump, REG::AC, 2, REG::PC, "jump if true");
        self.code.emit_ro(OP::ADD, REG::AC, REG::CONSTANT, REG::ZERO, "ac = 1 : not true");
        self.code.emit_rm(OP::JEQ, REG::ZERO, 1, REG::PC, "jump to next instruction");
        self.code.emit_ro(OP::ADD, REG::AC, REG::ZERO, REG::ZERO, "ac = 0 : true");
    }

    /// Stores the spilled right hand side into the target of an assignment
    /// and leaves the stored value in ac as the value of the expression.
    fn gen_assignment(&mut self, target: &TreeNode) {
        let bucket = self.table.lookup(self.walker.current(), target.name())
            .expect("assignment target vanished between analysis and generation");
        let bucket = self.table.bucket(bucket);
        let (bucket_type, is_param, is_global) = (bucket.bucket_type, bucket.is_param, bucket.is_global);
        // Builtin functions own no storage slot.
        let displacement = -(bucket.location.unwrap_or(0) as i32);

        if bucket_type != Type::IntegerArray {
            self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::CONSTANT, "mp = mp + 1");
            self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "ac1 = mem[mp - 1]");

            if is_global {
                self.code.emit_rm(OP::ST, REG::AC1, displacement, REG::GP, "memory[gp - location] = ac1");
            } else {
                self.code.emit_rm(OP::ST, REG::AC1, displacement, REG::FP, "memory[fp - location] = ac1");
            }
            return;
        }

        match target.child(0) {
            // Whole-array assignment never passes the type checker; the
            // spilled value is still popped to keep the stack balanced.
            None => {
                self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::CONSTANT, "mp = mp + 1");
                self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "ac1 = mem[mp - 1]");
            }
            Some(index) => {
                self.gen_expression(index);

                if is_param {
                    // The parameter cell holds the address of element zero.
                    self.code.emit_rm(OP::LD, REG::AC1, displacement, REG::FP, "load reference to ac1.");
                    self.code.emit_ro(OP::SUB, REG::AC1, REG::AC1, REG::AC, "ac1 = ac1 - ac");
                    self.code.emit_ro(OP::ADD, REG::AC, REG::AC1, REG::ZERO, "ac = ac1");

                    self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::CONSTANT, "mp = mp + 1");
                    self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "ac1 = mem[mp - 1]");
                    self.code.emit_rm(OP::ST, REG::AC1, 0, REG::AC, "memory[ac] = ac1");
                } else {
                    if is_global {
                        self.code.emit_ro(OP::SUB, REG::AC, REG::GP, REG::AC, "ac = gp - offset");
                    } else {
                        self.code.emit_ro(OP::SUB, REG::AC, REG::FP, REG::AC, "ac = fp - offset");
                    }

                    self.code.emit_ro(OP::ADD, REG::MP, REG::MP, REG::CONSTANT, "mp = mp + 1");
                    self.code.emit_rm(OP::LD, REG::AC1, -1, REG::MP, "ac1 = mem[mp - 1]");
                    self.code.emit_rm(OP::ST, REG::AC1, displacement, REG::AC, "memory[ac - location] = ac1");
                }

                self.code.emit_ro(OP::ADD, REG::AC, REG::AC1, REG::ZERO, "ac = stored value");
            }
        }
    }

    fn gen_identifier(&mut self, node: &TreeNode) {
        let bucket = self.table.lookup(self.walker.current(), node.name())
            .expect("identifier vanished between analysis and generation");
        let bucket = self.table.bucket(bucket);
        let (is_function, bucket_type, is_param, is_global, location) = (
            bucket.is_function,
            bucket.bucket_type,
            bucket.is_param,
            bucket.is_global,
            bucket.location,
        );

        if is_function {
            self.gen_call(node, location);
        } else if bucket_type == Type::IntegerArray {
            let displacement = -(location.expect("array has no storage slot") as i32);
            self.gen_array_value(node, is_param, is_global, displacement);
        } else {
            let displacement = -(location.expect("variable has no storage slot") as i32);
            if is_global {
                self.code.emit_rm(OP::LD, REG::AC, displacement, REG::GP, "ac = memory[gp - location]");
            } else {
                self.code.emit_rm(OP::LD, REG::AC, displacement, REG::FP, "ac = memory[fp - location]");
            }
        }
    }

    /// The builtins map straight onto machine instructions; a user function
    /// call writes its arguments into the callee's parameter slots below
    /// the control area, saves the return address and jumps to the entry
    /// recorded when the function was generated.
    fn gen_call(&mut self, node: &TreeNode, slot: Option<u32>) {
        let slot = match slot {
            None => {
                if node.name() == "input" {
                    self.code.emit_ro(OP::IN, REG::AC, REG::AC, REG::AC, "read integer value");
                } else {
                    if let Some(argument) = node.child(0) {
                        self.gen_expression(argument);
                    }
                    self.code.emit_ro(OP::OUT, REG::AC, REG::AC, REG::AC, "write integer value");
                }
                return;
            }
            Some(slot) => slot,
        };

        let entry = *self.function_entry.get(&slot)
            .expect("function called before its definition was generated");

        self.code.emit_comment("putting arguments");
        let mut argument = node.child(0);
        let mut offset = -3;
        while let Some(expression) = argument {
            self.gen_expression(expression);
            self.code.emit_rm(OP::ST, REG::AC, offset, REG::MP, "memory[mp+offset] = ac");
            offset -= 1;
            argument = expression.sibling.as_deref();
        }
        self.code.emit_comment("argument put on stack");

        self.code.emit_comment("Function Call Statements.");
        self.code.emit_rm(OP::ST, REG::PC, -1, REG::MP, "store return address to stack");
        self.code.emit_rm_abs(OP::LDA, REG::PC, entry as i32, "jump to function");
        self.code.emit_comment("Function Call Statements ended.");
    }

    /// An indexed array use loads the element; an unindexed one produces
    /// the base address, which is how arrays are passed by reference. Array
    /// parameters hold such an address and get one extra dereference.
    fn gen_array_value(&mut self, node: &TreeNode, is_param: bool, is_global: bool, displacement: i32) {
        if let Some(index) = node.child(0) {
            self.gen_expression(index);
        }

        if is_param {
            if node.child(0).is_none() {
                self.code.emit_rm(OP::LD, REG::AC, displacement, REG::FP, "load reference to ac.");
            } else {
                self.code.emit_rm(OP::LD, REG::AC1, displacement, REG::FP, "load reference to ac1.");
                self.code.emit_ro(OP::SUB, REG::AC1, REG::AC1, REG::AC, "ac1 = ac1 - ac");
                self.code.emit_rm(OP::LD, REG::AC, 0, REG::AC1, "ac = memory[ac1]");
            }
        } else if node.child(0).is_none() {
            self.code.emit_rm_abs(OP::LDA, REG::AC, displacement, "load -location to ac");
            if is_global {
                self.code.emit_ro(OP::ADD, REG::AC, REG::GP, REG::AC, "ac = gp - location");
            } else {
                self.code.emit_ro(OP::ADD, REG::AC, REG::FP, REG::AC, "ac = fp - location");
            }
        } else if is_global {
            self.code.emit_ro(OP::SUB, REG::AC1, REG::GP, REG::AC, "ac1 = gp - offset");
            self.code.emit_rm(OP::LD, REG::AC, displacement, REG::AC1, "ac = memory[ac1 - location]");
        } else {
            self.code.emit_ro(OP::SUB, REG::AC1, REG::FP, REG::AC, "ac1 = fp - offset");
            self.code.emit_rm(OP::LD, REG::AC, displacement, REG::AC1, "ac = memory[ac1 - location]");
        }
    }
}
