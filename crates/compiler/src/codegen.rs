//! Bytecode compiler: lowers the AST to `zinc_core::Program`.
//!
//! Local slots are assigned sequentially per function, parameters first.
//! Forward jumps are emitted with a placeholder target and patched once the
//! destination index is known. Every emitted instruction carries the source
//! line the compiler is currently lowering.

use crate::ast::{
    BaseType, BinOp, Expr, ExprKind, FunctionDef, Program as AstProgram, Stmt, StmtKind, UnOp,
    VarDecl,
};
use std::collections::HashMap;
use zinc_core::bytecode::Constant;
use zinc_core::{AddressTarget, Function, Instruction, Op, Program, StructDef};

/// Per-loop bookkeeping for break/continue patching.
struct LoopContext {
    break_jumps: Vec<usize>,
    continue_jumps: Vec<usize>,
    /// Set when the continue destination is already known (while loops jump
    /// back to the condition). Counted loops patch `continue_jumps` to their
    /// increment section instead.
    continue_target: Option<usize>,
}

impl LoopContext {
    fn new(continue_target: Option<usize>) -> LoopContext {
        LoopContext {
            break_jumps: Vec::new(),
            continue_jumps: Vec::new(),
            continue_target,
        }
    }
}

pub struct Compiler {
    program: Program,
    code: Vec<Instruction>,
    locals: HashMap<String, usize>,
    local_count: usize,
    loops: Vec<LoopContext>,
    line: usize,
}

/// Compile a parsed program to bytecode.
pub fn compile(ast: &AstProgram) -> Result<Program, String> {
    Compiler::new().compile(ast)
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            program: Program::new(),
            code: Vec::new(),
            locals: HashMap::new(),
            local_count: 0,
            loops: Vec::new(),
            line: 0,
        }
    }

    pub fn compile(mut self, ast: &AstProgram) -> Result<Program, String> {
        for def in &ast.structs {
            self.compile_struct(def);
        }
        for func in &ast.functions {
            self.compile_function(func)?;
        }
        if self.program.functions.contains_key("main") {
            self.program.entry = Some("main".to_string());
        }
        Ok(self.program)
    }

    fn err(&self, msg: impl Into<String>) -> String {
        format!("Compile error at line {}: {}", self.line, msg.into())
    }

    fn compile_struct(&mut self, def: &crate::ast::StructDef) {
        let mut fields = indexmap::IndexMap::new();
        for field in &def.fields {
            let type_name = field
                .var_type
                .as_ref()
                .map(|t| t.type_string())
                .unwrap_or_else(|| "number".to_string());
            fields.insert(field.name.clone(), type_name);
        }
        self.program.structs.insert(
            def.name.clone(),
            StructDef {
                name: def.name.clone(),
                fields,
            },
        );
    }

    fn compile_function(&mut self, func: &FunctionDef) -> Result<(), String> {
        self.code = Vec::new();
        self.locals = HashMap::new();
        self.local_count = 0;
        self.loops = Vec::new();
        self.line = func.line;

        let params: Vec<String> = func.params.iter().map(|p| p.name.clone()).collect();
        let param_types: Vec<String> = func
            .params
            .iter()
            .map(|p| {
                p.var_type
                    .as_ref()
                    .map(|t| t.type_string())
                    .unwrap_or_else(|| "number".to_string())
            })
            .collect();

        for param in &func.params {
            self.declare_local(&param.name);
        }

        for stmt in &func.body {
            self.compile_statement(stmt)?;
        }

        // Implicit return for functions that do not end in one
        let needs_return = !matches!(
            self.code.last().map(|i| &i.op),
            Some(Op::Return) | Some(Op::ReturnValue)
        );
        if needs_return {
            if func.is_main {
                self.emit(Op::PushInt(0));
                self.emit(Op::ReturnValue);
            } else {
                self.emit(Op::Return);
            }
        }

        let compiled = Function {
            name: func.name.clone(),
            params,
            param_types,
            return_type: func.return_type.as_ref().map(|t| t.type_string()),
            code: std::mem::take(&mut self.code),
            locals_count: self.local_count,
            is_main: func.is_main,
        };
        self.program.functions.insert(func.name.clone(), compiled);
        Ok(())
    }

    fn declare_local(&mut self, name: &str) -> usize {
        let slot = self.local_count;
        self.locals.insert(name.to_string(), slot);
        self.local_count += 1;
        slot
    }

    /// A fresh unnamed slot for loop temporaries.
    fn temp_slot(&mut self) -> usize {
        let slot = self.local_count;
        self.local_count += 1;
        slot
    }

    fn emit(&mut self, op: Op) -> usize {
        self.code.push(Instruction::new(op, self.line));
        self.code.len() - 1
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    fn patch_jump(&mut self, at: usize) {
        let target = self.here();
        self.patch_jump_to(at, target);
    }

    fn patch_jump_to(&mut self, at: usize, target: usize) {
        if let Some(instr) = self.code.get_mut(at) {
            match &mut instr.op {
                Op::Jump(t) | Op::JumpIfFalse(t) | Op::JumpIfTrue(t) => *t = target,
                _ => debug_assert!(false, "patched a non-jump instruction"),
            }
        }
    }

    fn store_var(&mut self, name: &str) {
        match self.locals.get(name) {
            Some(&slot) => self.emit(Op::StoreLocal(slot)),
            None => self.emit(Op::StoreGlobal(name.to_string())),
        };
    }

    fn load_var(&mut self, name: &str) {
        match self.locals.get(name) {
            Some(&slot) => self.emit(Op::LoadLocal(slot)),
            None => self.emit(Op::LoadGlobal(name.to_string())),
        };
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn compile_statement(&mut self, stmt: &Stmt) -> Result<(), String> {
        self.line = stmt.line;

        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.compile_var_decl(decl)?,
            StmtKind::Assign { target, value } => self.compile_assignment(target, value)?,
            StmtKind::If {
                condition,
                then_body,
                else_ifs,
                else_body,
            } => self.compile_if(condition, then_body, else_ifs, else_body)?,
            StmtKind::While { condition, body } => self.compile_while(condition, body)?,
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => self.compile_for(var, start, end, *step, body)?,
            StmtKind::ForEach {
                var,
                iterable,
                body,
                ..
            } => self.compile_foreach(var, iterable, body)?,
            StmtKind::Repeat { count, body } => self.compile_repeat(count, body)?,
            StmtKind::Print { parts } => {
                for part in parts {
                    self.compile_expr(part)?;
                    self.emit(Op::Print);
                }
                self.emit(Op::PrintNewline);
            }
            StmtKind::Input { target, input_kind } => {
                let input_op = match input_kind {
                    crate::ast::InputKind::Number => Op::InputInt,
                    crate::ast::InputKind::Decimal => Op::InputFloat,
                    crate::ast::InputKind::Letter => Op::InputChar,
                    crate::ast::InputKind::Text => Op::InputString,
                };
                self.compile_store_with(target, |c| {
                    c.emit(input_op);
                    Ok(())
                })?;
            }
            StmtKind::Return { value } => match value {
                Some(expr) => {
                    self.compile_expr(expr)?;
                    self.emit(Op::ReturnValue);
                }
                None => {
                    self.emit(Op::Return);
                }
            },
            StmtKind::Break => {
                let jump = self.emit(Op::Jump(0));
                match self.loops.last_mut() {
                    Some(ctx) => ctx.break_jumps.push(jump),
                    None => return Err(self.err("Break statement outside of loop")),
                }
            }
            StmtKind::Continue => {
                if self.loops.is_empty() {
                    return Err(self.err("Continue statement outside of loop"));
                }
                let target = self.loops.last().and_then(|ctx| ctx.continue_target);
                match target {
                    Some(target) => {
                        self.emit(Op::Jump(target));
                    }
                    None => {
                        let jump = self.emit(Op::Jump(0));
                        if let Some(ctx) = self.loops.last_mut() {
                            ctx.continue_jumps.push(jump);
                        }
                    }
                }
            }
            StmtKind::Free { pointer } => {
                self.compile_expr(pointer)?;
                self.emit(Op::Free);
            }
            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(Op::Pop);
            }

            StmtKind::OpenWindow {
                width,
                height,
                title,
            } => {
                self.compile_expr(width)?;
                self.compile_expr(height)?;
                match title {
                    Some(expr) => self.compile_expr(expr)?,
                    None => {
                        self.emit(Op::PushString("Zinc App".to_string()));
                    }
                }
                self.emit(Op::Call("__open_window__".to_string(), 3));
                self.emit(Op::Pop);
            }
            StmtKind::CloseWindow => {
                self.emit(Op::Call("__close_window__".to_string(), 0));
                self.emit(Op::Pop);
            }
            StmtKind::BeginDrawing => {
                self.emit(Op::Call("__begin_drawing__".to_string(), 0));
                self.emit(Op::Pop);
            }
            StmtKind::EndDrawing => {
                self.emit(Op::Call("__end_drawing__".to_string(), 0));
                self.emit(Op::Pop);
            }
            StmtKind::ClearScreen { color } => {
                self.emit(Op::PushString(color.clone()));
                self.emit(Op::Call("__clear_screen__".to_string(), 1));
                self.emit(Op::Pop);
            }
            StmtKind::DrawRectangle {
                x,
                y,
                width,
                height,
                color,
            } => {
                self.compile_expr(x)?;
                self.compile_expr(y)?;
                self.compile_expr(width)?;
                self.compile_expr(height)?;
                self.emit(Op::PushString(color.clone()));
                self.emit(Op::Call("__draw_rectangle__".to_string(), 5));
                self.emit(Op::Pop);
            }
            StmtKind::DrawText {
                text,
                x,
                y,
                size,
                color,
            } => {
                self.compile_expr(text)?;
                self.compile_expr(x)?;
                self.compile_expr(y)?;
                self.compile_expr(size)?;
                self.emit(Op::PushString(color.clone()));
                self.emit(Op::Call("__draw_text__".to_string(), 5));
                self.emit(Op::Pop);
            }
        }
        Ok(())
    }

    fn compile_var_decl(&mut self, decl: &VarDecl) -> Result<(), String> {
        let slot = self.declare_local(&decl.name);

        if decl.is_file {
            match &decl.file_path {
                Some(path) => {
                    self.compile_expr(path)?;
                    let mode = decl
                        .file_mode
                        .map(|m| m.as_str())
                        .unwrap_or("read");
                    self.emit(Op::PushString(mode.to_string()));
                    self.emit(Op::Call("__open_file__".to_string(), 2));
                }
                None => {
                    self.emit(Op::PushNull);
                }
            }
            self.emit(Op::StoreLocal(slot));
            return Ok(());
        }

        if let Some(ty) = &decl.var_type {
            if ty.is_array {
                match (&decl.init, ty.array_size) {
                    (Some(init), _) => self.compile_expr(init)?,
                    (None, Some(size)) => {
                        self.emit(Op::PushInt(size as i64));
                        self.emit(Op::CreateArray);
                    }
                    (None, None) => {
                        self.emit(Op::PushNull);
                    }
                }
                self.emit(Op::StoreLocal(slot));
                return Ok(());
            }
        }

        match &decl.init {
            Some(init) => self.compile_expr(init)?,
            None => {
                // Default initialization by declared type
                match decl.var_type.as_ref() {
                    Some(ty) if ty.is_pointer => {
                        self.emit(Op::PushNull);
                    }
                    Some(ty) => match ty.base {
                        BaseType::Number | BaseType::Boolean => {
                            self.emit(Op::PushInt(0));
                        }
                        BaseType::Decimal => {
                            self.emit(Op::PushFloat(0.0));
                        }
                        BaseType::Letter => {
                            self.emit(Op::PushChar('\0'));
                        }
                        BaseType::Struct => {
                            let name = ty.struct_name.clone().unwrap_or_default();
                            if !self.program.structs.contains_key(&name) {
                                return Err(self.err(format!("Unknown struct type: {}", name)));
                            }
                            self.emit(Op::CreateStruct(name));
                        }
                        BaseType::Text | BaseType::Nothing | BaseType::File => {
                            self.emit(Op::PushNull);
                        }
                    },
                    None => {
                        self.emit(Op::PushNull);
                    }
                }
            }
        }

        self.emit(Op::StoreLocal(slot));
        Ok(())
    }

    fn compile_assignment(&mut self, target: &Expr, value: &Expr) -> Result<(), String> {
        self.compile_store_with(target, |c| c.compile_expr(value))
    }

    /// Dispatch on the target kind first, then let `produce` emit the code
    /// that leaves the stored value on top of the stack.
    fn compile_store_with<F>(&mut self, target: &Expr, produce: F) -> Result<(), String>
    where
        F: FnOnce(&mut Compiler) -> Result<(), String>,
    {
        match &target.kind {
            ExprKind::Ident(name) => {
                produce(self)?;
                let name = name.clone();
                self.store_var(&name);
            }
            ExprKind::Index { array, index } => {
                self.compile_expr(array)?;
                self.compile_expr(index)?;
                produce(self)?;
                self.emit(Op::ArraySet);
            }
            ExprKind::Member { object, field } => {
                self.compile_expr(object)?;
                produce(self)?;
                self.emit(Op::StructSet(field.clone()));
            }
            ExprKind::Deref(pointer) => {
                self.compile_expr(pointer)?;
                produce(self)?;
                self.emit(Op::StorePtr);
            }
            _ => return Err(self.err("Invalid assignment target")),
        }
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        then_body: &[Stmt],
        else_ifs: &[crate::ast::ElseIf],
        else_body: &[Stmt],
    ) -> Result<(), String> {
        self.compile_expr(condition)?;
        let jump_to_else = self.emit(Op::JumpIfFalse(0));

        for stmt in then_body {
            self.compile_statement(stmt)?;
        }

        if !else_ifs.is_empty() || !else_body.is_empty() {
            let mut end_jumps = vec![self.emit(Op::Jump(0))];
            self.patch_jump(jump_to_else);

            for clause in else_ifs {
                self.compile_expr(&clause.condition)?;
                let jump_to_next = self.emit(Op::JumpIfFalse(0));

                for stmt in &clause.body {
                    self.compile_statement(stmt)?;
                }

                end_jumps.push(self.emit(Op::Jump(0)));
                self.patch_jump(jump_to_next);
            }

            for stmt in else_body {
                self.compile_statement(stmt)?;
            }

            for jump in end_jumps {
                self.patch_jump(jump);
            }
        } else {
            self.patch_jump(jump_to_else);
        }
        Ok(())
    }

    fn compile_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), String> {
        let loop_start = self.here();
        self.loops.push(LoopContext::new(Some(loop_start)));

        self.compile_expr(condition)?;
        let loop_exit = self.emit(Op::JumpIfFalse(0));

        for stmt in body {
            self.compile_statement(stmt)?;
        }

        self.emit(Op::Jump(loop_start));
        self.patch_jump(loop_exit);

        self.close_loop();
        Ok(())
    }

    fn compile_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: i64,
        body: &[Stmt],
    ) -> Result<(), String> {
        let var_slot = self.declare_local(var);

        self.compile_expr(start)?;
        self.emit(Op::StoreLocal(var_slot));

        self.loops.push(LoopContext::new(None));

        let loop_start = self.here();
        self.emit(Op::LoadLocal(var_slot));
        self.compile_expr(end)?;
        if step > 0 {
            self.emit(Op::Le);
        } else {
            self.emit(Op::Ge);
        }
        let loop_exit = self.emit(Op::JumpIfFalse(0));

        for stmt in body {
            self.compile_statement(stmt)?;
        }

        // Continue lands on the increment so the loop always advances
        let increment = self.here();
        self.emit(Op::LoadLocal(var_slot));
        self.emit(Op::PushInt(1));
        if step > 0 {
            self.emit(Op::Add);
        } else {
            self.emit(Op::Sub);
        }
        self.emit(Op::StoreLocal(var_slot));

        self.emit(Op::Jump(loop_start));
        self.patch_jump(loop_exit);

        self.close_counted_loop(increment);
        Ok(())
    }

    fn compile_foreach(
        &mut self,
        var: &str,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<(), String> {
        let var_slot = self.declare_local(var);
        let index_slot = self.temp_slot();

        self.emit(Op::PushInt(0));
        self.emit(Op::StoreLocal(index_slot));

        self.compile_expr(iterable)?;
        let array_slot = self.temp_slot();
        self.emit(Op::StoreLocal(array_slot));

        self.loops.push(LoopContext::new(None));

        let loop_start = self.here();
        self.emit(Op::LoadLocal(index_slot));
        self.emit(Op::LoadLocal(array_slot));
        self.emit(Op::ArrayLength);
        self.emit(Op::Lt);
        let loop_exit = self.emit(Op::JumpIfFalse(0));

        self.emit(Op::LoadLocal(array_slot));
        self.emit(Op::LoadLocal(index_slot));
        self.emit(Op::ArrayGet);
        self.emit(Op::StoreLocal(var_slot));

        for stmt in body {
            self.compile_statement(stmt)?;
        }

        let increment = self.here();
        self.emit(Op::LoadLocal(index_slot));
        self.emit(Op::PushInt(1));
        self.emit(Op::Add);
        self.emit(Op::StoreLocal(index_slot));

        self.emit(Op::Jump(loop_start));
        self.patch_jump(loop_exit);

        self.close_counted_loop(increment);
        Ok(())
    }

    fn compile_repeat(&mut self, count: &Expr, body: &[Stmt]) -> Result<(), String> {
        let counter_slot = self.temp_slot();
        self.emit(Op::PushInt(0));
        self.emit(Op::StoreLocal(counter_slot));

        // The limit is evaluated exactly once
        self.compile_expr(count)?;
        let limit_slot = self.temp_slot();
        self.emit(Op::StoreLocal(limit_slot));

        self.loops.push(LoopContext::new(None));

        let loop_start = self.here();
        self.emit(Op::LoadLocal(counter_slot));
        self.emit(Op::LoadLocal(limit_slot));
        self.emit(Op::Lt);
        let loop_exit = self.emit(Op::JumpIfFalse(0));

        for stmt in body {
            self.compile_statement(stmt)?;
        }

        let increment = self.here();
        self.emit(Op::LoadLocal(counter_slot));
        self.emit(Op::PushInt(1));
        self.emit(Op::Add);
        self.emit(Op::StoreLocal(counter_slot));

        self.emit(Op::Jump(loop_start));
        self.patch_jump(loop_exit);

        self.close_counted_loop(increment);
        Ok(())
    }

    /// Pop the loop context and patch break jumps to the current position.
    fn close_loop(&mut self) {
        if let Some(ctx) = self.loops.pop() {
            for jump in ctx.break_jumps {
                self.patch_jump(jump);
            }
            debug_assert!(ctx.continue_jumps.is_empty());
        }
    }

    /// Like `close_loop`, but also patches continues to the increment index.
    fn close_counted_loop(&mut self, increment: usize) {
        if let Some(ctx) = self.loops.pop() {
            for jump in ctx.break_jumps {
                self.patch_jump(jump);
            }
            for jump in ctx.continue_jumps {
                self.patch_jump_to(jump, increment);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Compile an expression; exactly one value is left on the stack.
    fn compile_expr(&mut self, expr: &Expr) -> Result<(), String> {
        self.line = expr.line;

        match &expr.kind {
            ExprKind::Number(n) => {
                self.emit(Op::PushInt(*n));
            }
            ExprKind::Decimal(x) => {
                self.emit(Op::PushFloat(*x));
            }
            ExprKind::Str(s) => {
                self.program.add_constant(Constant::Str(s.clone()));
                self.emit(Op::PushString(s.clone()));
            }
            ExprKind::Char(c) => {
                self.emit(Op::PushChar(*c));
            }
            ExprKind::Bool(b) => {
                self.emit(Op::PushBool(*b));
            }
            ExprKind::Null => {
                self.emit(Op::PushNull);
            }
            ExprKind::Ident(name) => {
                let name = name.clone();
                self.load_var(&name);
            }
            ExprKind::Binary { op, left, right } => self.compile_binary(*op, left, right)?,
            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op {
                    UnOp::Neg => self.emit(Op::Neg),
                    UnOp::Not => self.emit(Op::Not),
                };
            }
            ExprKind::Call { name, args } => self.compile_call(name, args)?,
            ExprKind::Index { array, index } => {
                self.compile_expr(array)?;
                self.compile_expr(index)?;
                self.emit(Op::ArrayGet);
            }
            ExprKind::Member { object, field } => {
                self.compile_expr(object)?;
                self.emit(Op::StructGet(field.clone()));
            }
            ExprKind::AddressOf(operand) => match &operand.kind {
                ExprKind::Ident(name) => {
                    let target = match self.locals.get(name) {
                        Some(&slot) => AddressTarget::Local(slot),
                        None => AddressTarget::Global(name.clone()),
                    };
                    self.emit(Op::AddressOf(target));
                }
                _ => return Err(self.err("Can only take the address of a variable")),
            },
            ExprKind::Deref(operand) => {
                self.compile_expr(operand)?;
                self.emit(Op::LoadPtr);
            }
            ExprKind::ArrayLit(elements) => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(Op::ArrayLiteral(elements.len()));
            }
            ExprKind::Allocate { count, ty } => {
                self.compile_expr(count)?;
                self.emit(Op::Alloc(ty.type_string()));
            }
            ExprKind::Random { min, max } => {
                self.compile_expr(min)?;
                self.compile_expr(max)?;
                self.emit(Op::Random);
            }
            ExprKind::WindowShouldClose => {
                self.emit(Op::Call("__window_should_close__".to_string(), 0));
            }
            ExprKind::MouseX => {
                self.emit(Op::Call("__mouse_x__".to_string(), 0));
            }
            ExprKind::MouseY => {
                self.emit(Op::Call("__mouse_y__".to_string(), 0));
            }
            ExprKind::MousePressed => {
                self.emit(Op::Call("__mouse_pressed__".to_string(), 0));
            }
        }
        Ok(())
    }

    fn compile_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<(), String> {
        // Short-circuit forms: after either path a single truthy/falsy value
        // remains on top of the stack.
        if op == BinOp::And {
            self.compile_expr(left)?;
            self.emit(Op::Dup);
            let jump_false = self.emit(Op::JumpIfFalse(0));
            self.emit(Op::Pop);
            self.compile_expr(right)?;
            self.patch_jump(jump_false);
            return Ok(());
        }
        if op == BinOp::Or {
            self.compile_expr(left)?;
            self.emit(Op::Dup);
            let jump_true = self.emit(Op::JumpIfTrue(0));
            self.emit(Op::Pop);
            self.compile_expr(right)?;
            self.patch_jump(jump_true);
            return Ok(());
        }

        self.compile_expr(left)?;
        self.compile_expr(right)?;
        self.emit(match op {
            BinOp::Add => Op::Add,
            BinOp::Sub => Op::Sub,
            BinOp::Mul => Op::Mul,
            BinOp::Div => Op::Div,
            BinOp::Mod => Op::Mod,
            BinOp::Eq => Op::Eq,
            BinOp::Ne => Op::Ne,
            BinOp::Lt => Op::Lt,
            BinOp::Le => Op::Le,
            BinOp::Gt => Op::Gt,
            BinOp::Ge => Op::Ge,
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        });
        Ok(())
    }

    fn compile_call(&mut self, name: &str, args: &[Expr]) -> Result<(), String> {
        match name {
            // Math and length intrinsics lower to dedicated opcodes
            "__len__" => {
                match args.first() {
                    Some(arg) => {
                        self.compile_expr(arg)?;
                        self.emit(Op::ArrayLength);
                    }
                    None => {
                        self.emit(Op::PushInt(0));
                    }
                }
                Ok(())
            }
            "sqrt" => {
                let arg = args
                    .first()
                    .ok_or_else(|| self.err("sqrt expects a value"))?;
                self.compile_expr(arg)?;
                self.emit(Op::Sqrt);
                Ok(())
            }
            "abs" => {
                let arg = args
                    .first()
                    .ok_or_else(|| self.err("abs expects a value"))?;
                self.compile_expr(arg)?;
                self.emit(Op::Abs);
                Ok(())
            }
            "pow" => {
                if args.len() != 2 {
                    return Err(self.err("pow expects a base and an exponent"));
                }
                self.compile_expr(&args[0])?;
                self.compile_expr(&args[1])?;
                self.emit(Op::Pow);
                Ok(())
            }
            "strstr" => {
                if args.len() != 2 {
                    return Err(self.err("contains expects two values"));
                }
                self.compile_expr(&args[0])?;
                self.compile_expr(&args[1])?;
                self.emit(Op::Call("__strstr__".to_string(), 2));
                Ok(())
            }
            "fclose" => {
                let arg = args
                    .first()
                    .ok_or_else(|| self.err("close expects a file"))?;
                self.compile_expr(arg)?;
                self.emit(Op::Call("__close_file__".to_string(), 1));
                Ok(())
            }
            "__has_line__" => {
                let arg = args
                    .first()
                    .ok_or_else(|| self.err("expected a file"))?;
                self.compile_expr(arg)?;
                self.emit(Op::Call("__has_line__".to_string(), 1));
                Ok(())
            }
            "__read_line__" => {
                // The call's value is the line read; when an `into` target
                // was given the value is also stored there.
                let file = args
                    .first()
                    .ok_or_else(|| self.err("expected a file"))?;
                self.compile_expr(file)?;
                self.emit(Op::Call("__read_line__".to_string(), 1));
                if let Some(target) = args.get(1) {
                    if let ExprKind::Ident(name) = &target.kind {
                        let name = name.clone();
                        self.emit(Op::Dup);
                        self.store_var(&name);
                    }
                }
                Ok(())
            }
            _ => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Op::Call(name.to_string(), args.len()));
                Ok(())
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
