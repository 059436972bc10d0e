use crate::ast::{BinOp, Block, CompileUnit, DeclStmt, Expr, FuncDef, Item, Stmt, UnOp};
use crate::error::{SemanticError, SemanticErrorKind, SemanticResult};
use crate::ir::{BinaryOp, FuncId, Instr, Label, Module, UnaryOp, ValueId};
use crate::token::Position;
use crate::types::Type;

/// Labels of the innermost enclosing loop; `continue` jumps to `entry`,
/// `break` to `exit`.
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    pub entry: Label,
    pub body: Label,
    pub exit: Label,
}

/// Tree-directed translator from the AST to linear IR.
///
/// One depth-first traversal per translation unit. Expression handlers
/// append into a caller-supplied instruction buffer and hand back the value
/// holding the sub-expression's result; statement handlers append only.
/// Any semantic error aborts the whole translation.
pub struct IrGenerator {
    module: Module,
    loops: Vec<LoopContext>,
    next_label: u32,
}

impl IrGenerator {
    pub fn new() -> Self {
        Self { module: Module::new(), loops: Vec::new(), next_label: 0 }
    }

    pub fn run(mut self, unit: &CompileUnit) -> SemanticResult<Module> {
        self.module.set_current_function(None);
        for item in &unit.items {
            match item {
                Item::Func(func) => self.gen_function(func)?,
                Item::Decl(decl) => self.gen_global_decl(decl),
            }
        }
        Ok(self.module)
    }

    fn fresh_label(&mut self) -> Label {
        let l = Label(self.next_label);
        self.next_label += 1;
        l
    }

    fn err<T>(&self, kind: SemanticErrorKind, pos: Position) -> SemanticResult<T> {
        Err(SemanticError::new(kind, pos))
    }

    fn gen_global_decl(&mut self, decl: &DeclStmt) {
        for var in &decl.decls {
            self.module.new_var_value(Type::from(var.ty), &var.name);
        }
    }

    fn gen_function(&mut self, func: &FuncDef) -> SemanticResult<()> {
        if self.module.current_function().is_some() {
            return self.err(SemanticErrorKind::NestedFunction { name: func.name.clone() }, func.pos);
        }

        // labels are scoped per function
        self.next_label = 0;
        let exit_label = self.fresh_label();

        let ret_type = Type::from(func.ret_type);
        let fid = match self.module.new_function(&func.name, ret_type, exit_label) {
            Some(fid) => fid,
            None => return self.err(SemanticErrorKind::DuplicateFunction { name: func.name.clone() }, func.pos),
        };
        self.module.set_current_function(Some(fid));
        self.module.enter_scope();

        let mut code = vec![Instr::Entry];

        // Each formal gets a local copy bound in the function scope; the
        // moves sit between Entry and the body.
        for param in &func.params {
            let pty = Type::from(param.ty);
            let formal = self.module.new_formal_value(pty, &param.name);
            self.module.func_mut(fid).params.push(formal);
            let local = self.module.new_var_value(pty, &param.name);
            code.push(Instr::Move { dst: local, src: formal });
        }

        let ret_slot = if ret_type.is_void() { None } else { Some(self.module.new_ret_value(ret_type)) };
        self.module.func_mut(fid).return_value = ret_slot;

        // The function scope is already open, so the body block must not
        // push another frame.
        self.gen_block_stmts(&func.body, &mut code, fid)?;

        code.push(Instr::Label(exit_label));
        code.push(Instr::Exit(ret_slot));
        self.module.func_mut(fid).code = code;

        self.module.set_current_function(None);
        self.module.leave_scope();
        Ok(())
    }

    fn gen_block_stmts(&mut self, block: &Block, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<()> {
        for stmt in &block.stmts {
            self.gen_stmt(stmt, code, fid)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<()> {
        match stmt {
            Stmt::Decl(decl) => {
                // declarations bind values; they emit no instructions
                for var in &decl.decls {
                    self.module.new_var_value(Type::from(var.ty), &var.name);
                }
                Ok(())
            }
            Stmt::Assign { target, value, pos } => self.gen_assign(target, value, *pos, code, fid),
            Stmt::ExprStmt(expr, _) => {
                self.gen_expr(expr, code, fid)?;
                Ok(())
            }
            Stmt::Return(expr, _) => self.gen_return(expr.as_ref(), code, fid),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                self.gen_if(cond, then_branch, else_branch.as_deref(), code, fid)
            }
            Stmt::While { cond, body, .. } => self.gen_while(cond, body, code, fid),
            Stmt::Break(pos) => match self.loops.last() {
                Some(ctx) => {
                    code.push(Instr::Goto(ctx.exit));
                    Ok(())
                }
                None => self.err(SemanticErrorKind::BreakOutsideLoop, *pos),
            },
            Stmt::Continue(pos) => match self.loops.last() {
                Some(ctx) => {
                    code.push(Instr::Goto(ctx.entry));
                    Ok(())
                }
                None => self.err(SemanticErrorKind::ContinueOutsideLoop, *pos),
            },
            Stmt::Block(block) => {
                self.module.enter_scope();
                let result = self.gen_block_stmts(block, code, fid);
                self.module.leave_scope();
                result
            }
            Stmt::Empty(_) => Ok(()),
        }
    }

    // Side effects of the right-hand side come first, then the target
    // resolution, then the move.
    fn gen_assign(
        &mut self,
        target: &str,
        value: &Expr,
        pos: Position,
        code: &mut Vec<Instr>,
        fid: FuncId,
    ) -> SemanticResult<()> {
        let src = self.gen_operand(value, code, fid)?;
        let dst = match self.module.find_var_value(target) {
            Some(id) => id,
            None => {
                return self.err(SemanticErrorKind::UnresolvedIdentifier { name: target.to_string() }, pos);
            }
        };
        code.push(Instr::Move { dst, src });
        Ok(())
    }

    fn gen_return(&mut self, expr: Option<&Expr>, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<()> {
        if let Some(expr) = expr {
            let value = self.gen_operand(expr, code, fid)?;
            if let Some(slot) = self.module.func(fid).return_value {
                code.push(Instr::Move { dst: slot, src: value });
            }
        }
        // always jump to the function exit, even right after another
        // unconditional transfer
        code.push(Instr::Goto(self.module.func(fid).exit_label));
        Ok(())
    }

    fn gen_if(
        &mut self,
        cond: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
        code: &mut Vec<Instr>,
        fid: FuncId,
    ) -> SemanticResult<()> {
        let true_label = self.fresh_label();
        let false_label = self.fresh_label();
        let end_label = self.fresh_label();

        let cond_value = self.gen_operand(cond, code, fid)?;
        code.push(Instr::BranchFalse { cond: cond_value, target: false_label });

        code.push(Instr::Label(true_label));
        self.gen_stmt(then_branch, code, fid)?;
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(false_label));
        if let Some(else_branch) = else_branch {
            self.gen_stmt(else_branch, code, fid)?;
        }
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(end_label));
        Ok(())
    }

    fn gen_while(&mut self, cond: &Expr, body: &Stmt, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<()> {
        let entry = self.fresh_label();
        let body_label = self.fresh_label();
        let exit = self.fresh_label();

        self.loops.push(LoopContext { entry, body: body_label, exit });
        let result = self.gen_loop_parts(cond, body, code, fid, entry, body_label, exit);
        self.loops.pop();
        result
    }

    fn gen_loop_parts(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        code: &mut Vec<Instr>,
        fid: FuncId,
        entry: Label,
        body_label: Label,
        exit: Label,
    ) -> SemanticResult<()> {
        code.push(Instr::Label(entry));
        let cond_value = self.gen_operand(cond, code, fid)?;
        code.push(Instr::BranchTrue { cond: cond_value, target: body_label });
        // a false condition falls through to the exit label
        code.push(Instr::Label(exit));
        code.push(Instr::Label(body_label));
        self.gen_stmt(body, code, fid)?;
        code.push(Instr::Goto(entry));
        Ok(())
    }

    /// Lowers an expression; `None` means the expression produced no value
    /// (a call to a void function).
    fn gen_expr(&mut self, expr: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<Option<ValueId>> {
        match expr {
            Expr::IntLit(v, _) => Ok(Some(self.module.new_const_int(*v as i32))),
            Expr::Var(name, pos) => match self.module.find_var_value(name) {
                Some(id) => Ok(Some(id)),
                None => self.err(SemanticErrorKind::UnresolvedIdentifier { name: name.clone() }, *pos),
            },
            Expr::Call { name, args, pos } => self.gen_call(name, args, *pos, code, fid),
            Expr::Binary { op: BinOp::And, left, right, .. } => {
                self.gen_and(left, right, code, fid).map(Some)
            }
            Expr::Binary { op: BinOp::Or, left, right, .. } => {
                self.gen_or(left, right, code, fid).map(Some)
            }
            Expr::Binary { op, left, right, .. } => self.gen_binary(*op, left, right, code, fid).map(Some),
            Expr::Unary { op: UnOp::Neg, expr, .. } => self.gen_neg(expr, code, fid).map(Some),
            Expr::Unary { op: UnOp::Not, expr, .. } => self.gen_not(expr, code, fid).map(Some),
        }
    }

    /// Like [`gen_expr`](Self::gen_expr) but the caller consumes the value,
    /// so a void result is a semantic error.
    fn gen_operand(&mut self, expr: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<ValueId> {
        let pos = expr.pos();
        match self.gen_expr(expr, code, fid)? {
            Some(id) => Ok(id),
            None => self.err(SemanticErrorKind::VoidValue, pos),
        }
    }

    fn gen_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        code: &mut Vec<Instr>,
        fid: FuncId,
    ) -> SemanticResult<ValueId> {
        let opcode = match op {
            BinOp::Add => BinaryOp::Add,
            BinOp::Sub => BinaryOp::Sub,
            BinOp::Mul => BinaryOp::Mul,
            BinOp::Div => BinaryOp::Div,
            BinOp::Mod => BinaryOp::Mod,
            BinOp::Eq => BinaryOp::Eq,
            BinOp::Ne => BinaryOp::Ne,
            BinOp::Lt => BinaryOp::Lt,
            BinOp::Le => BinaryOp::Le,
            BinOp::Gt => BinaryOp::Gt,
            BinOp::Ge => BinaryOp::Ge,
            BinOp::And | BinOp::Or => unreachable!("short-circuit operators have their own handlers"),
        };
        let lhs = self.gen_operand(left, code, fid)?;
        let rhs = self.gen_operand(right, code, fid)?;
        let dst = self.module.new_temp_value(opcode.result_type());
        code.push(Instr::Binary { op: opcode, dst, lhs, rhs });
        Ok(dst)
    }

    fn gen_neg(&mut self, operand: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<ValueId> {
        let src = self.gen_operand(operand, code, fid)?;
        let dst = self.module.new_temp_value(Type::Int);
        code.push(Instr::Unary { op: UnaryOp::Neg, dst, src });
        Ok(dst)
    }

    // In value position `!e` materializes as `e == 0`.
    fn gen_not(&mut self, operand: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<ValueId> {
        let src = self.gen_operand(operand, code, fid)?;
        let zero = self.module.new_const_int(0);
        let dst = self.module.new_temp_value(Type::Bool);
        code.push(Instr::Binary { op: BinaryOp::Eq, dst, lhs: src, rhs: zero });
        Ok(dst)
    }

    // Short-circuit and: the right operand only runs when the left one was
    // non-zero, and the 0/1 result lands in a fresh local.
    fn gen_and(&mut self, left: &Expr, right: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<ValueId> {
        let true_label = self.fresh_label();
        let false_label = self.fresh_label();
        let end_label = self.fresh_label();

        let left_value = self.gen_operand(left, code, fid)?;
        code.push(Instr::BranchFalse { cond: left_value, target: false_label });
        let right_value = self.gen_operand(right, code, fid)?;
        code.push(Instr::BranchFalse { cond: right_value, target: false_label });

        let result = self.module.new_local_value(Type::Int);
        let one = self.module.new_const_int(1);
        let zero = self.module.new_const_int(0);

        code.push(Instr::Label(true_label));
        code.push(Instr::Move { dst: result, src: one });
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(false_label));
        code.push(Instr::Move { dst: result, src: zero });
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(end_label));
        Ok(result)
    }

    // Mirror image of gen_and.
    fn gen_or(&mut self, left: &Expr, right: &Expr, code: &mut Vec<Instr>, fid: FuncId) -> SemanticResult<ValueId> {
        let true_label = self.fresh_label();
        let false_label = self.fresh_label();
        let end_label = self.fresh_label();

        let left_value = self.gen_operand(left, code, fid)?;
        code.push(Instr::BranchTrue { cond: left_value, target: true_label });
        let right_value = self.gen_operand(right, code, fid)?;
        code.push(Instr::BranchTrue { cond: right_value, target: true_label });

        let result = self.module.new_local_value(Type::Int);
        let one = self.module.new_const_int(1);
        let zero = self.module.new_const_int(0);

        code.push(Instr::Label(false_label));
        code.push(Instr::Move { dst: result, src: zero });
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(true_label));
        code.push(Instr::Move { dst: result, src: one });
        code.push(Instr::Goto(end_label));

        code.push(Instr::Label(end_label));
        Ok(result)
    }

    fn gen_call(
        &mut self,
        name: &str,
        args: &[Expr],
        pos: Position,
        code: &mut Vec<Instr>,
        fid: FuncId,
    ) -> SemanticResult<Option<ValueId>> {
        // functions must be defined before use
        let callee = match self.module.find_function(name) {
            Some(id) => id,
            None => return self.err(SemanticErrorKind::UndefinedFunction { name: name.to_string() }, pos),
        };

        {
            let current = self.module.func_mut(fid);
            current.exist_func_call = true;
            current.max_call_args = current.max_call_args.max(args.len());
        }

        // arguments evaluate left to right
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.gen_operand(arg, code, fid)?);
        }

        let expected = self.module.func(callee).params.len();
        if arg_values.len() != expected {
            return self.err(
                SemanticErrorKind::ArityMismatch { name: name.to_string(), expected, got: arg_values.len() },
                pos,
            );
        }

        let ret_type = self.module.func(callee).return_type;
        let dst = if ret_type.is_void() { None } else { Some(self.module.new_temp_value(ret_type)) };
        code.push(Instr::Call { dst, callee, args: arg_values });
        Ok(dst)
    }
}

impl Default for IrGenerator {
    fn default() -> Self { Self::new() }
}

/// Translates a compile unit into a module of linear IR.
pub fn generate(unit: &CompileUnit) -> SemanticResult<Module> {
    IrGenerator::new().run(unit)
}
