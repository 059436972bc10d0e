use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    pub fn from_source(src: &str) -> ParseResult<Self> {
        let mut lex = Lexer::new(src);
        let mut tokens = Vec::new();
        loop {
            match lex.next_token() {
                Ok(tok) => {
                    if tok.kind == TokenKind::Eof { tokens.push(tok); break; }
                    tokens.push(tok);
                }
                Err(e) => return Err(ParseError { kind: ParseErrorKind::FromLex(format!("{}", e)), pos: e.pos }),
            }
        }
        Ok(Self { tokens, idx: 0 })
    }

    pub fn parse_compile_unit(&mut self) -> ParseResult<CompileUnit> {
        let mut items = Vec::new();
        while !self.is(TokenKind::Eof) {
            items.push(self.parse_item()?);
        }
        Ok(CompileUnit { items })
    }

    fn cur(&self) -> &Token { &self.tokens[self.idx] }
    fn is(&self, kind: TokenKind) -> bool { self.cur().kind == kind }
    fn peek_kind(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.idx + ahead).map(|t| &t.kind)
    }

    fn bump(&mut self) { if self.idx < self.tokens.len() - 1 { self.idx += 1; } }

    fn expect(&mut self, expected: TokenKind) -> ParseResult<Token> {
        if self.cur().kind == expected { let t = self.cur().clone(); self.bump(); Ok(t) } else {
            Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected: Self::kind_name(&expected),
                    found: Self::kind_name(&self.cur().kind),
                },
                pos: self.cur().pos,
            })
        }
    }

    fn unexpected<T>(&self, expected: &'static str) -> ParseResult<T> {
        Err(ParseError {
            kind: ParseErrorKind::UnexpectedToken { expected, found: Self::kind_name(&self.cur().kind) },
            pos: self.cur().pos,
        })
    }

    fn kind_name(k: &TokenKind) -> &'static str {
        use TokenKind::*;
        match k {
            Ident(_) => "identifier",
            Int(_) => "integer",
            If => "if",
            Else => "else",
            While => "while",
            Break => "break",
            Continue => "continue",
            Return => "return",
            True => "true",
            False => "false",
            IntKw => "int",
            VoidKw => "void",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            EqEq => "==",
            NotEq => "!=",
            AmpAmp => "&&",
            PipePipe => "||",
            Not => "!",
            Assign => "=",
            Semicolon => ";",
            Comma => ",",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            Eof => "eof",
        }
    }

    fn parse_type_spec(&mut self) -> ParseResult<TypeSpec> {
        match self.cur().kind {
            TokenKind::IntKw => { self.bump(); Ok(TypeSpec::Int) }
            TokenKind::VoidKw => { self.bump(); Ok(TypeSpec::Void) }
            _ => self.unexpected("type name"),
        }
    }

    // item := type ident ( func-def | global-decl )
    fn parse_item(&mut self) -> ParseResult<Item> {
        let pos = self.cur().pos;
        let ty = self.parse_type_spec()?;
        let name = self.parse_ident()?;
        if self.is(TokenKind::LParen) {
            let params = self.parse_formal_params()?;
            let body = self.parse_block()?;
            Ok(Item::Func(FuncDef { ret_type: ty, name, params, body, pos }))
        } else {
            // global declarations carry the int type only
            if ty != TypeSpec::Int { return self.unexpected("("); }
            let decl = self.parse_decl_tail(ty, name, pos)?;
            Ok(Item::Decl(decl))
        }
    }

    fn parse_ident(&mut self) -> ParseResult<String> {
        match &self.cur().kind {
            TokenKind::Ident(s) => { let name = s.clone(); self.bump(); Ok(name) }
            _ => self.unexpected("identifier"),
        }
    }

    fn parse_formal_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.is(TokenKind::RParen) {
            loop {
                let pos = self.cur().pos;
                self.expect(TokenKind::IntKw)?;
                let name = self.parse_ident()?;
                params.push(Param { ty: TypeSpec::Int, name, pos });
                if self.is(TokenKind::Comma) { self.bump(); continue; }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let pos = self.expect(TokenKind::LBrace)?.pos;
        let mut stmts = Vec::new();
        loop {
            if self.is(TokenKind::RBrace) { self.bump(); break; }
            if self.is(TokenKind::Eof) { return Err(ParseError { kind: ParseErrorKind::UnexpectedEof, pos }); }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Block { stmts, pos })
    }

    // decl := 'int' ident (',' ident)* ';', with the leading type and first
    // name already consumed by the caller
    fn parse_decl_tail(&mut self, ty: TypeSpec, first: String, pos: crate::token::Position) -> ParseResult<DeclStmt> {
        let mut decls = vec![VarDecl { ty, name: first, pos }];
        while self.is(TokenKind::Comma) {
            self.bump();
            let vpos = self.cur().pos;
            let name = self.parse_ident()?;
            decls.push(VarDecl { ty, name, pos: vpos });
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(DeclStmt { decls, pos })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match &self.cur().kind {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Break => {
                let pos = self.cur().pos;
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break(pos))
            }
            TokenKind::Continue => {
                let pos = self.cur().pos;
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue(pos))
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::IntKw => {
                let pos = self.cur().pos;
                let ty = self.parse_type_spec()?;
                let first = self.parse_ident()?;
                Ok(Stmt::Decl(self.parse_decl_tail(ty, first, pos)?))
            }
            TokenKind::Semicolon => {
                let pos = self.cur().pos;
                self.bump();
                Ok(Stmt::Empty(pos))
            }
            TokenKind::Ident(_) if self.peek_kind(1) == Some(&TokenKind::Assign) => self.parse_assign_stmt(),
            _ => {
                let e = self.parse_expr()?;
                let pos = e.pos();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::ExprStmt(e, pos))
            }
        }
    }

    fn parse_assign_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cur().pos;
        let target = self.parse_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Assign { target, value, pos })
    }

    fn parse_return_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cur().pos;
        self.bump();
        if self.is(TokenKind::Semicolon) {
            self.bump();
            Ok(Stmt::Return(None, pos))
        } else {
            let e = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            Ok(Stmt::Return(Some(e), pos))
        }
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cur().pos;
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.is(TokenKind::Else) {
            self.bump();
            Some(Box::new(self.parse_stmt()?))
        } else { None };
        Ok(Stmt::If { cond, then_branch, else_branch, pos })
    }

    fn parse_while_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.cur().pos;
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body, pos })
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> { self.parse_logical_or() }

    fn parse_logical_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_logical_and()?;
        while self.is(TokenKind::PipePipe) {
            let pos = left.pos();
            self.bump();
            let right = self.parse_logical_and()?;
            left = Expr::Binary { op: BinOp::Or, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.is(TokenKind::AmpAmp) {
            let pos = left.pos();
            self.bump();
            let right = self.parse_equality()?;
            left = Expr::Binary { op: BinOp::And, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            let pos = left.pos();
            self.bump();
            let right = self.parse_relational()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_add_sub()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let pos = left.pos();
            self.bump();
            let right = self.parse_add_sub()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_add_sub(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_mul_div()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = left.pos();
            self.bump();
            let right = self.parse_mul_div()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_mul_div(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cur().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let pos = left.pos();
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), pos };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.cur().kind {
            TokenKind::Minus => {
                let pos = self.cur().pos;
                self.bump();
                let e = self.parse_unary()?;
                Ok(Expr::Unary { op: UnOp::Neg, expr: Box::new(e), pos })
            }
            TokenKind::Not => {
                let pos = self.cur().pos;
                self.bump();
                let e = self.parse_unary()?;
                Ok(Expr::Unary { op: UnOp::Not, expr: Box::new(e), pos })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match &self.cur().kind {
            TokenKind::Int(v) => {
                let pos = self.cur().pos;
                let val = *v;
                self.bump();
                Ok(Expr::IntLit(val, pos))
            }
            // the AST has no boolean-literal node; true/false are 1/0
            TokenKind::True => { let pos = self.cur().pos; self.bump(); Ok(Expr::IntLit(1, pos)) }
            TokenKind::False => { let pos = self.cur().pos; self.bump(); Ok(Expr::IntLit(0, pos)) }
            TokenKind::Ident(name) => {
                let pos = self.cur().pos;
                let n = name.clone();
                self.bump();
                if self.is(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name: n, args, pos })
                } else {
                    Ok(Expr::Var(n, pos))
                }
            }
            TokenKind::LParen => {
                self.bump();
                let e = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            _ => self.unexpected("expression"),
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.is(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.is(TokenKind::Comma) { self.bump(); continue; }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }
}
