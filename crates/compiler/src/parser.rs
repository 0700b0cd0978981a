//! Recursive-descent parser for Zinc.
//!
//! Single pass, one-token lookahead. Every syntactic mismatch is a fatal,
//! line-annotated error. The flexible English phrasing means most statement
//! forms dispatch on their leading keyword token.

use crate::ast::{
    BaseType, BinOp, ElseIf, Expr, ExprKind, FileMode, FunctionDef, Include, InputKind, Program,
    Stmt, StmtKind, StructDef, TypeSpec, UnOp, VarDecl,
};
use crate::lexer::{tokenize, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Line of the most recently consumed token.
    line: usize,
}

const TYPE_START: &[TokenKind] = &[
    TokenKind::Number,
    TokenKind::Decimal,
    TokenKind::Text,
    TokenKind::Letter,
    TokenKind::YesOrNo,
    TokenKind::Boolean,
    TokenKind::PointerTo,
    TokenKind::ListOf,
];

/// Token kinds that mark an identifier as a call *argument* rather than part
/// of the callee name: anything that ends or continues an enclosing
/// expression.
const ARG_FOLLOWERS: &[TokenKind] = &[
    TokenKind::And,
    TokenKind::Comma,
    TokenKind::Newline,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Times,
    TokenKind::DividedBy,
    TokenKind::Modulo,
    TokenKind::Eof,
    TokenKind::End,
    TokenKind::Then,
    TokenKind::Colon,
    TokenKind::GreaterThan,
    TokenKind::LessThan,
    TokenKind::Equals,
    TokenKind::SameAs,
    TokenKind::NotEqualTo,
    TokenKind::AtLeast,
    TokenKind::AtMost,
];

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        // The lexer always terminates the stream with EOF; guarantee it for
        // hand-built token vectors too.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                line,
                column: 1,
            });
        }
        Parser {
            tokens,
            pos: 0,
            line: 1,
        }
    }

    fn error(&self, msg: &str) -> String {
        let token = self.current();
        format!(
            "Parse error at line {}: {} (got {:?}: {:?})",
            token.line, msg, token.kind, token.value
        )
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("token stream always ends in EOF")
        })
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or_else(|| {
            self.tokens.last().expect("token stream always ends in EOF")
        })
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.line = token.line;
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, String> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&format!("Expected {:?}", kind)))
        }
    }

    fn expect_any(&mut self, kinds: &[TokenKind]) -> Result<Token, String> {
        if self.check_any(kinds) {
            Ok(self.advance())
        } else {
            let expected: Vec<String> = kinds.iter().map(|k| format!("{:?}", k)).collect();
            Err(self.error(&format!("Expected {}", expected.join(" or "))))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_optional(&mut self, kinds: &[TokenKind]) {
        while self.check_any(kinds) {
            self.advance();
        }
    }

    pub fn parse(&mut self) -> Result<Program, String> {
        let mut program = Program::default();

        self.skip_newlines();
        while !self.check(TokenKind::Eof) {
            self.skip_newlines();
            if self.check(TokenKind::Eof) {
                break;
            }

            match self.current().kind {
                TokenKind::Include | TokenKind::Use => {
                    program.includes.push(self.parse_include()?);
                }
                TokenKind::Define => {
                    program.structs.push(self.parse_struct()?);
                }
                TokenKind::To => {
                    program.functions.push(self.parse_function()?);
                }
                TokenKind::Note | TokenKind::Notes | TokenKind::Reminder => {
                    self.parse_comment();
                }
                _ => return Err(self.error("Unexpected token at top level")),
            }

            self.skip_newlines();
        }

        Ok(program)
    }

    fn parse_include(&mut self) -> Result<Include, String> {
        let line = self.current().line;
        self.advance(); // include / use

        let library = match self.current().kind {
            TokenKind::StandardIo => {
                self.advance();
                "stdio".to_string()
            }
            TokenKind::StandardMath => {
                self.advance();
                "math".to_string()
            }
            TokenKind::StringFunctions => {
                self.advance();
                "string".to_string()
            }
            // FILE is part of stdio
            TokenKind::FileFunctions => {
                self.advance();
                "stdio".to_string()
            }
            TokenKind::RandomFunctions => {
                self.advance();
                "stdlib".to_string()
            }
            TokenKind::RaylibGraphics => {
                self.advance();
                "raylib".to_string()
            }
            TokenKind::FileCalled => {
                self.advance();
                self.expect_any(&[TokenKind::StringLiteral, TokenKind::Identifier])?
                    .value
            }
            TokenKind::The => {
                self.advance();
                if self.check(TokenKind::FileCalled) {
                    self.advance();
                    self.expect_any(&[TokenKind::StringLiteral, TokenKind::Identifier])?
                        .value
                } else {
                    return Err(self.error("Expected library name after include"));
                }
            }
            _ => return Err(self.error("Expected library name after include")),
        };

        Ok(Include { library, line })
    }

    fn parse_struct(&mut self) -> Result<StructDef, String> {
        let line = self.current().line;
        self.advance(); // define

        self.skip_optional(&[TokenKind::A, TokenKind::An]);
        let name = self.expect(TokenKind::Identifier)?.value;

        self.expect(TokenKind::AsHaving)?;
        self.skip_optional(&[TokenKind::Colon]);
        self.skip_newlines();

        let mut fields = Vec::new();
        while !self.check_any(&[TokenKind::End, TokenKind::Eof]) {
            self.skip_newlines();
            if self.check(TokenKind::End) {
                break;
            }
            let field_type = self.parse_type();
            self.expect(TokenKind::Called)?;
            let field_name = self.expect(TokenKind::Identifier)?.value;
            fields.push(VarDecl::new(field_name, Some(field_type), self.line));
            self.skip_newlines();
        }

        self.expect(TokenKind::End)?;

        Ok(StructDef { name, fields, line })
    }

    fn parse_function(&mut self) -> Result<FunctionDef, String> {
        let line = self.current().line;
        self.advance(); // to

        if self.check(TokenKind::DoMain) {
            self.advance();
            self.skip_optional(&[TokenKind::Colon]);
            self.skip_newlines();
            let body = self.parse_block()?;
            return Ok(FunctionDef {
                name: "main".to_string(),
                params: Vec::new(),
                return_type: Some(TypeSpec::simple(BaseType::Number)),
                body,
                is_main: true,
                line,
            });
        }

        // Free-form name phrase with embedded typed parameters. Identifiers
        // and the connectives of/with/in become name words; articles are
        // dropped (call sites build names the same way).
        let mut name_parts: Vec<String> = Vec::new();
        let mut params = Vec::new();
        let mut return_type = None;

        while !self.check_any(&[
            TokenKind::Colon,
            TokenKind::AndReturn,
            TokenKind::Newline,
            TokenKind::Eof,
        ]) {
            if self.check_any(TYPE_START) {
                let param_type = self.parse_type();
                if self.check(TokenKind::Called) {
                    self.advance();
                }
                let param_name = self.expect(TokenKind::Identifier)?.value;
                params.push(VarDecl::new(param_name, Some(param_type), self.line));
                self.skip_optional(&[TokenKind::And, TokenKind::Comma]);
            } else if self.check(TokenKind::Identifier) {
                let next = self.peek(1).kind;
                if next == TokenKind::Called || next == TokenKind::PointerTo {
                    // Parameter with a struct type
                    let struct_name = self.advance().value;
                    let mut param_type = TypeSpec::simple(BaseType::Struct);
                    param_type.struct_name = Some(struct_name);
                    if self.check(TokenKind::PointerTo) {
                        self.advance();
                        param_type.is_pointer = true;
                    }
                    if self.check(TokenKind::Called) {
                        self.advance();
                    }
                    let param_name = self.expect(TokenKind::Identifier)?.value;
                    params.push(VarDecl::new(param_name, Some(param_type), self.line));
                    self.skip_optional(&[TokenKind::And, TokenKind::Comma]);
                } else {
                    name_parts.push(self.advance().value);
                }
            } else if self.check_any(&[TokenKind::With, TokenKind::Of, TokenKind::In]) {
                name_parts.push(self.advance().value);
            } else if self.check_any(&[TokenKind::The, TokenKind::A, TokenKind::An]) {
                self.advance();
            } else {
                // Other keywords in the phrase contribute nothing
                self.advance();
            }
        }

        if self.check(TokenKind::AndReturn) {
            self.advance();
            self.skip_optional(&[TokenKind::A, TokenKind::An]);
            return_type = Some(self.parse_type());
        }

        self.skip_optional(&[TokenKind::Colon]);
        self.skip_newlines();

        let name = if name_parts.is_empty() {
            "unnamed".to_string()
        } else {
            name_parts.join("_").to_lowercase()
        };

        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            is_main: false,
            line,
        })
    }

    fn parse_type(&mut self) -> TypeSpec {
        let mut spec = TypeSpec::simple(BaseType::Number);

        if self.check(TokenKind::PointerTo) {
            self.advance();
            spec.is_pointer = true;
            self.skip_optional(&[TokenKind::A, TokenKind::An]);
        }

        if self.check(TokenKind::ListOf) {
            self.advance();
            spec.is_array = true;
            if self.check(TokenKind::NumberLiteral) {
                spec.array_size = self.advance().value.parse().ok();
            }
        }

        match self.current().kind {
            TokenKind::Number => {
                self.advance();
            }
            TokenKind::Decimal => {
                self.advance();
                spec.base = BaseType::Decimal;
            }
            TokenKind::Text => {
                self.advance();
                spec.base = BaseType::Text;
            }
            TokenKind::Letter => {
                self.advance();
                spec.base = BaseType::Letter;
            }
            TokenKind::YesOrNo | TokenKind::Boolean => {
                self.advance();
                spec.base = BaseType::Boolean;
            }
            TokenKind::Nothing => {
                self.advance();
                spec.base = BaseType::Nothing;
            }
            TokenKind::Identifier => {
                spec.base = BaseType::Struct;
                spec.struct_name = Some(self.advance().value);
            }
            // Defaults to number
            _ => {}
        }

        spec
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, String> {
        let mut statements = Vec::new();

        while !self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
            self.skip_newlines();
            if self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
            self.skip_newlines();
        }

        if self.check(TokenKind::End) {
            self.advance();
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Option<Stmt>, String> {
        self.skip_newlines();

        let stmt = match self.current().kind {
            TokenKind::End | TokenKind::Otherwise | TokenKind::Eof => return Ok(None),
            TokenKind::ThereIs => self.parse_var_decl()?,
            TokenKind::Let => self.parse_let()?,
            TokenKind::Change | TokenKind::Set | TokenKind::Now | TokenKind::Make => {
                self.parse_assignment()?
            }
            TokenKind::Add => self.parse_add_statement()?,
            TokenKind::Subtract => self.parse_subtract_statement()?,
            TokenKind::Multiply => self.parse_compound_by(BinOp::Mul)?,
            TokenKind::Divide => self.parse_compound_by(BinOp::Div)?,
            TokenKind::Increase => self.parse_step_statement(BinOp::Add)?,
            TokenKind::Decrease => self.parse_step_statement(BinOp::Sub)?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While | TokenKind::KeepDoing => self.parse_while()?,
            TokenKind::ForEach => self.parse_for()?,
            TokenKind::Repeat => self.parse_repeat()?,
            TokenKind::Say | TokenKind::Print | TokenKind::Show | TokenKind::Display => {
                self.parse_print()?
            }
            TokenKind::AskUserFor | TokenKind::Read | TokenKind::GetInput => self.parse_input()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::StopTheLoop | TokenKind::LeaveTheLoop => {
                self.advance();
                Stmt::new(StmtKind::Break, self.line)
            }
            TokenKind::SkipToNext | TokenKind::ContinueNext => {
                self.advance();
                Stmt::new(StmtKind::Continue, self.line)
            }
            TokenKind::StopProgram => {
                self.advance();
                Stmt::new(
                    StmtKind::Return {
                        value: Some(Expr::number(1, self.line)),
                    },
                    self.line,
                )
            }
            TokenKind::Free => {
                let line = self.current().line;
                self.advance();
                let pointer = self.parse_expression()?;
                Stmt::new(StmtKind::Free { pointer }, line)
            }
            TokenKind::CloseFile => {
                let line = self.current().line;
                self.advance();
                let file = self.parse_primary()?;
                Stmt::new(
                    StmtKind::Expr(Expr::new(
                        ExprKind::Call {
                            name: "fclose".to_string(),
                            args: vec![file],
                        },
                        line,
                    )),
                    line,
                )
            }
            // GUI statements
            TokenKind::OpenWindow => self.parse_open_window()?,
            TokenKind::CloseWindow => {
                self.advance();
                Stmt::new(StmtKind::CloseWindow, self.line)
            }
            TokenKind::BeginDrawing => {
                self.advance();
                Stmt::new(StmtKind::BeginDrawing, self.line)
            }
            TokenKind::EndDrawing => {
                self.advance();
                Stmt::new(StmtKind::EndDrawing, self.line)
            }
            TokenKind::ClearScreen => self.parse_clear_screen()?,
            TokenKind::DrawRectangle => self.parse_draw_rectangle()?,
            TokenKind::DrawText => self.parse_draw_text()?,
            TokenKind::Note | TokenKind::Notes | TokenKind::Reminder => {
                self.parse_comment();
                return Ok(None);
            }
            TokenKind::Identifier => self.parse_identifier_statement()?,
            TokenKind::Number | TokenKind::Decimal | TokenKind::Text | TokenKind::Letter => {
                self.parse_typed_var_decl()?
            }
            _ => {
                let line = self.current().line;
                let expr = self.parse_expression()?;
                Stmt::new(StmtKind::Expr(expr), line)
            }
        };

        Ok(Some(stmt))
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        let opener = self.advance(); // there is / there is a / there is a file called

        // "there is a file called f ..." lexes the whole opener as one
        // phrase; "there is file called f" arrives word by word.
        let mut is_file = opener.value.contains("file");

        self.skip_optional(&[TokenKind::A, TokenKind::An]);
        if !is_file && self.current().value.to_lowercase() == "file" {
            self.advance();
            is_file = true;
        }

        if is_file {
            self.skip_optional(&[TokenKind::Called]);
            let name = self.expect(TokenKind::Identifier)?.value;

            let mut file_path = None;
            let mut file_mode = None;
            if self.check(TokenKind::Opens) {
                self.advance();
                file_path = Some(self.parse_expression()?);
                if self.check(TokenKind::ForReading) {
                    self.advance();
                    file_mode = Some(FileMode::Read);
                } else if self.check(TokenKind::ForWriting) {
                    self.advance();
                    file_mode = Some(FileMode::Write);
                }
            }

            let decl = VarDecl {
                name,
                var_type: Some(TypeSpec::simple(BaseType::File)),
                init: None,
                is_file: true,
                file_path,
                file_mode,
                line,
            };
            return Ok(Stmt::new(StmtKind::VarDecl(decl), line));
        }

        let var_type = self.parse_type();
        self.expect(TokenKind::Called)?;
        let name = self.expect(TokenKind::Identifier)?.value;

        let mut init = None;
        if self.check(TokenKind::WhichIs) {
            self.advance();
            init = Some(self.parse_expression()?);
        } else if self.check(TokenKind::Has) {
            self.advance();
            init = Some(self.parse_expression()?);
        } else if self.check(TokenKind::Containing) {
            self.advance();
            let mut elements = vec![self.parse_expression()?];
            while self.check(TokenKind::Comma) {
                self.advance();
                elements.push(self.parse_expression()?);
            }
            init = Some(Expr::new(ExprKind::ArrayLit(elements), line));
        }

        let decl = VarDecl {
            name,
            var_type: Some(var_type),
            init,
            is_file: false,
            file_path: None,
            file_mode: None,
            line,
        };
        Ok(Stmt::new(StmtKind::VarDecl(decl), line))
    }

    /// `number x is 5` — a declaration that leads with the type.
    fn parse_typed_var_decl(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        let var_type = self.parse_type();
        let name = self.expect(TokenKind::Identifier)?.value;

        let mut init = None;
        if self.check(TokenKind::Is) {
            self.advance();
            init = Some(self.parse_expression()?);
        }

        let mut decl = VarDecl::new(name, Some(var_type), line);
        decl.init = init;
        Ok(Stmt::new(StmtKind::VarDecl(decl), line))
    }

    fn parse_let(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // let

        let name = self.expect(TokenKind::Identifier)?.value;
        self.expect(TokenKind::Be)?;
        let value = self.parse_expression()?;

        let mut decl = VarDecl::new(name, None, line);
        decl.init = Some(value);
        Ok(Stmt::new(StmtKind::VarDecl(decl), line))
    }

    fn parse_assignment(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // change / set / now / make

        let target = self.parse_assignment_target()?;
        self.skip_optional(&[TokenKind::To, TokenKind::Is, TokenKind::EqualTo]);
        let value = self.parse_expression()?;

        Ok(Stmt::new(StmtKind::Assign { target, value }, line))
    }

    fn parse_assignment_target(&mut self) -> Result<Expr, String> {
        match self.current().kind {
            TokenKind::ItemNumber => {
                self.advance();
                let index = self.parse_expression()?;
                self.skip_optional(&[TokenKind::In]);
                let array = self.parse_primary()?;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    self.line,
                ))
            }
            TokenKind::FirstItemIn => {
                self.advance();
                let array = self.parse_primary()?;
                let line = self.line;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(Expr::number(0, line)),
                    },
                    line,
                ))
            }
            TokenKind::LastItemIn => {
                self.advance();
                let array = self.parse_primary()?;
                let line = self.line;
                // -1 is resolved to len-1 by the VM
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(Expr::number(-1, line)),
                    },
                    line,
                ))
            }
            TokenKind::ValueAt => {
                self.advance();
                let ptr = self.parse_primary()?;
                self.skip_optional(&[TokenKind::PointsTo]);
                Ok(Expr::new(ExprKind::Deref(Box::new(ptr)), self.line))
            }
            TokenKind::The => {
                self.advance();
                self.parse_assignment_target()
            }
            _ => {
                let target = self.parse_primary()?;
                if self.check(TokenKind::ApostropheS) {
                    self.advance();
                    let field = self.expect(TokenKind::Identifier)?.value;
                    return Ok(Expr::new(
                        ExprKind::Member {
                            object: Box::new(target),
                            field,
                        },
                        self.line,
                    ));
                }
                Ok(target)
            }
        }
    }

    /// `add <expr> to <target>`
    fn parse_add_statement(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // add

        let value = self.parse_expression()?;
        self.expect(TokenKind::To)?;
        let target = self.parse_primary()?;

        Ok(compound_assign(target, BinOp::Add, value, line))
    }

    /// `subtract <expr> from <target>`
    fn parse_subtract_statement(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // subtract

        let value = self.parse_expression()?;
        self.expect(TokenKind::From)?;
        let target = self.parse_primary()?;

        Ok(compound_assign(target, BinOp::Sub, value, line))
    }

    /// `multiply <target> by <expr>` / `divide <target> by <expr>`
    fn parse_compound_by(&mut self, op: BinOp) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // multiply / divide

        let target = self.parse_primary()?;
        self.skip_optional(&[TokenKind::Times]); // "by" lexes as the times word
        let value = self.parse_expression()?;

        Ok(compound_assign(target, op, value, line))
    }

    /// `increase <target>` / `decrease <target>`
    fn parse_step_statement(&mut self, op: BinOp) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // increase / decrease
        let target = self.parse_primary()?;
        let one = Expr::number(1, line);
        Ok(compound_assign(target, op, one, line))
    }

    fn parse_if(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // if

        let condition = self.parse_condition()?;
        self.expect(TokenKind::Then)?;
        self.skip_newlines();

        let mut then_body = Vec::new();
        let mut else_ifs = Vec::new();
        let mut else_body = Vec::new();

        while !self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
            self.skip_newlines();
            if self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
                break;
            }
            if let Some(stmt) = self.parse_statement()? {
                then_body.push(stmt);
            }
            self.skip_newlines();
        }

        while self.check(TokenKind::Otherwise) {
            self.advance();

            if self.check(TokenKind::If) {
                self.advance();
                let cond = self.parse_condition()?;
                self.expect(TokenKind::Then)?;
                self.skip_newlines();

                let mut body = Vec::new();
                while !self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
                    self.skip_newlines();
                    if self.check_any(&[TokenKind::End, TokenKind::Otherwise, TokenKind::Eof]) {
                        break;
                    }
                    if let Some(stmt) = self.parse_statement()? {
                        body.push(stmt);
                    }
                    self.skip_newlines();
                }

                else_ifs.push(ElseIf {
                    condition: cond,
                    body,
                });
            } else {
                self.skip_newlines();
                while !self.check_any(&[TokenKind::End, TokenKind::Eof]) {
                    self.skip_newlines();
                    if self.check_any(&[TokenKind::End, TokenKind::Eof]) {
                        break;
                    }
                    if let Some(stmt) = self.parse_statement()? {
                        else_body.push(stmt);
                    }
                    self.skip_newlines();
                }
                break;
            }
        }

        if self.check(TokenKind::End) {
            self.advance();
        }

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                else_ifs,
                else_body,
            },
            line,
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // while / keep doing this while

        let condition = self.parse_condition()?;
        self.skip_optional(&[TokenKind::Colon]);
        self.skip_newlines();

        let body = self.parse_block()?;

        Ok(Stmt::new(StmtKind::While { condition, body }, line))
    }

    fn parse_for(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // for each

        let var_type = self.parse_type();
        let var = self.expect(TokenKind::Identifier)?.value;

        if self.check(TokenKind::From) {
            self.advance();
            let start = self.parse_expression()?;

            let step = if self.check(TokenKind::DownTo) {
                self.advance();
                -1
            } else {
                self.expect(TokenKind::To)?;
                1
            };

            let end = self.parse_expression()?;
            self.skip_optional(&[TokenKind::Colon]);
            self.skip_newlines();

            let body = self.parse_block()?;

            Ok(Stmt::new(
                StmtKind::For {
                    var,
                    start,
                    end,
                    step,
                    body,
                },
                line,
            ))
        } else if self.check(TokenKind::In) {
            self.advance();
            self.skip_optional(&[TokenKind::The]);
            let iterable = self.parse_expression()?;
            self.skip_optional(&[TokenKind::Colon]);
            self.skip_newlines();

            let body = self.parse_block()?;

            Ok(Stmt::new(
                StmtKind::ForEach {
                    var,
                    var_type: Some(var_type),
                    iterable,
                    body,
                },
                line,
            ))
        } else {
            Err(self.error("Expected 'from' or 'in' in for loop"))
        }
    }

    fn parse_repeat(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // repeat

        // parse_primary keeps "times" from reading as multiplication
        let count = self.parse_primary()?;
        if self.check(TokenKind::Times) {
            self.advance();
        }
        self.skip_optional(&[TokenKind::Colon]);
        self.skip_newlines();

        let body = self.parse_block()?;

        Ok(Stmt::new(StmtKind::Repeat { count, body }, line))
    }

    fn parse_print(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // say / print / show / display

        if self.check(TokenKind::TheValueOf) {
            self.advance();
        }

        let mut parts = vec![self.parse_expression()?];
        while self.check_any(&[TokenKind::AndThen, TokenKind::FollowedBy, TokenKind::And]) {
            self.advance();
            if self.check(TokenKind::Then) {
                self.advance();
            }
            parts.push(self.parse_expression()?);
        }

        Ok(Stmt::new(StmtKind::Print { parts }, line))
    }

    fn parse_input(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;

        let (input_kind, target) = match self.current().kind {
            TokenKind::AskUserFor => {
                let phrase = self.advance().value.to_lowercase();
                let kind = input_kind_from_words(&phrase);
                (kind, self.parse_primary()?)
            }
            TokenKind::Read => {
                // "read a number into" / "read text into" arrive as single
                // phrases; the kind is in the phrase words.
                let phrase = self.advance().value.to_lowercase();
                let kind = input_kind_from_words(&phrase);
                self.skip_optional(&[TokenKind::Into]);
                (kind, self.parse_primary()?)
            }
            _ => {
                // get input from the user as <target>
                self.advance();
                (InputKind::Text, self.parse_primary()?)
            }
        };

        Ok(Stmt::new(StmtKind::Input { target, input_kind }, line))
    }

    fn parse_return(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // return

        let value = if self.check_any(&[TokenKind::Newline, TokenKind::End, TokenKind::Eof]) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        Ok(Stmt::new(StmtKind::Return { value }, line))
    }

    /// Skip a `note:`/`reminder:` line or a `notes ... end notes` block.
    fn parse_comment(&mut self) {
        if self.check_any(&[TokenKind::Note, TokenKind::Reminder]) {
            self.advance();
            self.skip_optional(&[TokenKind::Colon]);
            while !self.check_any(&[TokenKind::Newline, TokenKind::Eof]) {
                self.advance();
            }
        } else if self.check(TokenKind::Notes) {
            self.advance();
            self.skip_optional(&[TokenKind::Colon]);
            while !self.check_any(&[TokenKind::EndNotes, TokenKind::Eof]) {
                self.advance();
            }
            if self.check(TokenKind::EndNotes) {
                self.advance();
            }
        }
    }

    fn parse_open_window(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // open a window sized

        let width = self.parse_primary()?;
        if matches!(self.current().value.to_lowercase().as_str(), "by" | "x") {
            self.advance();
        }
        let height = self.parse_primary()?;

        let mut title = None;
        if self.check_any(&[TokenKind::Called, TokenKind::With]) {
            self.advance();
            if self.check(TokenKind::Identifier) && self.current().value.to_lowercase() == "title" {
                self.advance();
            }
            title = Some(self.parse_expression()?);
        } else if self.check(TokenKind::StringLiteral) {
            title = Some(self.parse_expression()?);
        }

        Ok(Stmt::new(
            StmtKind::OpenWindow {
                width,
                height,
                title,
            },
            line,
        ))
    }

    fn parse_clear_screen(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // clear the screen with
        let mut color = "RAYWHITE".to_string();
        if self.check(TokenKind::Identifier) {
            color = self.advance().value.to_uppercase();
        }
        Ok(Stmt::new(StmtKind::ClearScreen { color }, line))
    }

    fn parse_draw_rectangle(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // draw a rectangle at

        let x = self.parse_primary()?;
        self.skip_optional(&[TokenKind::Comma]);
        let y = self.parse_primary()?;

        if matches!(self.current().value.to_lowercase().as_str(), "sized" | "size" | "with") {
            self.advance();
            if self.current().value.to_lowercase() == "size" {
                self.advance();
            }
        }
        let width = self.parse_primary()?;
        if matches!(self.current().value.to_lowercase().as_str(), "by" | "x") {
            self.advance();
        }
        let height = self.parse_primary()?;

        let mut color = "LIGHTGRAY".to_string();
        if matches!(self.current().value.to_lowercase().as_str(), "in" | "with" | "colored") {
            self.advance();
            if self.current().value.to_lowercase() == "color" {
                self.advance();
            }
            if self.check(TokenKind::Identifier) {
                color = self.advance().value.to_uppercase();
            }
        }

        Ok(Stmt::new(
            StmtKind::DrawRectangle {
                x,
                y,
                width,
                height,
                color,
            },
            line,
        ))
    }

    fn parse_draw_text(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        self.advance(); // draw text

        let text = self.parse_expression()?;
        let mut x = Expr::number(0, line);
        let mut y = Expr::number(0, line);
        let mut size = Expr::number(20, line);
        let mut color = "BLACK".to_string();

        if self.current().value.to_lowercase() == "at" {
            self.advance();
            x = self.parse_expression()?;
            self.skip_optional(&[TokenKind::Comma]);
            y = self.parse_expression()?;
        }
        if matches!(self.current().value.to_lowercase().as_str(), "size" | "sized" | "with") {
            self.advance();
            if self.current().value.to_lowercase() == "size" {
                self.advance();
            }
            size = self.parse_expression()?;
        }
        if matches!(self.current().value.to_lowercase().as_str(), "in" | "colored" | "with") {
            self.advance();
            if self.current().value.to_lowercase() == "color" {
                self.advance();
            }
            if self.check(TokenKind::Identifier) {
                color = self.advance().value.to_uppercase();
            }
        }

        Ok(Stmt::new(
            StmtKind::DrawText {
                text,
                x,
                y,
                size,
                color,
            },
            line,
        ))
    }

    /// A statement that starts with an identifier: either a bare expression
    /// (usually a call) or an `x is <expr>` style assignment.
    fn parse_identifier_statement(&mut self) -> Result<Stmt, String> {
        let line = self.current().line;
        let expr = self.parse_expression()?;

        if self.check_any(&[TokenKind::To, TokenKind::Is, TokenKind::EqualTo]) {
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: expr,
                    value,
                },
                line,
            ));
        }

        Ok(Stmt::new(StmtKind::Expr(expr), line))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Full condition grammar: or / and / not / comparison.
    pub fn parse_condition(&mut self) -> Result<Expr, String> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right, self.line);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_not()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            left = binary(BinOp::And, left, right, self.line);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if self.check_any(&[TokenKind::Not, TokenKind::ItIsNotTheCaseThat]) {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                },
                self.line,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let left = self.parse_expression()?;

        let op = match self.current().kind {
            TokenKind::GreaterThan => Some(BinOp::Gt),
            TokenKind::LessThan => Some(BinOp::Lt),
            TokenKind::Equals | TokenKind::SameAs => Some(BinOp::Eq),
            TokenKind::NotEqualTo => Some(BinOp::Ne),
            TokenKind::AtLeast => Some(BinOp::Ge),
            TokenKind::AtMost => Some(BinOp::Le),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.parse_expression()?;
            return Ok(binary(op, left, right, self.line));
        }

        match self.current().kind {
            TokenKind::Between => {
                // x is between a and b  ->  x >= a && x <= b
                self.advance();
                let low = self.parse_expression()?;
                self.expect(TokenKind::And)?;
                let high = self.parse_expression()?;
                let line = self.line;
                let lower = binary(BinOp::Ge, left.clone(), low, line);
                let upper = binary(BinOp::Le, left, high, line);
                Ok(binary(BinOp::And, lower, upper, line))
            }
            TokenKind::Positive => {
                self.advance();
                let line = self.line;
                Ok(binary(BinOp::Gt, left, Expr::number(0, line), line))
            }
            TokenKind::IsNegative => {
                self.advance();
                let line = self.line;
                Ok(binary(BinOp::Lt, left, Expr::number(0, line), line))
            }
            TokenKind::IsZero => {
                self.advance();
                let line = self.line;
                Ok(binary(BinOp::Eq, left, Expr::number(0, line), line))
            }
            TokenKind::IsEven => {
                self.advance();
                let line = self.line;
                let rem = binary(BinOp::Mod, left, Expr::number(2, line), line);
                Ok(binary(BinOp::Eq, rem, Expr::number(0, line), line))
            }
            TokenKind::IsOdd => {
                self.advance();
                let line = self.line;
                let rem = binary(BinOp::Mod, left, Expr::number(2, line), line);
                Ok(binary(BinOp::Ne, rem, Expr::number(0, line), line))
            }
            TokenKind::IsEmpty => {
                // xs is empty  ->  __len__(xs) == 0
                self.advance();
                let line = self.line;
                let len = Expr::new(
                    ExprKind::Call {
                        name: "__len__".to_string(),
                        args: vec![left],
                    },
                    line,
                );
                Ok(binary(BinOp::Eq, len, Expr::number(0, line), line))
            }
            TokenKind::Contains => {
                self.advance();
                let right = self.parse_expression()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "strstr".to_string(),
                        args: vec![left, right],
                    },
                    self.line,
                ))
            }
            _ => Ok(left),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expr, String> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        while self.check_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = if self.check(TokenKind::Plus) {
                BinOp::Add
            } else {
                BinOp::Sub
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, self.line);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_power()?;
        while self.check_any(&[TokenKind::Times, TokenKind::DividedBy, TokenKind::Modulo]) {
            let op = match self.current().kind {
                TokenKind::Times => BinOp::Mul,
                TokenKind::DividedBy => BinOp::Div,
                _ => BinOp::Mod,
            };
            self.advance();
            let right = self.parse_power()?;
            left = binary(op, left, right, self.line);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let left = self.parse_unary()?;
        if self.check(TokenKind::ToThePowerOf) {
            self.advance();
            // Right-associative
            let right = self.parse_power()?;
            return Ok(Expr::new(
                ExprKind::Call {
                    name: "pow".to_string(),
                    args: vec![left, right],
                },
                self.line,
            ));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.current().kind {
            TokenKind::Negative => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnOp::Neg,
                        operand: Box::new(operand),
                    },
                    self.line,
                ))
            }
            TokenKind::SquareRootOf => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "sqrt".to_string(),
                        args: vec![operand],
                    },
                    self.line,
                ))
            }
            TokenKind::AbsoluteValueOf => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "abs".to_string(),
                        args: vec![operand],
                    },
                    self.line,
                ))
            }
            TokenKind::TheSumOf => {
                self.advance();
                let left = self.parse_primary()?;
                self.expect(TokenKind::And)?;
                let right = self.parse_primary()?;
                Ok(binary(BinOp::Add, left, right, self.line))
            }
            TokenKind::AddressOf => {
                self.advance();
                let operand = self.parse_primary()?;
                Ok(Expr::new(ExprKind::AddressOf(Box::new(operand)), self.line))
            }
            TokenKind::ValueAt => {
                self.advance();
                let operand = self.parse_primary()?;
                if self.check(TokenKind::PointsTo) {
                    self.advance();
                }
                Ok(Expr::new(ExprKind::Deref(Box::new(operand)), self.line))
            }
            TokenKind::ResultOf => {
                self.advance();
                self.parse_function_call()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;
        while self.check(TokenKind::ApostropheS) {
            self.advance();
            let field = self.expect(TokenKind::Identifier)?.value;
            expr = Expr::new(
                ExprKind::Member {
                    object: Box::new(expr),
                    field,
                },
                self.line,
            );
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.current().kind {
            TokenKind::NumberLiteral => {
                let token = self.advance();
                let value = token
                    .value
                    .parse::<i64>()
                    .map_err(|_| format!("Parse error at line {}: number out of range", token.line))?;
                Ok(Expr::number(value, self.line))
            }
            TokenKind::DecimalLiteral => {
                let token = self.advance();
                let value = token.value.parse::<f64>().map_err(|_| {
                    format!("Parse error at line {}: malformed decimal", token.line)
                })?;
                Ok(Expr::new(ExprKind::Decimal(value), self.line))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Str(token.value), self.line))
            }
            TokenKind::CharLiteral => {
                let token = self.advance();
                let c = token.value.chars().next().unwrap_or('\0');
                Ok(Expr::new(ExprKind::Char(c), self.line))
            }
            TokenKind::Yes => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), self.line))
            }
            TokenKind::No => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), self.line))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, self.line))
            }
            TokenKind::FirstItemIn => {
                self.advance();
                let array = self.parse_primary()?;
                let line = self.line;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(Expr::number(0, line)),
                    },
                    line,
                ))
            }
            TokenKind::LastItemIn => {
                self.advance();
                let array = self.parse_primary()?;
                let line = self.line;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(Expr::number(-1, line)),
                    },
                    line,
                ))
            }
            TokenKind::ItemNumber => {
                self.advance();
                let index = self.parse_expression()?;
                self.skip_optional(&[TokenKind::In, TokenKind::Of]);
                let array = self.parse_primary()?;
                Ok(Expr::new(
                    ExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    self.line,
                ))
            }
            TokenKind::LengthOf | TokenKind::SizeOf | TokenKind::HowManyIn => {
                self.advance();
                self.skip_optional(&[TokenKind::The]);
                let array = self.parse_primary()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "__len__".to_string(),
                        args: vec![array],
                    },
                    self.line,
                ))
            }
            TokenKind::Allocate => {
                self.advance();
                let count = self.parse_expression()?;
                let ty = self.parse_type();
                self.skip_optional(&[TokenKind::And]);
                self.skip_optional(&[TokenKind::Called]);
                Ok(Expr::new(
                    ExprKind::Allocate {
                        count: Box::new(count),
                        ty,
                    },
                    self.line,
                ))
            }
            TokenKind::RandomNumber => {
                self.advance();
                let min = self.parse_expression()?;
                self.expect(TokenKind::And)?;
                let max = self.parse_expression()?;
                Ok(Expr::new(
                    ExprKind::Random {
                        min: Box::new(min),
                        max: Box::new(max),
                    },
                    self.line,
                ))
            }
            TokenKind::AnotherLineIn => {
                self.advance();
                let file = self.parse_primary()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "__has_line__".to_string(),
                        args: vec![file],
                    },
                    self.line,
                ))
            }
            TokenKind::ReadLineFrom => {
                self.advance();
                let file = self.parse_primary()?;
                self.skip_optional(&[TokenKind::Into]);
                let target = self.parse_primary()?;
                Ok(Expr::new(
                    ExprKind::Call {
                        name: "__read_line__".to_string(),
                        args: vec![file, target],
                    },
                    self.line,
                ))
            }
            TokenKind::FailedToOpen => {
                self.advance();
                let line = self.line;
                let last_file = Expr::new(ExprKind::Ident("__last_file__".to_string()), line);
                let null = Expr::new(ExprKind::Null, line);
                Ok(binary(BinOp::Eq, last_file, null, line))
            }
            TokenKind::WindowShouldClose => {
                self.advance();
                Ok(Expr::new(ExprKind::WindowShouldClose, self.line))
            }
            TokenKind::MouseX => {
                self.advance();
                Ok(Expr::new(ExprKind::MouseX, self.line))
            }
            TokenKind::MouseY => {
                self.advance();
                Ok(Expr::new(ExprKind::MouseY, self.line))
            }
            TokenKind::MousePressed => {
                self.advance();
                Ok(Expr::new(ExprKind::MousePressed, self.line))
            }
            TokenKind::The | TokenKind::A | TokenKind::An => {
                self.advance();
                self.parse_primary()
            }
            TokenKind::Identifier => {
                let name = self.advance().value;
                Ok(Expr::new(ExprKind::Ident(name), self.line))
            }
            _ => Err(self.error("Expected an expression")),
        }
    }

    /// `the result of <name words and arguments>` — the callee name is the
    /// concatenation of identifier and connective words; literal tokens and
    /// trailing identifiers become arguments, separated by commas. An
    /// identifier right after an article ("greet the user") is always a name
    /// word, mirroring how definitions build their names.
    fn parse_function_call(&mut self) -> Result<Expr, String> {
        let mut name_parts: Vec<String> = Vec::new();
        let mut args = Vec::new();
        let mut after_article = false;

        loop {
            match self.current().kind {
                TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::End
                | TokenKind::Then
                | TokenKind::And
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Times
                | TokenKind::DividedBy
                | TokenKind::Colon => break,
                TokenKind::NumberLiteral
                | TokenKind::DecimalLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::Yes
                | TokenKind::No
                | TokenKind::Null => {
                    args.push(self.parse_primary()?);
                    after_article = false;
                }
                TokenKind::Comma => {
                    self.advance();
                    after_article = false;
                }
                TokenKind::Identifier => {
                    if !after_article && ARG_FOLLOWERS.contains(&self.peek(1).kind) {
                        args.push(self.parse_primary()?);
                    } else {
                        name_parts.push(self.advance().value);
                    }
                    after_article = false;
                }
                TokenKind::The | TokenKind::A | TokenKind::An => {
                    self.advance();
                    after_article = true;
                }
                TokenKind::Of | TokenKind::With | TokenKind::In => {
                    name_parts.push(self.advance().value);
                    after_article = false;
                }
                _ => break,
            }
        }

        let name = if name_parts.is_empty() {
            "unknown".to_string()
        } else {
            name_parts.join("_").to_lowercase()
        };

        Ok(Expr::new(ExprKind::Call { name, args }, self.line))
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, line: usize) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}

fn compound_assign(target: Expr, op: BinOp, value: Expr, line: usize) -> Stmt {
    let combined = binary(op, target.clone(), value, line);
    Stmt::new(
        StmtKind::Assign {
            target,
            value: combined,
        },
        line,
    )
}

fn input_kind_from_words(phrase: &str) -> InputKind {
    if phrase.contains("number") {
        InputKind::Number
    } else if phrase.contains("decimal") {
        InputKind::Decimal
    } else if phrase.contains("letter") {
        InputKind::Letter
    } else {
        InputKind::Text
    }
}

/// Parse a source string into a program.
pub fn parse(source: &str) -> Result<Program, String> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_main(body: &str) -> Vec<Stmt> {
        let source = format!("to do the main thing:\n{}\nend\n", body);
        let program = parse(&source).unwrap();
        assert_eq!(program.functions.len(), 1);
        program.functions.into_iter().next().unwrap().body
    }

    #[test]
    fn test_parse_hello_world() {
        let program = parse(
            "include the standard input and output\n\nto do the main thing:\n    say \"Hello, World!\"\nend\n",
        )
        .unwrap();
        assert_eq!(program.includes.len(), 1);
        assert_eq!(program.includes[0].library, "stdio");
        assert_eq!(program.functions.len(), 1);
        let main = &program.functions[0];
        assert!(main.is_main);
        assert_eq!(main.name, "main");
        assert_eq!(main.body.len(), 1);
        match &main.body[0].kind {
            StmtKind::Print { parts } => {
                assert_eq!(parts.len(), 1);
                assert_eq!(parts[0].kind, ExprKind::Str("Hello, World!".to_string()));
            }
            other => panic!("Expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_var_decl_with_initializer() {
        let body = parse_main("there is a number called x which is 5");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert_eq!(decl.name, "x");
                assert_eq!(decl.var_type.as_ref().unwrap().base, BaseType::Number);
                assert_eq!(decl.init.as_ref().unwrap().kind, ExprKind::Number(5));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_declaration() {
        let body = parse_main("there is a list of number called xs containing 10, 20, 30");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert!(decl.var_type.as_ref().unwrap().is_array);
                match &decl.init.as_ref().unwrap().kind {
                    ExprKind::ArrayLit(elements) => assert_eq!(elements.len(), 3),
                    other => panic!("Expected array literal, got {:?}", other),
                }
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_with_elif_and_else() {
        let body = parse_main(
            "if x is greater than 3 then\nsay \"big\"\notherwise if x is zero then\nsay \"zero\"\notherwise\nsay \"small\"\nend",
        );
        match &body[0].kind {
            StmtKind::If {
                condition,
                then_body,
                else_ifs,
                else_body,
            } => {
                assert!(matches!(
                    condition.kind,
                    ExprKind::Binary { op: BinOp::Gt, .. }
                ));
                assert_eq!(then_body.len(), 1);
                assert_eq!(else_ifs.len(), 1);
                assert_eq!(else_body.len(), 1);
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_counted_for_descending() {
        let body = parse_main("for each number i from 10 down to 1:\nsay i\nend");
        match &body[0].kind {
            StmtKind::For { var, step, .. } => {
                assert_eq!(var, "i");
                assert_eq!(*step, -1);
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_foreach() {
        let body = parse_main("for each number v in xs:\nsay v\nend");
        match &body[0].kind {
            StmtKind::ForEach { var, iterable, .. } => {
                assert_eq!(var, "v");
                assert_eq!(iterable.kind, ExprKind::Ident("xs".to_string()));
            }
            other => panic!("Expected foreach, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_repeat() {
        let body = parse_main("repeat 3 times:\nsay \"hi\"\nend");
        match &body[0].kind {
            StmtKind::Repeat { count, .. } => {
                assert_eq!(count.kind, ExprKind::Number(3));
            }
            other => panic!("Expected repeat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_print_with_parts() {
        let body = parse_main("say \"x is \" and then x");
        match &body[0].kind {
            StmtKind::Print { parts } => assert_eq!(parts.len(), 2),
            other => panic!("Expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_add_sugar() {
        let body = parse_main("add 5 to total");
        match &body[0].kind {
            StmtKind::Assign { target, value } => {
                assert_eq!(target.kind, ExprKind::Ident("total".to_string()));
                assert!(matches!(
                    value.kind,
                    ExprKind::Binary { op: BinOp::Add, .. }
                ));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_element_assignment() {
        let body = parse_main("change item number 2 in xs to 9");
        match &body[0].kind {
            StmtKind::Assign { target, .. } => {
                assert!(matches!(target.kind, ExprKind::Index { .. }));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_last_item_uses_negative_one() {
        let body = parse_main("change the last item in xs to 9");
        match &body[0].kind {
            StmtKind::Assign { target, .. } => match &target.kind {
                ExprKind::Index { index, .. } => {
                    assert_eq!(index.kind, ExprKind::Number(-1));
                }
                other => panic!("Expected index, got {:?}", other),
            },
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_member_assignment_via_possessive() {
        let body = parse_main("change p's age to 30");
        match &body[0].kind {
            StmtKind::Assign { target, .. } => match &target.kind {
                ExprKind::Member { field, .. } => assert_eq!(field, "age"),
                other => panic!("Expected member access, got {:?}", other),
            },
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pointer_target_assignment() {
        let body = parse_main("change the value that p points to to 5");
        match &body[0].kind {
            StmtKind::Assign { target, .. } => {
                assert!(matches!(target.kind, ExprKind::Deref(_)));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_struct_definition() {
        let program = parse(
            "define Point as having:\nnumber called x\nnumber called y\nend\n\nto do the main thing:\nsay 1\nend\n",
        )
        .unwrap();
        assert_eq!(program.structs.len(), 1);
        let def = &program.structs[0];
        assert_eq!(def.name, "Point");
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].name, "x");
        assert_eq!(def.fields[1].name, "y");
    }

    #[test]
    fn test_parse_function_with_params_and_return() {
        let program = parse(
            "to double number called n and return a number:\nreturn n times 2\nend\n",
        )
        .unwrap();
        let func = &program.functions[0];
        assert_eq!(func.name, "double");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "n");
        assert_eq!(func.return_type.as_ref().unwrap().base, BaseType::Number);
    }

    #[test]
    fn test_parse_multiword_function_name_matches_call() {
        let program = parse(
            "to greet the user:\nsay \"hi\"\nend\n\nto do the main thing:\nthe result of greet the user\nend\n",
        )
        .unwrap();
        assert_eq!(program.functions[0].name, "greet_user");
        match &program.functions[1].body[0].kind {
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Call { name, args } => {
                    assert_eq!(name, "greet_user");
                    assert!(args.is_empty());
                }
                other => panic!("Expected call, got {:?}", other),
            },
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_with_arguments() {
        let body = parse_main("let d be the result of double 5");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => match &decl.init.as_ref().unwrap().kind {
                ExprKind::Call { name, args } => {
                    assert_eq!(name, "double");
                    assert_eq!(args.len(), 1);
                }
                other => panic!("Expected call, got {:?}", other),
            },
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_with_comma_arguments() {
        let body = parse_main("let s be the result of add_nums 3, 4");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => match &decl.init.as_ref().unwrap().kind {
                ExprKind::Call { name, args } => {
                    assert_eq!(name, "add_nums");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("Expected call, got {:?}", other),
            },
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_short_circuit_condition_shape() {
        let body = parse_main(
            "if n is not equal to 0 and 10 divided by n is greater than 1 then\nsay \"yes\"\nend",
        );
        match &body[0].kind {
            StmtKind::If { condition, .. } => match &condition.kind {
                ExprKind::Binary { op, left, right } => {
                    assert_eq!(*op, BinOp::And);
                    assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Ne, .. }));
                    assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Gt, .. }));
                }
                other => panic!("Expected binary condition, got {:?}", other),
            },
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_between_desugars() {
        let body = parse_main("if x is between 1 and 10 then\nsay \"in\"\nend");
        match &body[0].kind {
            StmtKind::If { condition, .. } => {
                assert!(matches!(
                    condition.kind,
                    ExprKind::Binary { op: BinOp::And, .. }
                ));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_empty_desugars_to_len() {
        let body = parse_main("if xs is empty then\nsay \"none\"\nend");
        match &body[0].kind {
            StmtKind::If { condition, .. } => match &condition.kind {
                ExprKind::Binary { op: BinOp::Eq, left, .. } => match &left.kind {
                    ExprKind::Call { name, .. } => assert_eq!(name, "__len__"),
                    other => panic!("Expected __len__ call, got {:?}", other),
                },
                other => panic!("Expected comparison, got {:?}", other),
            },
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        let body = parse_main("let x be 2 to the power of 3 to the power of 2");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => match &decl.init.as_ref().unwrap().kind {
                ExprKind::Call { name, args } => {
                    assert_eq!(name, "pow");
                    assert!(matches!(&args[1].kind, ExprKind::Call { name, .. } if name == "pow"));
                }
                other => panic!("Expected pow call, got {:?}", other),
            },
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_file_declaration() {
        let body = parse_main("there is a file called f which opens \"data.txt\" for reading");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert!(decl.is_file);
                assert_eq!(decl.name, "f");
                assert_eq!(decl.file_mode, Some(FileMode::Read));
                assert!(decl.file_path.is_some());
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_input_forms() {
        let body = parse_main("ask the user for a number and store it in x");
        match &body[0].kind {
            StmtKind::Input { input_kind, .. } => assert_eq!(*input_kind, InputKind::Number),
            other => panic!("Expected input, got {:?}", other),
        }

        let body = parse_main("read a number into x");
        match &body[0].kind {
            StmtKind::Input { input_kind, .. } => assert_eq!(*input_kind, InputKind::Number),
            other => panic!("Expected input, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_stop_program_returns_one() {
        let body = parse_main("stop the program");
        match &body[0].kind {
            StmtKind::Return { value } => {
                assert_eq!(value.as_ref().unwrap().kind, ExprKind::Number(1));
            }
            other => panic!("Expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_break_and_continue() {
        let body = parse_main("while yes:\nstop the loop\nskip to the next one\nend");
        match &body[0].kind {
            StmtKind::While { body, .. } => {
                assert!(matches!(body[0].kind, StmtKind::Break));
                assert!(matches!(body[1].kind, StmtKind::Continue));
            }
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_notes_block_is_skipped() {
        let body = parse_main("notes:\nall of this is ignored if x then\nend notes\nsay 1");
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0].kind, StmtKind::Print { .. }));
    }

    #[test]
    fn test_parse_error_reports_line_and_token() {
        let err = parse("to do the main thing:\nsay\nend\n").unwrap_err();
        assert!(err.contains("Parse error at line 2"), "got: {}", err);
        assert!(err.contains("Expected an expression"), "got: {}", err);
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let err = parse("say 1\n").unwrap_err();
        assert!(err.contains("Unexpected token at top level"));
    }

    #[test]
    fn test_parse_random_and_allocate() {
        let body = parse_main("let r be a random number between 1 and 6");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert!(matches!(decl.init.as_ref().unwrap().kind, ExprKind::Random { .. }));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }

        let body = parse_main("let p be allocate space for 10 numbers");
        match &body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert!(matches!(decl.init.as_ref().unwrap().kind, ExprKind::Allocate { .. }));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }
}
