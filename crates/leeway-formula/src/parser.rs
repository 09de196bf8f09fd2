//! Formula parser
//!
//! A hand-written lexer and recursive descent parser turning formula
//! source text into a [`Program`]. Parsing is a pure function of the
//! text; every call builds an independent parser, so concurrent use
//! across interpreter instances needs no extra reasoning.

use crate::ast::{
    BinaryOperator, Expr, Fixity, Function, InputDecl, LocalDecl, OutputDecl, Program,
    StepOperator, Stmt, UnaryOperator, ENTRY_POINT,
};
use crate::error::{ParseError, ParseResult};
use ahash::AHashMap;

/// Parse formula source text into a [`Program`]
///
/// # Example
/// ```rust
/// use leeway_formula::parse_program;
///
/// let program = parse_program(
///     r#"
///     input x "X";
///     output y "Y" "%.1f";
///     main() { y = x * 2; }
///     "#,
/// )
/// .unwrap();
/// assert_eq!(program.inputs()[0].name, "x");
/// ```
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut functions: AHashMap<String, Function> = AHashMap::new();

    while !matches!(parser.current(), Token::Eof) {
        match parser.current().clone() {
            Token::Input => {
                parser.consume()?;
                inputs.push(parser.parse_input_decl()?);
            }
            Token::Output => {
                parser.consume()?;
                outputs.push(parser.parse_output_decl()?);
            }
            Token::Ident(name) => {
                let line = parser.token_line;
                parser.consume()?;
                let func = parser.parse_function(name)?;
                if functions.contains_key(&func.name) {
                    return Err(ParseError::new(
                        line,
                        format!("function '{}' is already defined", func.name),
                    ));
                }
                functions.insert(func.name.clone(), func);
            }
            token => {
                return Err(parser.err(format!(
                    "expected input, output, or function definition, got {token:?}"
                )))
            }
        }
    }

    match functions.get(ENTRY_POINT) {
        None => {
            return Err(ParseError::new(
                parser.line,
                format!("no '{ENTRY_POINT}' function defined"),
            ))
        }
        Some(main) if !main.params.is_empty() => {
            return Err(ParseError::new(
                parser.line,
                format!("'{ENTRY_POINT}' must take no parameters"),
            ))
        }
        Some(_) => {}
    }

    Ok(Program::new(inputs, outputs, functions))
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    Text(String),
    Ident(String),

    // Keywords
    Input,
    Output,
    Var,
    If,
    Else,
    While,
    Break,
    Return,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    ShiftLeft,
    ShiftRight,
    Bang,
    Assign,
    EqualEqual,
    BangEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Question,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    // End of input
    Eof,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// 1-based line of the scan position
    line: usize,
    token: Token,
    /// Line the current token started on, for error reporting
    token_line: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> ParseResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            line: 1,
            token: Token::Eof,
            token_line: 1,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> ParseResult<()> {
        self.skip_trivia()?;
        self.token_line = self.line;
        self.token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> ParseResult<Token> {
        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        match c {
            '*' => {
                self.advance();
                return Ok(Token::Star);
            }
            '/' => {
                self.advance();
                return Ok(Token::Slash);
            }
            '%' => {
                self.advance();
                return Ok(Token::Percent);
            }
            '?' => {
                self.advance();
                return Ok(Token::Question);
            }
            ':' => {
                self.advance();
                return Ok(Token::Colon);
            }
            ',' => {
                self.advance();
                return Ok(Token::Comma);
            }
            ';' => {
                self.advance();
                return Ok(Token::Semicolon);
            }
            '(' => {
                self.advance();
                return Ok(Token::LeftParen);
            }
            ')' => {
                self.advance();
                return Ok(Token::RightParen);
            }
            '{' => {
                self.advance();
                return Ok(Token::LeftBrace);
            }
            '}' => {
                self.advance();
                return Ok(Token::RightBrace);
            }
            _ => {}
        }

        // One- and two-character operators
        if c == '+' {
            self.advance();
            if self.peek_char() == Some('+') {
                self.advance();
                return Ok(Token::PlusPlus);
            }
            return Ok(Token::Plus);
        }

        if c == '-' {
            self.advance();
            if self.peek_char() == Some('-') {
                self.advance();
                return Ok(Token::MinusMinus);
            }
            return Ok(Token::Minus);
        }

        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('<') {
                self.advance();
                return Ok(Token::ShiftLeft);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::ShiftRight);
            }
            return Ok(Token::GreaterThan);
        }

        if c == '=' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::EqualEqual);
            }
            return Ok(Token::Assign);
        }

        if c == '!' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::BangEqual);
            }
            return Ok(Token::Bang);
        }

        // Quoted text (prompts, labels, format strings)
        if c == '"' {
            return self.scan_text();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or keyword
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_ident());
        }

        Err(self.err(format!("unexpected character '{c}'")))
    }

    fn scan_text(&mut self) -> ParseResult<Token> {
        let open_line = self.line;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return Ok(Token::Text(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(ParseError::new(open_line, "unterminated string"));
                }
            }
        }
    }

    fn scan_number(&mut self) -> ParseResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when a digit actually follows
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            let after_sign = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_char_at(after_sign).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                if matches!(self.peek_char(), Some('+') | Some('-')) {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str
            .parse()
            .map_err(|_| self.err(format!("invalid number '{num_str}'")))?;
        Ok(Token::Number(num))
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "input" => Token::Input,
            "output" => Token::Output,
            "var" => Token::Var,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "break" => Token::Break,
            "return" => Token::Return,
            text => Token::Ident(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            if c == '\n' {
                self.line += 1;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            while self.peek_char().is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }

            if self.peek_char() == Some('/') && self.peek_char_at(1) == Some('/') {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            if self.peek_char() == Some('/') && self.peek_char_at(1) == Some('*') {
                let open_line = self.line;
                self.advance();
                self.advance();
                loop {
                    if self.is_at_end() {
                        return Err(ParseError::new(open_line, "unterminated block comment"));
                    }
                    if self.peek_char() == Some('*') && self.peek_char_at(1) == Some('/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            return Ok(());
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current(&self) -> &Token {
        &self.token
    }

    fn consume(&mut self) -> ParseResult<Token> {
        let token = std::mem::replace(&mut self.token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if self.current() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(self.err(format!("expected {expected:?}, got {:?}", self.current())))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        match self.current().clone() {
            Token::Ident(name) => {
                self.consume()?;
                Ok(name)
            }
            token => Err(self.err(format!("expected {what}, got {token:?}"))),
        }
    }

    fn expect_text(&mut self, what: &str) -> ParseResult<String> {
        match self.current().clone() {
            Token::Text(text) => {
                self.consume()?;
                Ok(text)
            }
            token => Err(self.err(format!("expected {what}, got {token:?}"))),
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.token_line, message)
    }

    // === Declarations and functions ===

    fn parse_input_decl(&mut self) -> ParseResult<InputDecl> {
        let name = self.expect_ident("input variable name")?;
        let prompt = self.expect_text("input prompt")?;
        self.expect(&Token::Semicolon)?;
        Ok(InputDecl { name, prompt })
    }

    fn parse_output_decl(&mut self) -> ParseResult<OutputDecl> {
        let name = self.expect_ident("output variable name")?;
        let label = self.expect_text("output label")?;
        let format = self.expect_text("output format")?;
        self.expect(&Token::Semicolon)?;
        Ok(OutputDecl {
            name,
            label,
            format,
        })
    }

    fn parse_function(&mut self, name: String) -> ParseResult<Function> {
        self.expect(&Token::LeftParen)?;

        let mut params = Vec::new();
        if !matches!(self.current(), Token::RightParen) {
            params.push(self.expect_ident("parameter name")?);
            while matches!(self.current(), Token::Comma) {
                self.consume()?;
                params.push(self.expect_ident("parameter name")?);
            }
        }
        self.expect(&Token::RightParen)?;

        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(self.err(format!(
                    "duplicate parameter '{param}' in function '{name}'"
                )));
            }
        }

        let body = self.parse_block()?;
        Ok(Function { name, params, body })
    }

    // === Statements ===

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        self.expect(&Token::LeftBrace)?;
        let mut stmts = Vec::new();
        while !matches!(self.current(), Token::RightBrace) {
            if matches!(self.current(), Token::Eof) {
                return Err(self.err("unexpected end of input, expected '}'"));
            }
            stmts.push(self.parse_statement()?);
        }
        self.consume()?;
        Ok(Stmt::Block(stmts))
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.current() {
            Token::Var => {
                self.consume()?;
                self.parse_declaration()
            }
            Token::If => {
                self.consume()?;
                self.parse_if()
            }
            Token::While => {
                self.consume()?;
                self.parse_while()
            }
            Token::Break => {
                self.consume()?;
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::Break)
            }
            Token::Return => {
                self.consume()?;
                let value = if matches!(self.current(), Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(&Token::Semicolon)?;
                Ok(Stmt::Return(value))
            }
            Token::LeftBrace => self.parse_block(),
            _ => self.parse_assign_or_expr(),
        }
    }

    fn parse_declaration(&mut self) -> ParseResult<Stmt> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident("variable name")?;
            let init = if matches!(self.current(), Token::Assign) {
                self.consume()?;
                Some(self.parse_expression()?)
            } else {
                None
            };
            decls.push(LocalDecl { name, init });

            match self.current() {
                Token::Comma => {
                    self.consume()?;
                }
                _ => break,
            }
        }
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::Declare(decls))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.expect(&Token::LeftParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::RightParen)?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if matches!(self.current(), Token::Else) {
            self.consume()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.expect(&Token::LeftParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_assign_or_expr(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression()?;

        if matches!(self.current(), Token::Assign) {
            // The grammar only allows bare identifiers on the left
            let target = match expr {
                Expr::Ident(name) => name,
                _ => return Err(self.err("invalid assignment target")),
            };
            self.consume()?;
            let value = self.parse_expression()?;
            self.expect(&Token::Semicolon)?;
            return Ok(Stmt::Assign { target, value });
        }

        self.expect(&Token::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Ternary: ?:
    // 2. Comparison: ==, !=, <, <=, >, >=
    // 3. Addition/Subtraction: +, -
    // 4. Shift: <<, >>
    // 5. Multiplication/Division: *, /, %
    // 6. Prefix unary: -, !, ++, --
    // 7. Postfix: ++, --
    // 8. Primary: literals, identifiers, calls, parentheses

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> ParseResult<Expr> {
        let cond = self.parse_comparison()?;

        if matches!(self.current(), Token::Question) {
            self.consume()?;
            let then = self.parse_expression()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.parse_ternary()?; // Right associative
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }

        Ok(cond)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current() {
                Token::EqualEqual => BinaryOperator::Equal,
                Token::BangEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;

        loop {
            let op = match self.current() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_shift()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Token::ShiftLeft => BinaryOperator::ShiftLeft,
                Token::ShiftRight => BinaryOperator::ShiftRight,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.current() {
            Token::Minus => {
                self.consume()?;
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            Token::Bang => {
                self.consume()?;
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                })
            }
            Token::PlusPlus => {
                self.consume()?;
                self.parse_step(StepOperator::Increment)
            }
            Token::MinusMinus => {
                self.consume()?;
                self.parse_step(StepOperator::Decrement)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_step(&mut self, op: StepOperator) -> ParseResult<Expr> {
        let operand = self.parse_unary()?;
        match operand {
            Expr::Ident(target) => Ok(Expr::Step {
                op,
                fixity: Fixity::Prefix,
                target,
            }),
            _ => Err(self.err("operand of '++'/'--' must be a variable")),
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            let op = match self.current() {
                Token::PlusPlus => StepOperator::Increment,
                Token::MinusMinus => StepOperator::Decrement,
                _ => break,
            };

            let target = match expr {
                Expr::Ident(name) => name,
                _ => return Err(self.err("operand of '++'/'--' must be a variable")),
            };
            self.consume()?;
            expr = Expr::Step {
                op,
                fixity: Fixity::Postfix,
                target,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.current().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(Expr::Number(n))
            }

            Token::Ident(name) => {
                self.consume()?;
                // A following '(' makes it a call
                if matches!(self.current(), Token::LeftParen) {
                    self.parse_call(name)
                } else {
                    Ok(Expr::Ident(name))
                }
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            token => Err(self.err(format!("unexpected token {token:?}"))),
        }
    }

    fn parse_call(&mut self, callee: String) -> ParseResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !matches!(self.current(), Token::RightParen) {
            args.push(self.parse_expression()?);
            while matches!(self.current(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }
        self.expect(&Token::RightParen)?;

        Ok(Expr::Call { callee, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_main_body(body: &str) -> Stmt {
        let source = format!("main() {{ {body} }}");
        let program = parse_program(&source).unwrap();
        program.function("main").unwrap().body.clone()
    }

    fn first_stmt(body: &str) -> Stmt {
        match parse_main_body(body) {
            Stmt::Block(stmts) => stmts.into_iter().next().unwrap(),
            stmt => panic!("expected block, got {stmt:?}"),
        }
    }

    fn parse_expr(expr: &str) -> Expr {
        match first_stmt(&format!("{expr};")) {
            Stmt::Expr(e) => e,
            stmt => panic!("expected expression statement, got {stmt:?}"),
        }
    }

    #[test]
    fn test_parse_minimal_program() {
        let program = parse_program("main() { }").unwrap();
        assert!(program.inputs().is_empty());
        assert!(program.outputs().is_empty());
        assert!(program.function("main").is_some());
    }

    #[test]
    fn test_parse_declarations() {
        let program = parse_program(
            r#"
            input x "Width";
            input h "Height";
            output area "Area" "%.2f";
            main() { area = x * h; }
            "#,
        )
        .unwrap();

        assert_eq!(program.inputs().len(), 2);
        assert_eq!(program.inputs()[0].name, "x");
        assert_eq!(program.inputs()[0].prompt, "Width");
        assert_eq!(program.outputs().len(), 1);
        assert_eq!(program.outputs()[0].label, "Area");
        assert_eq!(program.outputs()[0].format, "%.2f");
    }

    #[test]
    fn test_parse_number_literals() {
        assert_eq!(parse_expr("42"), Expr::Number(42.0));
        assert_eq!(parse_expr("3.14"), Expr::Number(3.14));
        assert_eq!(parse_expr("1e10"), Expr::Number(1e10));
        assert_eq!(parse_expr("2.5e-3"), Expr::Number(2.5e-3));
    }

    #[test]
    fn test_parse_precedence_mul_over_add() {
        // 1+2*3 parses as 1+(2*3)
        let expr = parse_expr("1+2*3");
        if let Expr::Binary { op, left, right } = expr {
            assert_eq!(op, BinaryOperator::Add);
            assert_eq!(*left, Expr::Number(1.0));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        } else {
            panic!("expected Binary");
        }
    }

    #[test]
    fn test_parse_precedence_shift_over_add() {
        // In this language shift binds tighter than addition:
        // 1+2<<3 parses as 1+(2<<3)
        let expr = parse_expr("1+2<<3");
        if let Expr::Binary { op, right, .. } = expr {
            assert_eq!(op, BinaryOperator::Add);
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOperator::ShiftLeft,
                    ..
                }
            ));
        } else {
            panic!("expected Binary");
        }
    }

    #[test]
    fn test_parse_comparison_over_ternary() {
        let expr = parse_expr("a > b ? a : b");
        assert!(matches!(expr, Expr::Ternary { .. }));
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_expr("-5"),
            Expr::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(Expr::Number(5.0)),
            }
        );
        assert!(matches!(
            parse_expr("!x"),
            Expr::Unary {
                op: UnaryOperator::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_step_operators() {
        assert_eq!(
            parse_expr("x++"),
            Expr::Step {
                op: StepOperator::Increment,
                fixity: Fixity::Postfix,
                target: "x".into(),
            }
        );
        assert_eq!(
            parse_expr("--x"),
            Expr::Step {
                op: StepOperator::Decrement,
                fixity: Fixity::Prefix,
                target: "x".into(),
            }
        );
    }

    #[test]
    fn test_parse_step_requires_identifier() {
        let err = parse_program("main() { 5++; }").unwrap_err();
        assert!(err.message.contains("must be a variable"));
    }

    #[test]
    fn test_parse_call() {
        let expr = parse_expr("f(1, 2, 3)");
        if let Expr::Call { callee, args } = expr {
            assert_eq!(callee, "f");
            assert_eq!(args.len(), 3);
        } else {
            panic!("expected Call");
        }
    }

    #[test]
    fn test_parse_var_declaration_list() {
        let stmt = first_stmt("var a, b = 2, c;");
        if let Stmt::Declare(decls) = stmt {
            assert_eq!(decls.len(), 3);
            assert_eq!(decls[0].name, "a");
            assert!(decls[0].init.is_none());
            assert_eq!(decls[1].init, Some(Expr::Number(2.0)));
            assert!(decls[2].init.is_none());
        } else {
            panic!("expected Declare");
        }
    }

    #[test]
    fn test_parse_if_else() {
        let stmt = first_stmt("if (x > 0) { y = 1; } else { y = 2; }");
        assert!(matches!(
            stmt,
            Stmt::If {
                otherwise: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_while_with_break() {
        let stmt = first_stmt("while (1) { break; }");
        if let Stmt::While { body, .. } = stmt {
            assert_eq!(*body, Stmt::Block(vec![Stmt::Break]));
        } else {
            panic!("expected While");
        }
    }

    #[test]
    fn test_parse_return_forms() {
        assert_eq!(first_stmt("return;"), Stmt::Return(None));
        assert_eq!(
            first_stmt("return 7;"),
            Stmt::Return(Some(Expr::Number(7.0)))
        );
    }

    #[test]
    fn test_parse_assignment_target_must_be_identifier() {
        let err = parse_program("main() { 5 = x; }").unwrap_err();
        assert!(err.message.contains("invalid assignment target"));
    }

    #[test]
    fn test_parse_comments() {
        let program = parse_program(
            r#"
            // line comment
            main() {
                /* block
                   comment */
                var x = 1; // trailing
            }
            "#,
        )
        .unwrap();
        assert!(program.function("main").is_some());
    }

    #[test]
    fn test_parse_missing_main() {
        let err = parse_program(r#"input x "X";"#).unwrap_err();
        assert!(err.message.contains("no 'main' function"));
    }

    #[test]
    fn test_parse_main_with_params_rejected() {
        let err = parse_program("main(a) { }").unwrap_err();
        assert!(err.message.contains("must take no parameters"));
    }

    #[test]
    fn test_parse_duplicate_function() {
        let err = parse_program("f() { } f() { } main() { }").unwrap_err();
        assert!(err.message.contains("already defined"));
    }

    #[test]
    fn test_parse_duplicate_parameter() {
        let err = parse_program("f(a, a) { } main() { }").unwrap_err();
        assert!(err.message.contains("duplicate parameter"));
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = parse_program("main() {\n\n  @\n}").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_parse_unterminated_string() {
        let err = parse_program("input x \"X;\nmain() { }").unwrap_err();
        assert!(err.message.contains("unterminated string"));
        assert_eq!(err.line, 1);
    }
}
