//! Tokenizer and parser for the expression language.
//!
//! ```text
//! program   := statement (';' statement)* ';'?
//! statement := expr ('=' expr)?
//! expr      := primary ('.' ident call?)*
//! primary   := literal | ident call? | '(' expr ')'
//! call      := '(' (expr (',' expr)*)? ')'
//! ```

use serde_json::Value;

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Dot,
    Comma,
    LParen,
    RParen,
    Assign,
    Semicolon,
}

fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Assign);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semicolon);
            }
            '"' | '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some(q) if q == c => break,
                        Some('\\') => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                            None => return Err(EvalError::Syntax("unterminated string".into())),
                        },
                        Some(other) => text.push(other),
                        None => return Err(EvalError::Syntax("unterminated string".into())),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::new();
                number.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = number
                    .parse::<f64>()
                    .map_err(|_| EvalError::Syntax(format!("invalid number {}", number)))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(EvalError::Syntax(format!("unexpected character '{}'", other)));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Ident(String),
    Member { object: Box<Expr>, name: String },
    Call { callee: Box<Expr>, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    Expr(Expr),
    Assign { target: Expr, value: Expr },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), EvalError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> EvalError {
        match self.peek() {
            Some(token) => EvalError::Syntax(format!("unexpected token {:?}", token)),
            None => EvalError::Syntax("unexpected end of input".to_string()),
        }
    }

    fn program(&mut self) -> Result<Vec<Statement>, EvalError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            if self.eat(&Token::Semicolon) {
                continue;
            }
            statements.push(self.statement()?);
            if self.peek().is_some() {
                self.expect(&Token::Semicolon)?;
            }
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Statement, EvalError> {
        let target = self.expr()?;
        if !self.eat(&Token::Assign) {
            return Ok(Statement::Expr(target));
        }
        if !matches!(target, Expr::Member { .. }) {
            return Err(EvalError::Syntax(
                "invalid left-hand side in assignment".to_string(),
            ));
        }
        let value = self.expr()?;
        Ok(Statement::Assign { target, value })
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;
        while self.eat(&Token::Dot) {
            let Some(Token::Ident(name)) = self.next() else {
                return Err(EvalError::Syntax("expected property name".to_string()));
            };
            expr = Expr::Member {
                object: Box::new(expr),
                name,
            };
            if self.peek() == Some(&Token::LParen) {
                expr = self.call(expr)?;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(number_value(n))),
            Some(Token::Ident(name)) => {
                let expr = match name.as_str() {
                    "true" => Expr::Literal(Value::Bool(true)),
                    "false" => Expr::Literal(Value::Bool(false)),
                    "null" | "undefined" => Expr::Literal(Value::Null),
                    _ => Expr::Ident(name),
                };
                if self.peek() == Some(&Token::LParen) {
                    return self.call(expr);
                }
                Ok(expr)
            }
            Some(Token::LParen) => {
                let expr = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.unexpected())
            }
        }
    }

    fn call(&mut self, callee: Expr) -> Result<Expr, EvalError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma)?;
            }
        }
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }
}

/// JSON number for `n`, integral when it has no fraction.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Parse `source` into statements.
pub(crate) fn parse(source: &str) -> Result<Vec<Statement>, EvalError> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.program()
}
