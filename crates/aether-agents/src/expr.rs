//! Arithmetic over `+ - * / % ** ^`, parentheses and decimal literals.
//!
//! Operators follow JavaScript: `**` is exponentiation and `^` is bitwise XOR
//! on int32-truncated operands, binding looser than `+`/`-`.
//!
//! ```text
//! xor     := sum ('^' sum)*
//! sum     := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') signed | power
//! signed  := (('+' | '-') signed | primary)     not followed by '**'
//! power   := primary ('**' unary)?
//! primary := number | '(' xor ')'
//! ```

use crate::error::ExprError;

/// Nesting limit for parentheses, prefix signs and `**` chains.
pub const MAX_DEPTH: usize = 256;

/// Drop every character that cannot be part of an expression.
pub fn clean_expression(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || "+-*/().%^".contains(*c))
        .collect()
}

/// Evaluate a cleaned expression. Non-finite results are errors.
pub fn evaluate(expr: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.xor()?;
    if let Some((tok, pos)) = parser.tokens.get(parser.pos) {
        return Err(match tok {
            Token::RParen => ExprError::Unbalanced(*pos),
            other => ExprError::Unexpected {
                found: other.to_string(),
                pos: *pos,
            },
        });
    }
    if !value.is_finite() {
        return Err(ExprError::NonFinite);
    }
    Ok(value)
}

/// Render a result the way a calculator would: `4`, `0.5`, `1e+21`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if (1e-6..1e21).contains(&abs) {
        return value.to_string();
    }
    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    Caret,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{n}"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Pow => f.write_str("**"),
            Token::Caret => f.write_str("^"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::BadNumber(literal.clone()))?;
                tokens.push((Token::Num(value), start));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Pow
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(ExprError::Unexpected {
                    found: other.to_string(),
                    pos: start,
                })
            }
        };
        tokens.push((token, start));
        i += 1;
    }
    Ok(tokens)
}

/// ECMAScript ToInt32: truncate, wrap modulo 2^32, reinterpret as signed.
fn to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn xor(&mut self) -> Result<f64, ExprError> {
        let mut value = self.sum()?;
        while self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let rhs = self.sum()?;
            value = f64::from(to_int32(value) ^ to_int32(rhs));
        }
        Ok(value)
    }

    fn sum(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                Token::Percent => {
                    self.pos += 1;
                    value %= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    /// Every nested level passes through here, so the depth is counted once.
    fn unary(&mut self) -> Result<f64, ExprError> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            Err(ExprError::TooDeep(MAX_DEPTH))
        } else {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    self.signed()
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    self.signed().map(|v| -v)
                }
                _ => self.power(),
            }
        };
        self.depth -= 1;
        result
    }

    /// Operand of a prefix sign. `-2 ** 2` is ambiguous and rejected.
    fn signed(&mut self) -> Result<f64, ExprError> {
        let value = match self.peek() {
            Some(Token::Plus | Token::Minus) => self.unary()?,
            _ => self.primary()?,
        };
        if let Some((Token::Pow, pos)) = self.tokens.get(self.pos) {
            return Err(ExprError::Unexpected {
                found: Token::Pow.to_string(),
                pos: *pos,
            });
        }
        Ok(value)
    }

    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.next() {
            Some((Token::Num(n), _)) => Ok(n),
            Some((Token::LParen, open)) => {
                let value = self.xor()?;
                match self.next() {
                    Some((Token::RParen, _)) => Ok(value),
                    Some((tok, pos)) => Err(ExprError::Unexpected {
                        found: tok.to_string(),
                        pos,
                    }),
                    None => Err(ExprError::Unbalanced(open)),
                }
            }
            Some((tok, pos)) => Err(ExprError::Unexpected {
                found: tok.to_string(),
                pos,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
