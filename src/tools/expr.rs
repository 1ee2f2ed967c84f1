//! Arithmetic expression evaluator used by the math tool.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "%") unary)*
//! unary   := ("+" | "-") unary | power
//! power   := primary (("^" | "**") unary)?
//! primary := number | ident | ident "(" expr ("," expr)* ")" | "(" expr ")"
//! ```
//!
//! Exponentiation is right-associative and binds tighter than unary minus,
//! so `-2^2` is `-4` and `2^3^2` is `512`. Nesting deeper than
//! [`MAX_DEPTH`] is rejected with [`EvalError::TooDeep`].

use std::f64::consts;

use thiserror::Error;

/// Deepest nesting of parentheses, calls, signs and exponents accepted.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("{name}() takes {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression is nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Caret => f.write_str("^"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' | '−' => Token::Minus,
                    '*' | '×' => Token::Star,
                    '/' | '÷' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    other => return Err(EvalError::UnexpectedChar(other, i)),
                };
                tokens.push(token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
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

    fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(EvalError::UnexpectedToken(t.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value %= rhs;
                }
                _ => return Ok(value),
            }
        }
    }

    // Every recursive path (parentheses, call arguments, signs, exponents)
    // re-enters through here, so this is the only depth check needed.
    fn unary(&mut self) -> Result<f64, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.arguments()?;
                    call_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(EvalError::UnexpectedToken(t.to_string())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>, EvalError> {
        let mut args = vec![self.expr()?];
        loop {
            match self.next() {
                Some(Token::Comma) => args.push(self.expr()?),
                Some(Token::RParen) => return Ok(args),
                Some(t) => return Err(EvalError::UnexpectedToken(t.to_string())),
                None => return Err(EvalError::UnexpectedEnd),
            }
        }
    }
}

fn constant(name: &str) -> Result<f64, EvalError> {
    match name.to_lowercase().as_str() {
        "pi" => Ok(consts::PI),
        "e" => Ok(consts::E),
        "tau" => Ok(consts::TAU),
        _ => Err(EvalError::UnknownIdentifier(name.to_string())),
    }
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let lower = name.to_lowercase();
    let unary: Option<fn(f64) -> f64> = match lower.as_str() {
        "sqrt" => Some(f64::sqrt),
        "abs" => Some(f64::abs),
        "ln" => Some(f64::ln),
        "log10" => Some(f64::log10),
        "log2" => Some(f64::log2),
        "exp" => Some(f64::exp),
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "asin" | "arcsin" => Some(f64::asin),
        "acos" | "arccos" => Some(f64::acos),
        "atan" | "arctan" => Some(f64::atan),
        "floor" => Some(f64::floor),
        "ceil" => Some(f64::ceil),
        "round" => Some(f64::round),
        _ => None,
    };

    if let Some(f) = unary {
        return match args {
            [x] => Ok(f(*x)),
            _ => Err(EvalError::WrongArity {
                name: lower,
                expected: 1,
                got: args.len(),
            }),
        };
    }

    match (lower.as_str(), args) {
        // log(x) is the natural log; log(x, base) takes an explicit base
        ("log", [x]) => Ok(x.ln()),
        ("log", [x, base]) => Ok(x.log(*base)),
        ("log", _) => Err(EvalError::WrongArity {
            name: lower,
            expected: 2,
            got: args.len(),
        }),
        ("pow", [x, y]) => Ok(x.powf(*y)),
        ("min", [_, ..]) => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        ("max", [_, ..]) => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        ("pow", _) => Err(EvalError::WrongArity {
            name: lower,
            expected: 2,
            got: args.len(),
        }),
        _ => Err(EvalError::UnknownIdentifier(name.to_string())),
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::UnexpectedEnd);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(EvalError::UnexpectedToken(extra.to_string()));
    }
    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok(value)
}

/// Render a result the way a person would write it: integral values without
/// a decimal point, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> f64 {
        evaluate(s).unwrap_or_else(|e| panic!("{} failed: {}", s, e))
    }

    #[test]
    fn arithmetic_with_precedence() {
        assert_eq!(eval("12 * (7 + 3)"), 120.0);
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("7 % 4"), 3.0);
        assert_eq!(eval("37593 * 67"), 2518731.0);
    }

    #[test]
    fn exponentiation_rules() {
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("2**10"), 1024.0);
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("2^-1"), 0.5);
        assert!((eval("37593**(1/5)") - 8.222831614237718).abs() < 1e-12);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(eval("sqrt(144)"), 12.0);
        assert!((eval("sin(pi / 2)") - 1.0).abs() < 1e-12);
        assert!((eval("log(8, 2)") - 3.0).abs() < 1e-12);
        assert_eq!(eval("max(3, 9, 4)"), 9.0);
        assert_eq!(eval("round(2.5)"), 3.0);
        assert!((eval("1.5e3 + 2E-1") - 1500.2).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(evaluate(""), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("1 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("(1 + 2"), Err(EvalError::UnexpectedEnd));
        assert!(matches!(
            evaluate("What is two plus two"),
            Err(EvalError::UnknownIdentifier(_))
        ));
        assert!(matches!(evaluate("1 $ 2"), Err(EvalError::UnexpectedChar('$', 2))));
        assert!(matches!(evaluate("sqrt(1, 2)"), Err(EvalError::WrongArity { .. })));
        assert_eq!(evaluate("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("10^400"), Err(EvalError::NotFinite));
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&parens), Err(EvalError::TooDeep));

        let signs = format!("{}1", "-".repeat(10_000));
        assert_eq!(evaluate(&signs), Err(EvalError::TooDeep));

        let calls = format!("{}1{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&calls), Err(EvalError::TooDeep));

        let powers = vec!["1"; 10_000].join("^");
        assert_eq!(evaluate(&powers), Err(EvalError::TooDeep));

        let within = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&within), Ok(1.0));
    }

    #[test]
    fn formats_integral_results_without_decimal_point() {
        assert_eq!(format_number(120.0), "120");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }
}
