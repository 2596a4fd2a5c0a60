//! Quantity and unit expression parsing - "10 km/hr", "kg*m/s^2", "W/(m² K)"
//!
//! ```text
//! quantity  := number? unit_expr?
//! unit_expr := term (('*' | '·' | '/' | <space>) term)*
//! term      := atom ('^' exponent | superscript)?
//! atom      := name | '(' unit_expr ')' | '1'
//! exponent  := sign? int ('/' int)? | '(' sign? int ('/' int)? ')'
//! ```
//!
//! Operators are left-associative, so `m/s/s` is `m s^-2` and `a/b*c` is
//! `(a/b)*c`. `**` is accepted as a synonym for `^`. Positions in errors
//! are character offsets into the input.

use std::sync::Arc;
use num_traits::Zero;
use quanta_core::{exponent, Exponent, QuantaError, Result};
use crate::dimension::{combine, raise, single, UnitMap};
use crate::registry::PrefixedUnit;
use crate::{Quantity, UnitRegistry};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(String),
    Name(String),
    Superscript(Exponent),
    Star,
    Slash,
    Caret,
    Plus,
    Minus,
    LParen,
    RParen,
    End,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn is_operator(c: char) -> bool {
    matches!(c, '*' | '·' | '/' | '^' | '(' | ')' | '+' | '-')
}

fn superscript_digit(c: char) -> Option<i64> {
    match c {
        '⁰' => Some(0),
        '¹' => Some(1),
        '²' => Some(2),
        '³' => Some(3),
        '⁴' => Some(4),
        '⁵' => Some(5),
        '⁶' => Some(6),
        '⁷' => Some(7),
        '⁸' => Some(8),
        '⁹' => Some(9),
        _ => None,
    }
}

fn is_superscript(c: char) -> bool {
    c == '⁻' || c == '⁺' || superscript_digit(c).is_some()
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !is_operator(c) && !is_superscript(c)
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> QuantaError {
        QuantaError::parse(self.input, position, reason)
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek_at(0) {
            let start = self.pos;

            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            let kind = match c {
                '*' if self.peek_at(1) == Some('*') => {
                    self.pos += 2;
                    TokenKind::Caret
                }
                '*' | '·' => {
                    self.pos += 1;
                    TokenKind::Star
                }
                '/' => {
                    self.pos += 1;
                    TokenKind::Slash
                }
                '^' => {
                    self.pos += 1;
                    TokenKind::Caret
                }
                '+' => {
                    self.pos += 1;
                    TokenKind::Plus
                }
                '-' => {
                    self.pos += 1;
                    TokenKind::Minus
                }
                '(' => {
                    self.pos += 1;
                    TokenKind::LParen
                }
                ')' => {
                    self.pos += 1;
                    TokenKind::RParen
                }
                c if c.is_ascii_digit() || c == '.' => self.number()?,
                c if is_superscript(c) => self.superscript()?,
                _ => self.name(),
            };

            tokens.push(Token { kind, position: start });
        }

        tokens.push(Token {
            kind: TokenKind::End,
            position: self.chars.len(),
        });
        Ok(tokens)
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek_at(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let mut count = self.digits();
        if self.peek_at(0) == Some('.') {
            self.pos += 1;
            count += self.digits();
        }
        if count == 0 {
            return Err(self.error(start, "expected digits"));
        }

        // exponent marker only when digits follow: "5em" is 5 then "em"
        if matches!(self.peek_at(0), Some('e' | 'E')) {
            let digit_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.digits();
            }
        }

        Ok(TokenKind::Number(self.chars[start..self.pos].iter().collect()))
    }

    fn superscript(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let negative = match self.peek_at(0) {
            Some('⁻') => {
                self.pos += 1;
                true
            }
            Some('⁺') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        let mut value: i64 = 0;
        let mut count = 0;
        while let Some(d) = self.peek_at(0).and_then(superscript_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(d))
                .ok_or_else(|| self.error(start, "superscript exponent too large"))?;
            self.pos += 1;
            count += 1;
        }
        if count == 0 {
            return Err(self.error(start, "superscript sign without digits"));
        }

        Ok(TokenKind::Superscript(exponent(if negative { -value } else { value })))
    }

    fn name(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek_at(0).is_some_and(is_name_char) {
            self.pos += 1;
        }
        TokenKind::Name(self.chars[start..self.pos].iter().collect())
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a UnitRegistry,
    /// Prefixed names seen so far, registered only once the whole input parses
    pending: Vec<PrefixedUnit>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, registry: &'a UnitRegistry) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser {
            input,
            tokens,
            pos: 0,
            registry,
            pending: Vec::new(),
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, reason: impl Into<String>) -> QuantaError {
        QuantaError::parse(self.input, token.position, reason)
    }

    fn in_range(&self, position: usize, units: Result<UnitMap>) -> Result<UnitMap> {
        units.map_err(|_| QuantaError::parse(self.input, position, "unit exponent out of range"))
    }

    fn unexpected(&self, token: &Token, expected: &str) -> QuantaError {
        let found = match &token.kind {
            TokenKind::End => "end of input".to_string(),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Name(n) => format!("unit {}", n),
            TokenKind::Superscript(e) => format!("superscript {}", e),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Caret => "'^'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        };
        self.error_at(token, format!("expected {}, found {}", expected, found))
    }

    fn expect_end(&mut self) -> Result<()> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::End => Ok(()),
            _ => Err(self.unexpected(&token, "operator or end of input")),
        }
    }

    /// `number? unit_expr?`
    fn quantity(&mut self) -> Result<(f64, UnitMap)> {
        if matches!(self.peek().kind, TokenKind::End) {
            let token = self.peek().clone();
            return Err(self.error_at(&token, "empty input"));
        }

        let value = match self.peek().kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Number(_) => Some(self.signed_number()?),
            _ => None,
        };

        let at_end = matches!(self.peek().kind, TokenKind::End);
        let at_operator = matches!(self.peek().kind, TokenKind::Slash | TokenKind::Star);
        let units = if at_end {
            UnitMap::new()
        } else if value.is_some() && at_operator {
            // "5/s" reads as 5 s^-1
            self.unit_expr_from(UnitMap::new())?
        } else {
            self.unit_expr()?
        };
        self.expect_end()?;

        Ok((value.unwrap_or(1.0), units))
    }

    fn signed_number(&mut self) -> Result<f64> {
        let negative = match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Plus => {
                self.advance();
                false
            }
            _ => false,
        };

        let token = self.advance();
        let value = match &token.kind {
            TokenKind::Number(text) => text
                .parse::<f64>()
                .map_err(|_| self.error_at(&token, format!("invalid number {}", text)))?,
            _ => return Err(self.unexpected(&token, "number")),
        };
        Ok(if negative { -value } else { value })
    }

    fn unit_expr(&mut self) -> Result<UnitMap> {
        let first = self.term()?;
        self.unit_expr_from(first)
    }

    fn unit_expr_from(&mut self, mut acc: UnitMap) -> Result<UnitMap> {
        loop {
            match self.peek().kind {
                TokenKind::Star => {
                    let op = self.advance();
                    let rhs = self.term()?;
                    acc = self.in_range(op.position, combine(&acc, &rhs, 1))?;
                }
                TokenKind::Slash => {
                    let op = self.advance();
                    let rhs = self.term()?;
                    acc = self.in_range(op.position, combine(&acc, &rhs, -1))?;
                }
                // implicit multiplication
                TokenKind::Name(_) | TokenKind::LParen | TokenKind::Number(_) => {
                    let position = self.peek().position;
                    let rhs = self.term()?;
                    acc = self.in_range(position, combine(&acc, &rhs, 1))?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<UnitMap> {
        let atom = self.atom()?;
        match self.peek().kind {
            TokenKind::Caret => {
                let caret = self.advance();
                let power = self.exponent()?;
                self.in_range(caret.position, raise(&atom, power))
            }
            TokenKind::Superscript(power) => {
                let token = self.advance();
                self.in_range(token.position, raise(&atom, power))
            }
            _ => Ok(atom),
        }
    }

    fn atom(&mut self) -> Result<UnitMap> {
        let token = self.advance();
        match &token.kind {
            TokenKind::Name(name) => {
                let (_, prefixed) = self.registry.lookup(name)?;
                if let Some(unit) = prefixed {
                    if !self.pending.iter().any(|p| p.name == unit.name) {
                        self.pending.push(unit);
                    }
                }
                Ok(single(name))
            }
            TokenKind::LParen => {
                let inner = self.unit_expr()?;
                let close = self.advance();
                match close.kind {
                    TokenKind::RParen => Ok(inner),
                    _ => Err(self.unexpected(&close, "')'")),
                }
            }
            TokenKind::Number(text) if text == "1" => Ok(UnitMap::new()),
            TokenKind::Number(text) => Err(self.error_at(
                &token,
                format!("numeric factor {} inside a unit expression", text),
            )),
            _ => Err(self.unexpected(&token, "unit name or '('")),
        }
    }

    /// Exponent after `^`: `2`, `-1`, `1/2`, `(-3/2)`
    fn exponent(&mut self) -> Result<Exponent> {
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            let value = self.ratio(true)?;
            let close = self.advance();
            return match close.kind {
                TokenKind::RParen => Ok(value),
                _ => Err(self.unexpected(&close, "')'")),
            };
        }
        self.ratio(false)
    }

    /// `sign? int ('/' int)?`. Outside parentheses the slash belongs to the
    /// exponent only when an integer follows it, so `m^2/s` keeps its
    /// division.
    fn ratio(&mut self, parenthesized: bool) -> Result<Exponent> {
        let negative = match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Plus => {
                self.advance();
                false
            }
            _ => false,
        };

        let numer = self.integer()?;
        let numer = if negative { -numer } else { numer };

        let is_ratio = matches!(self.peek().kind, TokenKind::Slash)
            && (parenthesized || matches!(self.peek_kind_at(1), TokenKind::Number(_)));
        if !is_ratio {
            return Ok(exponent(numer));
        }

        self.advance();
        let denom_token = self.peek().clone();
        let denom = self.integer()?;
        if denom.is_zero() {
            return Err(self.error_at(&denom_token, "zero denominator in exponent"));
        }
        Ok(Exponent::new(numer, denom))
    }

    fn integer(&mut self) -> Result<i64> {
        let token = self.advance();
        match &token.kind {
            TokenKind::Number(text) if text.chars().all(|c| c.is_ascii_digit()) => text
                .parse::<i64>()
                .map_err(|_| self.error_at(&token, format!("exponent {} out of range", text))),
            TokenKind::Number(text) => Err(self.error_at(
                &token,
                format!("exponent {} must be an integer or a ratio of integers", text),
            )),
            _ => Err(self.unexpected(&token, "integer exponent")),
        }
    }
}

impl UnitRegistry {
    /// Parse a quantity such as `"10 km/hr"` or `"9.81 m/s²"`.
    ///
    /// A missing number means 1; a missing unit means dimensionless.
    /// Prefixed names (`kilometer`) are resolved on demand and registered
    /// only if the whole input parses.
    pub fn parse(self: &Arc<Self>, input: &str) -> Result<Quantity> {
        let mut parser = Parser::new(input, self)?;
        let (value, units) = parser.quantity()?;
        self.register_prefixed(&parser.pending)?;
        Ok(Quantity::from_parts(value, units, self))
    }

    /// Parse a unit expression such as `"kg*m/s^2"` into an exponent map
    pub fn parse_units(&self, input: &str) -> Result<UnitMap> {
        let (units, prefixed) = self.parse_unit_expr(input)?;
        self.register_prefixed(&prefixed)?;
        Ok(units)
    }

    /// Parse a unit expression, returning the prefixed names it uses
    /// without registering them
    pub(crate) fn parse_unit_expr(&self, input: &str) -> Result<(UnitMap, Vec<PrefixedUnit>)> {
        let mut parser = Parser::new(input, self)?;
        if matches!(parser.peek().kind, TokenKind::End) {
            let token = parser.peek().clone();
            return Err(parser.error_at(&token, "empty unit expression"));
        }
        let units = parser.unit_expr()?;
        parser.expect_end()?;
        Ok((units, parser.pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::unit_map;

    fn registry() -> Arc<UnitRegistry> {
        let reg = UnitRegistry::new();
        reg.define_base("m").unwrap();
        reg.define_base("meter").unwrap();
        reg.define_scaled("km", "m", 1000.0).unwrap();
        reg.define_base("s").unwrap();
        reg.define_scaled("hr", "s", 3600.0).unwrap();
        reg.define_base("kg").unwrap();
        reg.define_base("K").unwrap();
        reg.define_base("W").unwrap();
        Arc::new(reg)
    }

    fn parse_error_position(err: QuantaError) -> usize {
        match err {
            QuantaError::Parse { position, .. } => position,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_quantity() {
        let reg = registry();
        let q = reg.parse("5 m").unwrap();
        assert_eq!(*q.value(), 5.0);
        assert_eq!(q.units(), &unit_map(&[("m", 1)]));

        let q = reg.parse("100kg").unwrap();
        assert_eq!(*q.value(), 100.0);
        assert_eq!(q.units(), &unit_map(&[("kg", 1)]));
    }

    #[test]
    fn test_parse_numbers() {
        let reg = registry();
        assert_eq!(*reg.parse("-3.5 m").unwrap().value(), -3.5);
        assert_eq!(*reg.parse("+2 m").unwrap().value(), 2.0);
        assert_eq!(*reg.parse("1.5e3 m").unwrap().value(), 1500.0);
        assert_eq!(*reg.parse("2E-2 s").unwrap().value(), 0.02);
        assert_eq!(*reg.parse(".5 s").unwrap().value(), 0.5);
    }

    #[test]
    fn test_parse_compound() {
        let reg = registry();
        let q = reg.parse("10 km/hr").unwrap();
        assert_eq!(*q.value(), 10.0);
        assert_eq!(q.units(), &unit_map(&[("km", 1), ("hr", -1)]));

        let force = reg.parse("50 kg * m / s^2").unwrap();
        assert_eq!(force.units(), &unit_map(&[("kg", 1), ("m", 1), ("s", -2)]));
    }

    #[test]
    fn test_parse_implicit_multiplication() {
        let reg = registry();
        let units = reg.parse_units("kg m s^-2").unwrap();
        assert_eq!(units, unit_map(&[("kg", 1), ("m", 1), ("s", -2)]));

        let units = reg.parse_units("W/(m^2 K)").unwrap();
        assert_eq!(units, unit_map(&[("W", 1), ("m", -2), ("K", -1)]));
    }

    #[test]
    fn test_left_associative() {
        let reg = registry();
        assert_eq!(reg.parse_units("m/s/s").unwrap(), unit_map(&[("m", 1), ("s", -2)]));
        assert_eq!(reg.parse_units("m/s*kg").unwrap(), unit_map(&[("m", 1), ("s", -1), ("kg", 1)]));
        assert_eq!(reg.parse_units("m/(s*kg)").unwrap(), unit_map(&[("m", 1), ("s", -1), ("kg", -1)]));
    }

    #[test]
    fn test_superscripts() {
        let reg = registry();
        let q = reg.parse("3 m²").unwrap();
        assert_eq!(q.units(), &unit_map(&[("m", 2)]));

        assert_eq!(reg.parse_units("s⁻¹").unwrap(), unit_map(&[("s", -1)]));
        assert_eq!(reg.parse_units("m/s²").unwrap(), unit_map(&[("m", 1), ("s", -2)]));
        assert_eq!(reg.parse_units("m·s").unwrap(), unit_map(&[("m", 1), ("s", 1)]));
    }

    #[test]
    fn test_rational_exponents() {
        let reg = registry();
        let units = reg.parse_units("m^1/2").unwrap();
        assert_eq!(units.get("m"), Some(&Exponent::new(1, 2)));

        let units = reg.parse_units("s^(-3/2)").unwrap();
        assert_eq!(units.get("s"), Some(&Exponent::new(-3, 2)));

        // slash followed by a unit is division
        assert_eq!(reg.parse_units("m^2/s").unwrap(), unit_map(&[("m", 2), ("s", -1)]));
        assert_eq!(reg.parse_units("m**3").unwrap(), unit_map(&[("m", 3)]));
    }

    #[test]
    fn test_one_and_dimensionless() {
        let reg = registry();
        assert_eq!(reg.parse_units("1/s").unwrap(), unit_map(&[("s", -1)]));

        let q = reg.parse("5/s").unwrap();
        assert_eq!(*q.value(), 5.0);
        assert_eq!(q.units(), &unit_map(&[("s", -1)]));

        let q = reg.parse("42").unwrap();
        assert!(q.is_dimensionless());

        let q = reg.parse("km").unwrap();
        assert_eq!(*q.value(), 1.0);

        // cancellation prunes the key
        assert!(reg.parse_units("m/m").unwrap().is_empty());
    }

    #[test]
    fn test_prefixed_names() {
        let reg = registry();
        let q = reg.parse("3 kilometer").unwrap();
        assert_eq!(q.units(), &unit_map(&[("kilometer", 1)]));
        assert_relative_eq!(*q.to("meter").unwrap().value(), 3000.0);
    }

    #[test]
    fn test_failed_parse_registers_nothing() {
        let reg = registry();
        assert!(reg.parse("3 kilometer furlong").is_err());
        assert!(reg.parse_units("kilometer/").is_err());
        assert!(!reg.contains("kilometer"));

        reg.parse_units("kilometer/millimeter").unwrap();
        assert!(reg.contains("kilometer"));
        assert!(reg.contains("millimeter"));
    }

    #[test]
    fn test_exponent_overflow_is_a_parse_error() {
        let reg = registry();
        let err = reg.parse_units("m^9223372036854775807 m").unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::PARSE_ERROR);
        assert_eq!(parse_error_position(err), 22);

        let err = reg.parse_units("m^9223372036854775807/m^-1").unwrap_err();
        assert_eq!(parse_error_position(err), 21);

        let err = reg.parse_units("(m^9223372036854775807)^2").unwrap_err();
        assert_eq!(parse_error_position(err), 23);

        let err = reg.parse_units("(m^(1/3037000500))^(1/3037000500)").unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::PARSE_ERROR);
    }

    #[test]
    fn test_unknown_unit() {
        let reg = registry();
        let err = reg.parse("5 furlong").unwrap_err();
        assert_eq!(err, QuantaError::undefined_unit("furlong"));
    }

    #[test]
    fn test_error_positions() {
        let reg = registry();
        assert_eq!(parse_error_position(reg.parse("").unwrap_err()), 0);
        assert_eq!(parse_error_position(reg.parse("5 m/").unwrap_err()), 4);
        assert_eq!(parse_error_position(reg.parse("5 m^").unwrap_err()), 4);
        assert_eq!(parse_error_position(reg.parse("5 (m").unwrap_err()), 4);
        assert_eq!(parse_error_position(reg.parse("5 m)").unwrap_err()), 3);
        assert_eq!(parse_error_position(reg.parse("5 m 3").unwrap_err()), 4);
        assert_eq!(parse_error_position(reg.parse("5 m^1.5").unwrap_err()), 4);
        assert_eq!(parse_error_position(reg.parse("5 m^1/0").unwrap_err()), 6);
        assert_eq!(parse_error_position(reg.parse("- m").unwrap_err()), 2);
    }

    #[test]
    fn test_error_reports_input() {
        let reg = registry();
        let err = reg.parse_units("m^").unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::PARSE_ERROR);
        assert!(err.to_string().contains("\"m^\""));
        assert!(err.to_string().contains("integer exponent"));
    }
}
