//! Text expression parser.
//!
//! Parses the surface syntax used by expression library files into `Expr`
//! trees. The grammar is conventional infix arithmetic with function
//! calls:
//!
//! ```text
//! expr  := add
//! add   := mul (('+' | '-') mul)*
//! mul   := unary (('*' | '/') unary)*
//! unary := '-' unary | pow
//! pow   := atom ('^' unary)?            -- right-associative
//! atom  := number | '(' expr ')' | ident | ident '(' args ')'
//! ```
//!
//! Identifiers resolve against a `SymbolTable` of declared quantities,
//! geometries, and previously defined named expressions; the built-in
//! constants (`pi`, `tau`, `eps0`, `mu0`, `c0`) shadow nothing and are
//! checked first. An identifier followed by `(` is always a function
//! call. Geometry names may only appear as the final argument of a
//! reduction call.

use std::collections::HashMap;

use fc_core::{Real, ValueKind};
use thiserror::Error;

use crate::expr::{Expr, GeomRef, NamedConstant, NamedKinds};
use crate::op::{BinaryOp, GeomDomain, ReduceOp, UnaryOp};

pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while lexing or parsing expression text.
///
/// `at` is a byte offset into the source text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Empty expression")]
    Empty,

    #[error("Unexpected character '{ch}' at offset {at}")]
    UnexpectedChar { at: usize, ch: char },

    #[error("Invalid numeric literal at offset {at}")]
    InvalidNumber { at: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unexpected token at offset {at}: expected {expected}")]
    UnexpectedToken { at: usize, expected: &'static str },

    #[error("Unknown identifier '{name}' at offset {at}")]
    UnknownIdent { at: usize, name: String },

    #[error("Unknown function '{name}' at offset {at}")]
    UnknownFunction { at: usize, name: String },

    #[error("Function '{func}' expects {expected} argument(s), got {got} (offset {at})")]
    WrongArity {
        at: usize,
        func: String,
        expected: usize,
        got: usize,
    },

    #[error("Expected a geometry name at offset {at}")]
    ExpectedGeometry { at: usize },

    #[error("Geometry '{name}' cannot appear outside a reduction (offset {at})")]
    GeometryNotAllowed { at: usize, name: String },

    #[error("Expected a numeric literal argument at offset {at}")]
    ExpectedNumber { at: usize },

    #[error("Trailing input at offset {at}")]
    TrailingInput { at: usize },
}

/// Declared names an expression may reference.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    quantities: HashMap<String, ValueKind>,
    geometries: HashMap<String, GeomDomain>,
    named: HashMap<String, ValueKind>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field quantity; returns false if the name is taken.
    pub fn add_quantity(&mut self, name: impl Into<String>, kind: ValueKind) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.quantities.insert(name, kind);
        true
    }

    /// Declare a geometry; returns false if the name is taken.
    pub fn add_geometry(&mut self, name: impl Into<String>, domain: GeomDomain) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.geometries.insert(name, domain);
        true
    }

    /// Record a defined named expression; returns false if the name is taken.
    pub fn add_named(&mut self, name: impl Into<String>, kind: ValueKind) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.named.insert(name, kind);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.quantities.contains_key(name)
            || self.geometries.contains_key(name)
            || self.named.contains_key(name)
    }

    pub fn quantity_kind(&self, name: &str) -> Option<ValueKind> {
        self.quantities.get(name).copied()
    }

    pub fn geometry_domain(&self, name: &str) -> Option<GeomDomain> {
        self.geometries.get(name).copied()
    }

    pub fn named_kind(&self, name: &str) -> Option<ValueKind> {
        self.named.get(name).copied()
    }
}

impl NamedKinds for SymbolTable {
    fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.named_kind(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Real),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn lex(text: &str) -> ParseResult<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '^' => {
                tokens.push((i, Token::Caret));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                // optional exponent
                if i < bytes.len() && matches!(bytes[i] as char, 'e' | 'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && matches!(bytes[j] as char, '+' | '-') {
                        j += 1;
                    }
                    if j < bytes.len() && (bytes[j] as char).is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let value: Real = text[start..i]
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber { at: start })?;
                tokens.push((start, Token::Num(value)));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(text[start..i].to_string())));
            }
            _ => return Err(ParseError::UnexpectedChar { at: i, ch: c }),
        }
    }

    Ok(tokens)
}

/// Parse expression text against a symbol table.
pub fn parse_expression(text: &str, symbols: &SymbolTable) -> ParseResult<Expr> {
    let tokens = lex(text)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        symbols,
    };
    let expr = parser.parse_add()?;
    if let Some((at, _)) = parser.peek() {
        return Err(ParseError::TrailingInput { at });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    symbols: &'a SymbolTable,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.pos).map(|(at, t)| (*at, t))
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn consume(&mut self, token: &Token) -> bool {
        if let Some((_, t)) = self.peek()
            && t == token
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> ParseResult<()> {
        match self.advance() {
            Some((_, t)) if t == token => Ok(()),
            Some((at, _)) => Err(ParseError::UnexpectedToken { at, expected }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_add(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_mul()?;
        loop {
            if self.consume(&Token::Plus) {
                let rhs = self.parse_mul()?;
                expr = Expr::binary(BinaryOp::Add, expr, rhs);
                continue;
            }
            if self.consume(&Token::Minus) {
                let rhs = self.parse_mul()?;
                expr = Expr::binary(BinaryOp::Sub, expr, rhs);
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_mul(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            if self.consume(&Token::Star) {
                let rhs = self.parse_unary()?;
                expr = Expr::binary(BinaryOp::Mul, expr, rhs);
                continue;
            }
            if self.consume(&Token::Slash) {
                let rhs = self.parse_unary()?;
                expr = Expr::binary(BinaryOp::Div, expr, rhs);
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.consume(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::unary(UnaryOp::Neg, operand));
        }
        self.parse_pow()
    }

    fn parse_pow(&mut self) -> ParseResult<Expr> {
        let base = self.parse_atom()?;
        if self.consume(&Token::Caret) {
            // right-associative: exponent re-enters at unary level
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Some((_, Token::Num(value))) => Ok(Expr::literal(value)),
            Some((_, Token::LParen)) => {
                let expr = self.parse_add()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Some((at, Token::Ident(name))) => {
                if self.consume(&Token::LParen) {
                    self.parse_call(at, &name)
                } else {
                    self.resolve_ident(at, &name)
                }
            }
            Some((at, _)) => Err(ParseError::UnexpectedToken {
                at,
                expected: "a number, identifier, or '('",
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn resolve_ident(&self, at: usize, name: &str) -> ParseResult<Expr> {
        if let Some(c) = NamedConstant::from_label(name) {
            return Ok(Expr::constant(c));
        }
        if let Some(kind) = self.symbols.quantity_kind(name) {
            return Ok(Expr::quantity(name, kind));
        }
        if self.symbols.named_kind(name).is_some() {
            return Ok(Expr::named(name));
        }
        if self.symbols.geometry_domain(name).is_some() {
            return Err(ParseError::GeometryNotAllowed {
                at,
                name: name.to_string(),
            });
        }
        Err(ParseError::UnknownIdent {
            at,
            name: name.to_string(),
        })
    }

    /// Parse a function call; the name and opening paren are consumed.
    fn parse_call(&mut self, at: usize, name: &str) -> ParseResult<Expr> {
        if let Some(op) = unary_function(name) {
            let mut args = self.parse_expr_args(at, name, 1)?;
            let operand = args.pop().expect("arity checked");
            return Ok(Expr::unary(op, operand));
        }
        if let Some(op) = binary_function(name) {
            let mut args = self.parse_expr_args(at, name, 2)?;
            let rhs = args.pop().expect("arity checked");
            let lhs = args.pop().expect("arity checked");
            return Ok(Expr::binary(op, lhs, rhs));
        }
        if let Some(op) = reduce_function(name) {
            return self.parse_reduction(at, name, op);
        }
        match name {
            "complex" => {
                let args = self.parse_expr_args(at, name, 2)?;
                let re = expect_number(&args[0], at)?;
                let im = expect_number(&args[1], at)?;
                Ok(Expr::complex(re, im))
            }
            "vector" => {
                let args = self.parse_expr_args(at, name, 3)?;
                let x = expect_number(&args[0], at)?;
                let y = expect_number(&args[1], at)?;
                let z = expect_number(&args[2], at)?;
                Ok(Expr::vector(x, y, z))
            }
            _ => Err(ParseError::UnknownFunction {
                at,
                name: name.to_string(),
            }),
        }
    }

    fn parse_expr_args(
        &mut self,
        at: usize,
        func: &str,
        expected: usize,
    ) -> ParseResult<Vec<Expr>> {
        let mut args = vec![self.parse_add()?];
        while self.consume(&Token::Comma) {
            args.push(self.parse_add()?);
        }
        self.expect(Token::RParen, "')'")?;
        if args.len() != expected {
            return Err(ParseError::WrongArity {
                at,
                func: func.to_string(),
                expected,
                got: args.len(),
            });
        }
        Ok(args)
    }

    fn parse_reduction(&mut self, at: usize, func: &str, op: ReduceOp) -> ParseResult<Expr> {
        let operand = self.parse_add()?;
        self.expect(Token::Comma, "',' before the geometry name")?;
        let (geom_at, geom_name) = match self.advance() {
            Some((at, Token::Ident(name))) => (at, name),
            Some((at, _)) => return Err(ParseError::ExpectedGeometry { at }),
            None => return Err(ParseError::UnexpectedEnd),
        };
        let domain = self
            .symbols
            .geometry_domain(&geom_name)
            .ok_or(ParseError::ExpectedGeometry { at: geom_at })?;
        match self.advance() {
            Some((_, Token::RParen)) => {}
            Some((_, Token::Comma)) => {
                return Err(ParseError::WrongArity {
                    at,
                    func: func.to_string(),
                    expected: 2,
                    got: 3,
                });
            }
            Some((at, _)) => {
                return Err(ParseError::UnexpectedToken {
                    at,
                    expected: "')'",
                });
            }
            None => return Err(ParseError::UnexpectedEnd),
        }
        Ok(Expr::reduce(op, GeomRef::new(geom_name, domain), operand))
    }
}

fn unary_function(name: &str) -> Option<UnaryOp> {
    Some(match name {
        "abs" => UnaryOp::Abs,
        "sqrt" => UnaryOp::Sqrt,
        "exp" => UnaryOp::Exp,
        "ln" => UnaryOp::Ln,
        "log10" => UnaryOp::Log10,
        "sin" => UnaryOp::Sin,
        "cos" => UnaryOp::Cos,
        "tan" => UnaryOp::Tan,
        "asin" => UnaryOp::Asin,
        "acos" => UnaryOp::Acos,
        "atan" => UnaryOp::Atan,
        "real" => UnaryOp::Real,
        "imag" => UnaryOp::Imag,
        "conj" => UnaryOp::Conj,
        "phase" => UnaryOp::Phase,
        "mag" => UnaryOp::Mag,
        "normalize" => UnaryOp::Normalize,
        "comp_x" => UnaryOp::CompX,
        "comp_y" => UnaryOp::CompY,
        "comp_z" => UnaryOp::CompZ,
        _ => return None,
    })
}

fn binary_function(name: &str) -> Option<BinaryOp> {
    Some(match name {
        "pow" => BinaryOp::Pow,
        "atan2" => BinaryOp::Atan2,
        "min" => BinaryOp::Min,
        "max" => BinaryOp::Max,
        "dot" => BinaryOp::Dot,
        "cross" => BinaryOp::Cross,
        _ => return None,
    })
}

fn reduce_function(name: &str) -> Option<ReduceOp> {
    Some(match name {
        "integrate" => ReduceOp::Integrate,
        "maximum" => ReduceOp::Maximum,
        "minimum" => ReduceOp::Minimum,
        "mean" => ReduceOp::Mean,
        _ => return None,
    })
}

/// Literal arguments for `complex(...)` / `vector(...)`, with unary minus.
fn expect_number(expr: &Expr, at: usize) -> ParseResult<Real> {
    match expr {
        Expr::Literal(v) => Ok(*v),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match operand.as_ref() {
            Expr::Literal(v) => Ok(-v),
            _ => Err(ParseError::ExpectedNumber { at }),
        },
        _ => Err(ParseError::ExpectedNumber { at }),
    }
}
