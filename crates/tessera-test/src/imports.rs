//! Import declaration scanner
//!
//! Only the leading `import` declarations of a program are tokenised.
//! Pragmas (`#name...`) may appear among them and are skipped. The scanner
//! stops at the first other token, so the rest of the source never has to
//! be valid for this lexer.

use crate::config::Configuration;
use crate::location::Location;
use logos::Logos;
use std::borrow::Cow;
use std::iter::Peekable;
use std::ops::Range;
use tessera_primitives::Address;
use thiserror::Error;

/// Malformed import declaration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid import at offset {offset}: {message}")]
pub struct ImportSyntaxError {
    /// Description of the problem
    pub message: String,
    /// Byte offset into the source
    pub offset: usize,
}

impl ImportSyntaxError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token<'s> {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    #[regex(r"#[^\n]*")]
    Pragma,

    #[token("import")]
    Import,

    #[token(",")]
    Comma,

    #[regex(r"0x[0-9a-fA-F]+", |lex| lex.slice())]
    AddressLit(&'s str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    StringLit(&'s str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'s str),
}

/// One `import` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Imported names (`import A, B from 0x1`), empty for bare imports
    pub identifiers: Vec<String>,
    /// Imported location
    pub location: Location,
    /// Byte range of the location token
    pub location_range: Range<usize>,
    /// Byte range of the whole declaration
    pub range: Range<usize>,
}

impl ImportDeclaration {
    /// Locations this declaration resolves to
    ///
    /// Address imports name one contract per identifier.
    pub fn locations(&self) -> Vec<Location> {
        match &self.location {
            Location::Address { address, .. } if !self.identifiers.is_empty() => self
                .identifiers
                .iter()
                .map(|name| Location::address(*address, name.clone()))
                .collect(),
            location => vec![location.clone()],
        }
    }
}

type Tokens<'s> = Peekable<logos::SpannedIter<'s, Token<'s>>>;

fn unquote(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_address(literal: &str, offset: usize) -> Result<Address, ImportSyntaxError> {
    Address::from_hex(literal).map_err(|e| ImportSyntaxError::new(e.to_string(), offset))
}

fn expect_location(
    tokens: &mut Tokens<'_>,
    end: usize,
) -> Result<(Location, Range<usize>), ImportSyntaxError> {
    match tokens.next() {
        Some((Ok(Token::StringLit(s)), span)) => Ok((Location::String(unquote(s)), span)),
        Some((Ok(Token::AddressLit(a)), span)) => {
            let address = parse_address(a, span.start)?;
            Ok((Location::address(address, ""), span))
        }
        Some((Ok(Token::Ident(name)), span)) => Ok((Location::identifier(name), span)),
        Some((_, span)) => Err(ImportSyntaxError::new("expected import location", span.start)),
        None => Err(ImportSyntaxError::new("expected import location", end)),
    }
}

fn parse_declaration(
    tokens: &mut Tokens<'_>,
    start: usize,
    end: usize,
) -> Result<ImportDeclaration, ImportSyntaxError> {
    let (first, first_span) = match tokens.next() {
        Some((Ok(Token::StringLit(s)), span)) => (Location::String(unquote(s)), span),
        Some((Ok(Token::AddressLit(a)), span)) => {
            (Location::address(parse_address(a, span.start)?, ""), span)
        }
        Some((Ok(Token::Ident(name)), span)) => {
            let mut identifiers = vec![name.to_string()];
            while let Some((Ok(Token::Comma), _)) = tokens.peek() {
                tokens.next();
                match tokens.next() {
                    Some((Ok(Token::Ident(name)), _)) => identifiers.push(name.to_string()),
                    Some((_, span)) => {
                        return Err(ImportSyntaxError::new("expected identifier", span.start))
                    }
                    None => return Err(ImportSyntaxError::new("expected identifier", end)),
                }
            }

            if let Some((Ok(Token::Ident("from")), _)) = tokens.peek() {
                tokens.next();
                let (location, location_range) = expect_location(tokens, end)?;
                let range = start..location_range.end;
                return Ok(ImportDeclaration {
                    identifiers,
                    location,
                    location_range,
                    range,
                });
            }
            if identifiers.len() > 1 {
                return Err(ImportSyntaxError::new("expected `from`", span.end));
            }
            (Location::Identifier(Cow::Owned(name.to_string())), span)
        }
        Some((_, span)) => return Err(ImportSyntaxError::new("expected import location", span.start)),
        None => return Err(ImportSyntaxError::new("expected import location", end)),
    };

    Ok(ImportDeclaration {
        identifiers: Vec::new(),
        location: first,
        range: start..first_span.end,
        location_range: first_span,
    })
}

/// Scan the leading import declarations of `code`
pub fn scan_imports(code: &str) -> Result<Vec<ImportDeclaration>, ImportSyntaxError> {
    let mut tokens: Tokens<'_> = Token::lexer(code).spanned().peekable();
    let mut declarations = Vec::new();

    loop {
        match tokens.peek().cloned() {
            Some((Ok(Token::Pragma), _)) => {
                tokens.next();
            }
            Some((Ok(Token::Import), span)) => {
                tokens.next();
                declarations.push(parse_declaration(&mut tokens, span.start, code.len())?);
            }
            _ => return Ok(declarations),
        }
    }
}

/// Point configured path imports at their deployed addresses
///
/// Every string location with an entry in `configuration` is replaced by the
/// `0x`-prefixed 16-digit address; all other bytes are kept as written.
pub fn rewrite_imports(code: &str, configuration: &Configuration) -> Result<String, ImportSyntaxError> {
    let declarations = scan_imports(code)?;

    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for declaration in &declarations {
        let Location::String(path) = &declaration.location else {
            continue;
        };
        let Some(address) = configuration.address_of(path) else {
            continue;
        };
        out.push_str(&code[cursor..declaration.location_range.start]);
        out.push_str("0x");
        out.push_str(&address.hex());
        cursor = declaration.location_range.end;
    }
    out.push_str(&code[cursor..]);
    Ok(out)
}
