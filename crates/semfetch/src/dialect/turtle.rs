// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Turtle / N3 / N-Triples interpreter.
//!
//! N-Triples is a subset of Turtle and goes through the same parser. Of N3
//! only the Turtle-compatible core plus `=` (owl:sameAs) is accepted;
//! formulae and rules are rejected as syntax errors.

use super::{Interpreter, ParseError, ParseTarget};
use crate::store::{vocab, Literal, Term, Triple};
use crate::uri;
use std::collections::HashMap;

pub struct TurtleInterpreter;

impl Interpreter for TurtleInterpreter {
    fn interpret(&self, target: &ParseTarget, body: &str) -> Result<Vec<Triple>, ParseError> {
        let mut parser = TurtleParser::new(body, &target.base);
        parser.parse_document()?;
        Ok(parser.triples)
    }
}

struct TurtleParser {
    chars: Vec<char>,
    pos: usize,
    base: String,
    prefixes: HashMap<String, String>,
    triples: Vec<Triple>,
    next_blank: usize,
}

type ParseResult<T> = Result<T, ParseError>;

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || (c as u32) > 0x7f
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || c == '\u{b7}'
}

impl TurtleParser {
    fn new(body: &str, base: &str) -> Self {
        Self {
            chars: body.chars().collect(),
            pos: 0,
            base: base.to_string(),
            prefixes: HashMap::new(),
            triples: Vec::new(),
            next_blank: 0,
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        let line = self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1;
        Err(ParseError::Syntax {
            line,
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn starts_with_keyword(&self, keyword: &str) -> bool {
        let len = keyword.chars().count();
        let matches = keyword
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)));
        matches && self.peek_at(len).is_none_or(|c| c.is_whitespace() || c == '<')
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => {
                self.pos -= 1;
                self.error(format!("expected '{expected}', found '{c}'"))
            }
            None => self.error(format!("expected '{expected}', found end of input")),
        }
    }

    fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::blank(format!("t{}", self.next_blank))
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term) {
        self.triples.push(Triple::new(subject, predicate, object));
    }

    fn parse_document(&mut self) -> ParseResult<()> {
        loop {
            self.skip_ws();
            if self.peek().is_none() {
                return Ok(());
            }
            self.statement()?;
        }
    }

    fn statement(&mut self) -> ParseResult<()> {
        if self.starts_with("@prefix") {
            self.pos += "@prefix".len();
            self.prefix_directive()?;
            return self.expect('.');
        }
        if self.starts_with("@base") {
            self.pos += "@base".len();
            self.base_directive()?;
            return self.expect('.');
        }
        if self.starts_with_keyword("prefix") {
            self.pos += "prefix".len();
            return self.prefix_directive();
        }
        if self.starts_with_keyword("base") {
            self.pos += "base".len();
            return self.base_directive();
        }
        if self.starts_with("@keywords")
            || self.starts_with("@forAll")
            || self.starts_with("@forSome")
        {
            return self.error("N3 quantifiers and keywords are not supported");
        }

        self.triples_statement()?;
        self.expect('.')
    }

    fn prefix_directive(&mut self) -> ParseResult<()> {
        self.skip_ws();
        let mut prefix = String::new();
        while let Some(c) = self.peek() {
            if c == ':' {
                break;
            }
            if !is_name_char(c) {
                return self.error(format!("invalid character '{c}' in prefix"));
            }
            prefix.push(c);
            self.pos += 1;
        }
        self.expect(':')?;
        self.skip_ws();
        let iri = self.iri_ref()?;
        self.prefixes.insert(prefix, iri);
        Ok(())
    }

    fn base_directive(&mut self) -> ParseResult<()> {
        self.skip_ws();
        self.base = self.iri_ref()?;
        Ok(())
    }

    fn triples_statement(&mut self) -> ParseResult<()> {
        self.skip_ws();
        if self.peek() == Some('[') {
            let subject = self.blank_node_property_list()?;
            self.skip_ws();
            if self.peek() != Some('.') {
                self.predicate_object_list(&subject)?;
            }
            return Ok(());
        }
        let subject = self.subject()?;
        self.predicate_object_list(&subject)
    }

    fn subject(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::named(self.iri_ref()?)),
            Some('(') => self.collection(),
            Some('{') => self.error("N3 formulae are not supported"),
            Some('_') if self.peek_at(1) == Some(':') => self.blank_label(),
            Some(_) => self.prefixed_name(),
            None => self.error("expected subject, found end of input"),
        }
    }

    fn predicate_object_list(&mut self, subject: &Term) -> ParseResult<()> {
        loop {
            self.skip_ws();
            let predicate = self.verb()?;
            self.object_list(subject, &predicate)?;
            self.skip_ws();
            if self.peek() != Some(';') {
                return Ok(());
            }
            while self.peek() == Some(';') {
                self.pos += 1;
                self.skip_ws();
            }
            if matches!(self.peek(), Some('.') | Some(']') | None) {
                return Ok(());
            }
        }
    }

    fn verb(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('a')
                if self
                    .peek_at(1)
                    .is_none_or(|c| c.is_whitespace() || c == '<' || c == '[') =>
            {
                self.pos += 1;
                Ok(vocab::rdf("type"))
            }
            Some('=') if self.peek_at(1) == Some('>') => self.error("N3 rules are not supported"),
            Some('=') => {
                self.pos += 1;
                Ok(vocab::owl("sameAs"))
            }
            Some('<') => Ok(Term::named(self.iri_ref()?)),
            Some(_) => self.prefixed_name(),
            None => self.error("expected predicate, found end of input"),
        }
    }

    fn object_list(&mut self, subject: &Term, predicate: &Term) -> ParseResult<()> {
        loop {
            let object = self.object()?;
            self.emit(subject.clone(), predicate.clone(), object);
            self.skip_ws();
            if self.peek() != Some(',') {
                return Ok(());
            }
            self.pos += 1;
        }
    }

    fn object(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::named(self.iri_ref()?)),
            Some('[') => self.blank_node_property_list(),
            Some('(') => self.collection(),
            Some('{') => self.error("N3 formulae are not supported"),
            Some('"') | Some('\'') => self.rdf_literal(),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => {
                self.numeric_literal()
            }
            Some('_') if self.peek_at(1) == Some(':') => self.blank_label(),
            Some(_) => {
                if self.starts_with_boolean("true") {
                    self.pos += 4;
                    return Ok(Term::typed_literal("true", vocab::xsd("boolean").value()));
                }
                if self.starts_with_boolean("false") {
                    self.pos += 5;
                    return Ok(Term::typed_literal("false", vocab::xsd("boolean").value()));
                }
                self.prefixed_name()
            }
            None => self.error("expected object, found end of input"),
        }
    }

    fn starts_with_boolean(&self, word: &str) -> bool {
        self.starts_with(word)
            && self
                .peek_at(word.len())
                .is_none_or(|c| !is_name_char(c) && c != ':')
    }

    fn blank_node_property_list(&mut self) -> ParseResult<Term> {
        self.expect('[')?;
        let node = self.fresh_blank();
        self.skip_ws();
        if self.peek() != Some(']') {
            self.predicate_object_list(&node)?;
        }
        self.expect(']')?;
        Ok(node)
    }

    fn collection(&mut self) -> ParseResult<Term> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                None => return self.error("unterminated collection"),
                _ => items.push(self.object()?),
            }
        }
        let mut head = vocab::rdf("nil");
        for item in items.into_iter().rev() {
            let cell = self.fresh_blank();
            self.emit(cell.clone(), vocab::rdf("first"), item);
            self.emit(cell.clone(), vocab::rdf("rest"), head);
            head = cell;
        }
        Ok(head)
    }

    fn blank_label(&mut self) -> ParseResult<Term> {
        self.pos += 2;
        let mut label = String::new();
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                label.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        while label.ends_with('.') {
            label.pop();
            self.pos -= 1;
        }
        if label.is_empty() {
            return self.error("empty blank node label");
        }
        Ok(Term::blank(format!("l_{label}")))
    }

    fn iri_ref(&mut self) -> ParseResult<String> {
        self.expect('<')?;
        let mut iri = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some('\\') => iri.push(self.unicode_escape()?),
                Some(c) if c == '\n' || c == ' ' => {
                    return self.error("whitespace inside IRI");
                }
                Some(c) => iri.push(c),
                None => return self.error("unterminated IRI"),
            }
        }
        Ok(uri::join(&self.base, &iri))
    }

    fn unicode_escape(&mut self) -> ParseResult<char> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return self.error("invalid escape in IRI"),
        };
        self.hex_char(width)
    }

    fn hex_char(&mut self, width: usize) -> ParseResult<char> {
        let mut code = 0u32;
        for _ in 0..width {
            let digit = self.bump().and_then(|c| c.to_digit(16));
            match digit {
                Some(d) => code = code * 16 + d,
                None => return self.error("invalid hex escape"),
            }
        }
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => self.error("escape is not a valid character"),
        }
    }

    fn prefixed_name(&mut self) -> ParseResult<Term> {
        let start = self.pos;
        let mut prefix = String::new();
        while let Some(c) = self.peek() {
            if c == ':' {
                break;
            }
            if !is_name_char(c) {
                break;
            }
            prefix.push(c);
            self.pos += 1;
        }
        if self.peek() != Some(':') {
            self.pos = start;
            let found = self.peek().map(String::from).unwrap_or_default();
            return self.error(format!("expected IRI or prefixed name, found '{prefix}{found}'"));
        }
        self.pos += 1;

        let mut local = String::new();
        while let Some(c) = self.peek() {
            if is_name_char(c) || c == ':' {
                local.push(c);
                self.pos += 1;
            } else if c == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => local.push(escaped),
                    None => return self.error("dangling escape in local name"),
                }
            } else if c == '%' {
                local.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        while local.ends_with('.') {
            local.pop();
            self.pos -= 1;
        }

        match self.prefixes.get(&prefix) {
            Some(ns) => Ok(Term::named(format!("{ns}{local}"))),
            None => {
                self.pos = start;
                self.error(format!("undefined prefix '{prefix}:'"))
            }
        }
    }

    fn rdf_literal(&mut self) -> ParseResult<Term> {
        let value = self.string()?;
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                let mut lang = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '-' {
                        lang.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if lang.is_empty() {
                    return self.error("empty language tag");
                }
                Ok(Term::Literal(Literal {
                    value,
                    datatype: None,
                    lang: Some(lang.to_ascii_lowercase()),
                }))
            }
            Some('^') if self.peek_at(1) == Some('^') => {
                self.pos += 2;
                let datatype = if self.peek() == Some('<') {
                    Term::named(self.iri_ref()?)
                } else {
                    self.prefixed_name()?
                };
                Ok(Term::typed_literal(value, datatype.value()))
            }
            _ => Ok(Term::literal(value)),
        }
    }

    fn string(&mut self) -> ParseResult<String> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return self.error("expected string"),
        };
        let long = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if long {
            self.pos += 2;
        }

        let mut value = String::new();
        loop {
            match self.bump() {
                None => return self.error("unterminated string"),
                Some(c) if c == quote => {
                    if !long {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.pos += 2;
                        // A long string may end with up to two extra quotes.
                        while self.peek() == Some(quote) {
                            value.push(quote);
                            self.pos += 1;
                        }
                        break;
                    }
                    value.push(c);
                }
                Some('\n') if !long => return self.error("newline in short string"),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('f') => '\u{c}',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('u') => self.hex_char(4)?,
                        Some('U') => self.hex_char(8)?,
                        _ => return self.error("invalid string escape"),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
        Ok(value)
    }

    fn numeric_literal(&mut self) -> ParseResult<Term> {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.pos += 1;
        }
        let mut has_dot = false;
        let mut has_exp = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.pos += 1;
            } else if c == '.'
                && !has_dot
                && !has_exp
                && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())
            {
                has_dot = true;
                text.push(c);
                self.pos += 1;
            } else if (c == 'e' || c == 'E') && !has_exp {
                has_exp = true;
                text.push(c);
                self.pos += 1;
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return self.error(format!("invalid number '{text}'"));
        }
        let datatype = if has_exp {
            "double"
        } else if has_dot {
            "decimal"
        } else {
            "integer"
        };
        Ok(Term::typed_literal(text, vocab::xsd(datatype).value()))
    }
}
