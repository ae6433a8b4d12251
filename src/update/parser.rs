// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tokenizer and recursive-descent parser for update scripts.

use std::collections::HashMap;

use super::ast::{
    Arithmetic, ClearTarget, Comparison, Expression, Function, Group, GroupElement, PathPattern,
    PatternTerm, PropertyPath, QuadPattern, TriplePattern, UpdateOperation, UpdateRequest,
    VarOrGraph,
};
use crate::errors::ScriptParseError;
use crate::graph::{Term, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Iri(String),
    PName(String, String),
    Var(String),
    Blank(String),
    Str(String),
    LangTag(String),
    Carets,
    Integer(String),
    Decimal(String),
    Word(String),
    Punct(char),
    /// Operators of expressions and property paths.
    Op(&'static str),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
    column: usize,
    start: usize,
    end: usize,
}

/// Predicate position of a pattern: a plain term or a property path.
enum Verb {
    Term(PatternTerm),
    Path(PropertyPath),
}

/// How blank nodes are read in the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BlankMode {
    /// Templates: a fresh node per solution.
    Template,
    /// Patterns: a blank node behaves like a variable.
    Pattern,
    Forbidden,
}

/// Parse a complete update script.
pub fn parse_update(source: &str) -> Result<UpdateRequest, ScriptParseError> {
    let chars: Vec<char> = source.chars().collect();
    let tokens = tokenize(&chars)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        prefixes: HashMap::new(),
    };

    let mut operations = Vec::new();
    let mut texts = Vec::new();
    loop {
        parser.prologue()?;
        let Some(start) = parser.peek().map(|t| t.start) else {
            break;
        };
        operations.push(parser.operation()?);
        let end = parser.previous_end();
        texts.push(chars[start..end].iter().collect::<String>());
        if !parser.eat_punct(';') {
            break;
        }
    }
    if let Some(token) = parser.peek() {
        return Err(error_at(token, "expected ';' or end of update"));
    }
    if operations.is_empty() {
        return Err(ScriptParseError {
            line: 1,
            column: 1,
            message: "update contains no operations".to_string(),
        });
    }
    Ok(UpdateRequest::new(operations, texts))
}

fn error_at(token: &Token, message: impl Into<String>) -> ScriptParseError {
    ScriptParseError {
        line: token.line,
        column: token.column,
        message: message.into(),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn ends_iri(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
}

fn tokenize(chars: &[char]) -> Result<Vec<Token>, ScriptParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut column = 1;

    macro_rules! fail {
        ($msg:expr) => {
            return Err(ScriptParseError {
                line,
                column,
                message: $msg.to_string(),
            })
        };
    }

    while pos < chars.len() {
        let c = chars[pos];
        if c == '\n' {
            pos += 1;
            line += 1;
            column = 1;
            continue;
        }
        if c.is_whitespace() {
            pos += 1;
            column += 1;
            continue;
        }
        if c == '#' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;
        let tok = match c {
            '<' => {
                let mut end = pos + 1;
                while end < chars.len() && !ends_iri(chars[end]) {
                    end += 1;
                }
                if chars.get(end) == Some(&'>') {
                    let iri: String = chars[pos + 1..end].iter().collect();
                    pos = end + 1;
                    Tok::Iri(iri)
                } else if chars.get(pos + 1) == Some(&'=') {
                    pos += 2;
                    Tok::Op("<=")
                } else {
                    pos += 1;
                    Tok::Op("<")
                }
            }
            '?' if !chars.get(pos + 1).map_or(false, |n| n.is_alphanumeric() || *n == '_') => {
                pos += 1;
                Tok::Op("?")
            }
            '?' | '$' => {
                let mut end = pos + 1;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                if end == pos + 1 {
                    fail!("empty variable name");
                }
                let name: String = chars[pos + 1..end].iter().collect();
                pos = end;
                Tok::Var(name)
            }
            '_' if chars.get(pos + 1) == Some(&':') => {
                let mut end = pos + 2;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                if end == pos + 2 {
                    fail!("empty blank node label");
                }
                let label: String = chars[pos + 2..end].iter().collect();
                pos = end;
                Tok::Blank(label)
            }
            '"' | '\'' => {
                let quote = c;
                let mut value = String::new();
                let mut end = pos + 1;
                loop {
                    match chars.get(end) {
                        None | Some('\n') => fail!("unterminated string literal"),
                        Some(&ch) if ch == quote => break,
                        Some('\\') => {
                            let escaped = match chars.get(end + 1) {
                                Some('n') => '\n',
                                Some('r') => '\r',
                                Some('t') => '\t',
                                Some('"') => '"',
                                Some('\'') => '\'',
                                Some('\\') => '\\',
                                _ => fail!("invalid escape sequence"),
                            };
                            value.push(escaped);
                            end += 2;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            end += 1;
                        }
                    }
                }
                pos = end + 1;
                Tok::Str(value)
            }
            '@' => {
                let mut end = pos + 1;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '-') {
                    end += 1;
                }
                if end == pos + 1 {
                    fail!("empty language tag");
                }
                let tag: String = chars[pos + 1..end].iter().collect();
                pos = end;
                Tok::LangTag(tag)
            }
            '^' if chars.get(pos + 1) == Some(&'^') => {
                pos += 2;
                Tok::Carets
            }
            '>' | '!' if chars.get(pos + 1) == Some(&'=') => {
                pos += 2;
                if c == '>' {
                    Tok::Op(">=")
                } else {
                    Tok::Op("!=")
                }
            }
            '&' if chars.get(pos + 1) == Some(&'&') => {
                pos += 2;
                Tok::Op("&&")
            }
            '|' if chars.get(pos + 1) == Some(&'|') => {
                pos += 2;
                Tok::Op("||")
            }
            '>' | '!' | '=' | '|' | '^' | '*' | '/' => {
                pos += 1;
                Tok::Op(match c {
                    '>' => ">",
                    '!' => "!",
                    '=' => "=",
                    '|' => "|",
                    '^' => "^",
                    '*' => "*",
                    _ => "/",
                })
            }
            '{' | '}' | '.' | ';' | ',' | '(' | ')' => {
                pos += 1;
                Tok::Punct(c)
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+')
                    && chars.get(pos + 1).map_or(false, |d| d.is_ascii_digit())) =>
            {
                let mut end = pos + 1;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                let fraction = chars.get(end) == Some(&'.')
                    && chars.get(end + 1).map_or(false, |d| d.is_ascii_digit());
                if fraction {
                    end += 1;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                }
                let number: String = chars[pos..end].iter().collect();
                pos = end;
                if fraction {
                    Tok::Decimal(number)
                } else {
                    Tok::Integer(number)
                }
            }
            '+' | '-' => {
                pos += 1;
                Tok::Op(if c == '+' { "+" } else { "-" })
            }
            c if c.is_alphabetic() || c == ':' || c == '_' => {
                let mut end = pos;
                while end < chars.len()
                    && (is_name_char(chars[end]) || chars[end] == ':' || chars[end] == '.')
                {
                    end += 1;
                }
                while end > pos + 1 && chars[end - 1] == '.' {
                    end -= 1;
                }
                let word: String = chars[pos..end].iter().collect();
                pos = end;
                match word.split_once(':') {
                    Some((prefix, local)) => Tok::PName(prefix.to_string(), local.to_string()),
                    None => Tok::Word(word),
                }
            }
            other => fail!(format!("unexpected character '{}'", other)),
        };
        tokens.push(Token {
            tok,
            line,
            column,
            start,
            end: pos,
        });
        column += pos - start;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.end)
    }

    fn next(&mut self) -> Result<Token, ScriptParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| self.eof_error())?;
        self.pos += 1;
        Ok(token)
    }

    fn eof_error(&self) -> ScriptParseError {
        match self.tokens.last() {
            Some(last) => error_at(last, "unexpected end of update"),
            None => ScriptParseError {
                line: 1,
                column: 1,
                message: "unexpected end of update".to_string(),
            },
        }
    }

    fn peek_is_punct(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token { tok: Tok::Punct(p), .. }) if *p == c)
    }

    fn peek_is_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token { tok: Tok::Word(w), .. }) if w.eq_ignore_ascii_case(word))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek_is_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_op(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Token { tok: Tok::Op(op), .. }) => Some(*op),
            _ => None,
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.peek_op() == Some(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_is_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ScriptParseError> {
        let token = self.next()?;
        match token.tok {
            Tok::Punct(p) if p == c => Ok(()),
            _ => Err(error_at(&token, format!("expected '{}'", c))),
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ScriptParseError> {
        let token = self.next()?;
        match &token.tok {
            Tok::Word(w) if w.eq_ignore_ascii_case(word) => Ok(()),
            _ => Err(error_at(&token, format!("expected {}", word))),
        }
    }

    fn prologue(&mut self) -> Result<(), ScriptParseError> {
        while self.eat_word("PREFIX") {
            let token = self.next()?;
            let prefix = match &token.tok {
                Tok::PName(prefix, local) if local.is_empty() => prefix.clone(),
                _ => return Err(error_at(&token, "expected prefix name ending in ':'")),
            };
            let token = self.next()?;
            let namespace = match &token.tok {
                Tok::Iri(iri) => iri.clone(),
                _ => return Err(error_at(&token, "expected namespace IRI")),
            };
            self.prefixes.insert(prefix, namespace);
        }
        Ok(())
    }

    fn operation(&mut self) -> Result<UpdateOperation, ScriptParseError> {
        let token = self.next()?;
        let keyword = match &token.tok {
            Tok::Word(w) => w.to_ascii_uppercase(),
            _ => return Err(error_at(&token, "expected INSERT, DELETE, WITH or CLEAR")),
        };
        match keyword.as_str() {
            "INSERT" if self.eat_word("DATA") => {
                Ok(UpdateOperation::InsertData(self.quads(BlankMode::Template, false)?))
            }
            "DELETE" if self.eat_word("DATA") => {
                Ok(UpdateOperation::DeleteData(self.quads(BlankMode::Forbidden, false)?))
            }
            "DELETE" if self.eat_word("WHERE") => {
                Ok(UpdateOperation::DeleteWhere(self.quads(BlankMode::Pattern, true)?))
            }
            "INSERT" | "DELETE" => {
                self.pos -= 1;
                self.modify(None)
            }
            "WITH" => {
                let graph = match self.graph_ref()? {
                    VarOrGraph::Named(iri) => iri,
                    _ => return Err(error_at(&token, "WITH requires an IRI")),
                };
                self.modify(Some(graph))
            }
            "CLEAR" | "DROP" => {
                let silent = self.eat_word("SILENT");
                let target = if self.eat_word("DEFAULT") {
                    ClearTarget::Default
                } else if self.eat_word("NAMED") {
                    ClearTarget::AllNamed
                } else if self.eat_word("ALL") {
                    ClearTarget::All
                } else if self.eat_word("GRAPH") {
                    match self.graph_ref()? {
                        VarOrGraph::Named(iri) => ClearTarget::Named(iri),
                        _ => return Err(error_at(&token, "GRAPH requires an IRI here")),
                    }
                } else {
                    return Err(error_at(&token, "expected DEFAULT, NAMED, ALL or GRAPH"));
                };
                Ok(UpdateOperation::Clear { target, silent })
            }
            _ => Err(error_at(&token, "expected INSERT, DELETE, WITH or CLEAR")),
        }
    }

    fn modify(&mut self, with: Option<String>) -> Result<UpdateOperation, ScriptParseError> {
        let mut delete = Vec::new();
        let mut insert = Vec::new();
        if self.eat_word("DELETE") {
            delete = self.quads(BlankMode::Forbidden, true)?;
            if self.eat_word("INSERT") {
                insert = self.quads(BlankMode::Template, true)?;
            }
        } else {
            self.expect_word("INSERT")?;
            insert = self.quads(BlankMode::Template, true)?;
        }
        self.expect_word("WHERE")?;
        let mut pattern = self.group()?;

        if let Some(graph) = with {
            for quad in delete.iter_mut().chain(insert.iter_mut()) {
                if quad.graph == VarOrGraph::Default {
                    quad.graph = VarOrGraph::Named(graph.clone());
                }
            }
            let elements = std::mem::take(&mut pattern.elements);
            pattern.elements = vec![GroupElement::Graph {
                graph: VarOrGraph::Named(graph),
                group: Group { elements },
            }];
        }
        Ok(UpdateOperation::Modify {
            delete,
            insert,
            pattern,
        })
    }

    fn graph_ref(&mut self) -> Result<VarOrGraph, ScriptParseError> {
        let token = self.next()?;
        match &token.tok {
            Tok::Iri(iri) => Ok(VarOrGraph::Named(iri.clone())),
            Tok::PName(prefix, local) => Ok(VarOrGraph::Named(self.expand(&token, prefix, local)?)),
            Tok::Var(name) => Ok(VarOrGraph::Variable(name.clone())),
            _ => Err(error_at(&token, "expected graph IRI or variable")),
        }
    }

    fn expand(&self, token: &Token, prefix: &str, local: &str) -> Result<String, ScriptParseError> {
        self.prefixes
            .get(prefix)
            .map(|namespace| format!("{}{}", namespace, local))
            .ok_or_else(|| error_at(token, format!("undeclared prefix '{}'", prefix)))
    }

    /// `{ triples GRAPH g { triples } ... }` as used by data blocks and templates.
    fn quads(&mut self, mode: BlankMode, allow_vars: bool) -> Result<Vec<QuadPattern>, ScriptParseError> {
        self.expect_punct('{')?;
        let mut quads = Vec::new();
        loop {
            if self.eat_punct('}') {
                break;
            }
            if self.eat_punct('.') {
                continue;
            }
            if self.eat_word("GRAPH") {
                let graph = self.graph_ref()?;
                if !allow_vars && matches!(graph, VarOrGraph::Variable(_)) {
                    return Err(self.here("variables are not allowed in data blocks"));
                }
                self.expect_punct('{')?;
                while !self.eat_punct('}') {
                    if self.eat_punct('.') {
                        continue;
                    }
                    for triple in self.triples_same_subject(mode, allow_vars)? {
                        quads.push(QuadPattern {
                            graph: graph.clone(),
                            triple,
                        });
                    }
                }
                continue;
            }
            for triple in self.triples_same_subject(mode, allow_vars)? {
                quads.push(QuadPattern {
                    graph: VarOrGraph::Default,
                    triple,
                });
            }
        }
        Ok(quads)
    }

    fn group(&mut self) -> Result<Group, ScriptParseError> {
        self.expect_punct('{')?;
        let mut elements = Vec::new();
        loop {
            if self.eat_punct('}') {
                break;
            }
            if self.eat_punct('.') {
                continue;
            }
            if self.peek_is_punct('{') {
                let first = self.group()?;
                if self.peek_is_word("UNION") {
                    let mut alternatives = vec![first];
                    while self.eat_word("UNION") {
                        alternatives.push(self.group()?);
                    }
                    elements.push(GroupElement::Union(alternatives));
                } else {
                    elements.push(GroupElement::Group(first));
                }
                continue;
            }
            if self.eat_word("GRAPH") {
                let graph = self.graph_ref()?;
                let group = self.group()?;
                elements.push(GroupElement::Graph { graph, group });
                continue;
            }
            if self.eat_word("OPTIONAL") {
                elements.push(GroupElement::Optional(self.group()?));
                continue;
            }
            if self.eat_word("MINUS") {
                elements.push(GroupElement::Minus(self.group()?));
                continue;
            }
            if self.eat_word("FILTER") {
                let expression = if self.eat_punct('(') {
                    let expression = self.expression()?;
                    self.expect_punct(')')?;
                    expression
                } else {
                    self.primary_expression()?
                };
                elements.push(GroupElement::Filter(expression));
                continue;
            }
            if self.eat_word("BIND") {
                self.expect_punct('(')?;
                let expression = self.expression()?;
                self.expect_word("AS")?;
                let token = self.next()?;
                let variable = match &token.tok {
                    Tok::Var(name) => name.clone(),
                    _ => return Err(error_at(&token, "expected a variable after AS")),
                };
                self.expect_punct(')')?;
                elements.push(GroupElement::Bind {
                    expression,
                    variable,
                });
                continue;
            }
            elements.extend(self.statements(BlankMode::Pattern, true, true)?);
        }
        Ok(Group { elements })
    }

    fn expression(&mut self) -> Result<Expression, ScriptParseError> {
        let mut left = self.and_expression()?;
        while self.eat_op("||") {
            let right = self.and_expression()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expression(&mut self) -> Result<Expression, ScriptParseError> {
        let mut left = self.relational_expression()?;
        while self.eat_op("&&") {
            let right = self.relational_expression()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn relational_expression(&mut self) -> Result<Expression, ScriptParseError> {
        let left = self.additive_expression()?;
        let comparison = match self.peek_op() {
            Some("=") => Comparison::Equal,
            Some("!=") => Comparison::NotEqual,
            Some("<") => Comparison::Less,
            Some("<=") => Comparison::LessOrEqual,
            Some(">") => Comparison::Greater,
            Some(">=") => Comparison::GreaterOrEqual,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive_expression()?;
        Ok(Expression::Compare(comparison, Box::new(left), Box::new(right)))
    }

    fn additive_expression(&mut self) -> Result<Expression, ScriptParseError> {
        let mut left = self.multiplicative_expression()?;
        loop {
            let op = if self.eat_op("+") {
                Arithmetic::Add
            } else if self.eat_op("-") {
                Arithmetic::Subtract
            } else if let Some(number) = self.signed_number() {
                // `?n+1` lexes as a variable and a signed number.
                self.pos += 1;
                let (op, magnitude) = match number.strip_prefix('-') {
                    Some(rest) => (Arithmetic::Subtract, rest.to_string()),
                    None => (Arithmetic::Add, number.trim_start_matches('+').to_string()),
                };
                let mut right = Expression::Term(number_term(&magnitude));
                while let Some(factor) = self.multiplicative_op() {
                    let operand = self.unary_expression()?;
                    right = Expression::Arithmetic(factor, Box::new(right), Box::new(operand));
                }
                left = Expression::Arithmetic(op, Box::new(left), Box::new(right));
                continue;
            } else {
                return Ok(left);
            };
            let right = self.multiplicative_expression()?;
            left = Expression::Arithmetic(op, Box::new(left), Box::new(right));
        }
    }

    fn signed_number(&self) -> Option<String> {
        match self.peek().map(|t| &t.tok) {
            Some(Tok::Integer(n) | Tok::Decimal(n)) if n.starts_with(['+', '-']) => Some(n.clone()),
            _ => None,
        }
    }

    fn multiplicative_op(&mut self) -> Option<Arithmetic> {
        if self.eat_op("*") {
            Some(Arithmetic::Multiply)
        } else if self.eat_op("/") {
            Some(Arithmetic::Divide)
        } else {
            None
        }
    }

    fn multiplicative_expression(&mut self) -> Result<Expression, ScriptParseError> {
        let mut left = self.unary_expression()?;
        while let Some(op) = self.multiplicative_op() {
            let right = self.unary_expression()?;
            left = Expression::Arithmetic(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary_expression(&mut self) -> Result<Expression, ScriptParseError> {
        if self.eat_op("!") {
            return Ok(Expression::Not(Box::new(self.unary_expression()?)));
        }
        if self.eat_op("-") {
            return Ok(Expression::Negate(Box::new(self.unary_expression()?)));
        }
        self.eat_op("+");
        self.primary_expression()
    }

    fn primary_expression(&mut self) -> Result<Expression, ScriptParseError> {
        if self.eat_punct('(') {
            let inner = self.expression()?;
            self.expect_punct(')')?;
            return Ok(inner);
        }
        let token = self.next()?;
        let expression = match &token.tok {
            Tok::Var(name) => Expression::Variable(name.clone()),
            Tok::Iri(iri) => Expression::Term(Term::iri(iri.clone())),
            Tok::PName(prefix, local) => Expression::Term(Term::iri(self.expand(&token, prefix, local)?)),
            Tok::Str(value) => Expression::Term(self.literal_after(value.clone())?),
            Tok::Integer(number) | Tok::Decimal(number) => Expression::Term(number_term(number)),
            Tok::Word(word) if word == "true" || word == "false" => {
                Expression::Term(Term::typed_literal(word.clone(), XSD_BOOLEAN))
            }
            Tok::Word(word) if word.eq_ignore_ascii_case("NOT") => {
                self.expect_word("EXISTS")?;
                Expression::Exists {
                    negated: true,
                    group: self.group()?,
                }
            }
            Tok::Word(word) if word.eq_ignore_ascii_case("EXISTS") => Expression::Exists {
                negated: false,
                group: self.group()?,
            },
            Tok::Word(word) => {
                let function = Function::from_keyword(word)
                    .ok_or_else(|| error_at(&token, format!("unsupported function '{}'", word)))?;
                let args = self.arguments()?;
                let (min, max) = function.arity();
                if args.len() < min || max.map_or(false, |max| args.len() > max) {
                    return Err(error_at(&token, format!("wrong number of arguments for {}", word)));
                }
                if function == Function::Bound && !matches!(args[0], Expression::Variable(_)) {
                    return Err(error_at(&token, "BOUND expects a variable"));
                }
                Expression::Call(function, args)
            }
            _ => return Err(error_at(&token, "expected an expression")),
        };
        Ok(expression)
    }

    fn arguments(&mut self) -> Result<Vec<Expression>, ScriptParseError> {
        self.expect_punct('(')?;
        let mut args = Vec::new();
        if self.eat_punct(')') {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat_punct(')') {
                return Ok(args);
            }
            self.expect_punct(',')?;
        }
    }

    fn path(&mut self) -> Result<PropertyPath, ScriptParseError> {
        let mut left = self.path_sequence()?;
        while self.eat_op("|") {
            let right = self.path_sequence()?;
            left = PropertyPath::Alternative(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn path_sequence(&mut self) -> Result<PropertyPath, ScriptParseError> {
        let mut left = self.path_element()?;
        while self.eat_op("/") {
            let right = self.path_element()?;
            left = PropertyPath::Sequence(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn path_element(&mut self) -> Result<PropertyPath, ScriptParseError> {
        let inverse = self.eat_op("^");
        let primary = if self.eat_punct('(') {
            let inner = self.path()?;
            self.expect_punct(')')?;
            inner
        } else {
            let token = self.next()?;
            let iri = match &token.tok {
                Tok::Iri(iri) => iri.clone(),
                Tok::PName(prefix, local) => self.expand(&token, prefix, local)?,
                Tok::Word(word) if word == "a" => RDF_TYPE.to_string(),
                _ => return Err(error_at(&token, "expected an IRI in property path")),
            };
            PropertyPath::Iri(Term::iri(iri))
        };
        let modified = if self.eat_op("*") {
            PropertyPath::ZeroOrMore(Box::new(primary))
        } else if self.eat_op("+") {
            PropertyPath::OneOrMore(Box::new(primary))
        } else if self.eat_op("?") {
            PropertyPath::ZeroOrOne(Box::new(primary))
        } else {
            primary
        };
        Ok(if inverse {
            PropertyPath::Inverse(Box::new(modified))
        } else {
            modified
        })
    }

    fn here(&self, message: &str) -> ScriptParseError {
        match self.peek() {
            Some(token) => error_at(token, message),
            None => self.eof_error(),
        }
    }

    fn triples_same_subject(
        &mut self,
        mode: BlankMode,
        allow_vars: bool,
    ) -> Result<Vec<TriplePattern>, ScriptParseError> {
        let triples = self
            .statements(mode, allow_vars, false)?
            .into_iter()
            .filter_map(|element| match element {
                GroupElement::Triple(triple) => Some(triple),
                _ => None,
            })
            .collect();
        Ok(triples)
    }

    /// Triples sharing one subject. With `paths`, predicates may be property
    /// paths and yield path elements.
    fn statements(
        &mut self,
        mode: BlankMode,
        allow_vars: bool,
        paths: bool,
    ) -> Result<Vec<GroupElement>, ScriptParseError> {
        let subject = self.pattern_term(mode, allow_vars, false)?;
        if matches!(subject, PatternTerm::Term(Term::Literal(_))) {
            return Err(self.here("literal in subject position"));
        }
        let mut elements = Vec::new();
        loop {
            let verb = self.verb(mode, allow_vars, paths)?;
            if let Verb::Term(
                PatternTerm::Term(Term::Literal(_) | Term::BlankNode(_)) | PatternTerm::Blank(_),
            ) = verb
            {
                return Err(self.here("predicate must be an IRI or variable"));
            }
            loop {
                let object = self.pattern_term(mode, allow_vars, false)?;
                elements.push(match &verb {
                    Verb::Term(predicate) => GroupElement::Triple(TriplePattern {
                        subject: subject.clone(),
                        predicate: predicate.clone(),
                        object,
                    }),
                    Verb::Path(path) => GroupElement::Path(PathPattern {
                        subject: subject.clone(),
                        path: path.clone(),
                        object,
                    }),
                });
                if !self.eat_punct(',') {
                    break;
                }
            }
            if !self.eat_punct(';') {
                break;
            }
            while self.eat_punct(';') {}
            if self.peek_is_punct('.') || self.peek_is_punct('}') {
                break;
            }
        }
        Ok(elements)
    }

    fn verb(&mut self, mode: BlankMode, allow_vars: bool, paths: bool) -> Result<Verb, ScriptParseError> {
        let plain = matches!(
            self.peek().map(|t| &t.tok),
            Some(Tok::Var(_) | Tok::Blank(_) | Tok::Str(_) | Tok::Integer(_) | Tok::Decimal(_))
        );
        if !paths || plain {
            return Ok(Verb::Term(self.pattern_term(mode, allow_vars, true)?));
        }
        Ok(match self.path()? {
            PropertyPath::Iri(term) => Verb::Term(PatternTerm::Term(term)),
            path => Verb::Path(path),
        })
    }

    /// Language tag or datatype following a string token.
    fn literal_after(&mut self, value: String) -> Result<Term, ScriptParseError> {
        match self.peek().map(|t| t.tok.clone()) {
            Some(Tok::LangTag(tag)) => {
                self.pos += 1;
                Ok(Term::lang_literal(value, tag))
            }
            Some(Tok::Carets) => {
                self.pos += 1;
                let datatype_token = self.next()?;
                let datatype = match &datatype_token.tok {
                    Tok::Iri(iri) => iri.clone(),
                    Tok::PName(prefix, local) => self.expand(&datatype_token, prefix, local)?,
                    _ => return Err(error_at(&datatype_token, "expected datatype IRI")),
                };
                Ok(Term::typed_literal(value, datatype))
            }
            _ => Ok(Term::literal(value)),
        }
    }

    fn pattern_term(
        &mut self,
        mode: BlankMode,
        allow_vars: bool,
        verb: bool,
    ) -> Result<PatternTerm, ScriptParseError> {
        let token = self.next()?;
        let term = match &token.tok {
            Tok::Iri(iri) => Term::iri(iri.clone()),
            Tok::PName(prefix, local) => Term::iri(self.expand(&token, prefix, local)?),
            Tok::Var(name) => {
                if !allow_vars {
                    return Err(error_at(&token, "variables are not allowed in data blocks"));
                }
                return Ok(PatternTerm::Variable(name.clone()));
            }
            Tok::Blank(label) => {
                return match mode {
                    BlankMode::Template => Ok(PatternTerm::Blank(label.clone())),
                    BlankMode::Pattern => Ok(PatternTerm::Variable(format!("_:{}", label))),
                    BlankMode::Forbidden => {
                        Err(error_at(&token, "blank nodes are not allowed in delete templates"))
                    }
                };
            }
            Tok::Str(value) => self.literal_after(value.clone())?,
            Tok::Integer(number) | Tok::Decimal(number) => number_term(number),
            Tok::Word(word) if verb && word == "a" => Term::iri(RDF_TYPE),
            Tok::Word(word) if word == "true" || word == "false" => {
                Term::typed_literal(word.clone(), XSD_BOOLEAN)
            }
            _ => return Err(error_at(&token, "expected an RDF term")),
        };
        Ok(PatternTerm::Term(term))
    }
}

fn number_term(number: &str) -> Term {
    let datatype = if number.contains('.') {
        XSD_DECIMAL
    } else {
        XSD_INTEGER
    };
    Term::typed_literal(number, datatype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_multiple_operations_with_texts() {
        let request = parse_update(
            "PREFIX ex: <http://ex.org/>\n\
             INSERT DATA { ex:a ex:p \"v\"@en , 3 ; a ex:Thing . } ;\n\
             DELETE { ?s ex:p ?o } INSERT { ?s ex:q ?o } WHERE { ?s ex:p ?o }",
        )
        .unwrap();
        assert_eq!(request.operations().len(), 2);
        match &request.operations()[0] {
            UpdateOperation::InsertData(quads) => assert_eq!(quads.len(), 3),
            other => panic!("unexpected operation {:?}", other),
        }
        assert!(request.operation_text(0).unwrap().starts_with("INSERT DATA"));
        assert!(request.operation_text(1).unwrap().starts_with("DELETE {"));
        assert!(request.operation_text(1).unwrap().ends_with("?o }"));
    }

    #[test]
    fn test_graph_blocks_and_filters() {
        let request = parse_update(
            "INSERT { GRAPH <http://g> { ?s <http://p> _:b } } \
             WHERE { GRAPH ?g { ?s <http://p> ?o } FILTER NOT EXISTS { ?s <http://done> true } }",
        )
        .unwrap();
        match &request.operations()[0] {
            UpdateOperation::Modify { insert, pattern, .. } => {
                assert_eq!(insert[0].graph, VarOrGraph::Named("http://g".to_string()));
                assert_eq!(insert[0].triple.object, PatternTerm::Blank("b".to_string()));
                assert_eq!(pattern.elements.len(), 2);
                assert!(matches!(
                    pattern.elements[1],
                    GroupElement::Filter(Expression::Exists { negated: true, .. })
                ));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_with_moves_default_graph() {
        let request = parse_update(
            "WITH <http://g> DELETE { ?s <http://p> ?o } WHERE { ?s <http://p> ?o }",
        )
        .unwrap();
        match &request.operations()[0] {
            UpdateOperation::Modify { delete, pattern, .. } => {
                assert_eq!(delete[0].graph, VarOrGraph::Named("http://g".to_string()));
                assert!(matches!(pattern.elements[0], GroupElement::Graph { .. }));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_scripts() {
        assert!(parse_update("").is_err());
        assert!(parse_update("SELECT * WHERE { ?s ?p ?o }").is_err());
        assert!(parse_update("updates/missing.sparql").is_err());
        assert!(parse_update("INSERT DATA { ?s <http://p> <http://o> }").is_err());
        assert!(parse_update("DELETE DATA { _:b <http://p> <http://o> }").is_err());
        assert!(parse_update("INSERT DATA { ex:a <http://p> <http://o> }").is_err());

        let err = parse_update("INSERT DATA {\n  <http://a> <http://p> \n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    fn where_group(script: &str) -> Group {
        match parse_update(script).unwrap().operations() {
            [UpdateOperation::Modify { pattern, .. }] => pattern.clone(),
            other => panic!("unexpected operations {:?}", other),
        }
    }

    #[test]
    fn test_optional_union_minus_and_bind() {
        let group = where_group(
            "INSERT { ?s <http://q> ?label } WHERE { \
               { ?s a <http://A> } UNION { ?s a <http://B> } \
               OPTIONAL { ?s <http://label> ?l } \
               MINUS { ?s <http://hidden> true } \
               BIND(COALESCE(?l, \"none\") AS ?label) }",
        );
        assert!(matches!(&group.elements[0], GroupElement::Union(alternatives) if alternatives.len() == 2));
        assert!(matches!(group.elements[1], GroupElement::Optional(_)));
        assert!(matches!(group.elements[2], GroupElement::Minus(_)));
        match &group.elements[3] {
            GroupElement::Bind {
                expression: Expression::Call(Function::Coalesce, args),
                variable,
            } => {
                assert_eq!(variable, "label");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_filter_expression_precedence() {
        let group = where_group(
            "DELETE { ?s <http://n> ?n } WHERE { ?s <http://n> ?n FILTER(?n+1 > 2 * 3 || !isIRI(?s) && ?n != -4) }",
        );
        let filter = match &group.elements[1] {
            GroupElement::Filter(expression) => expression,
            other => panic!("unexpected element {:?}", other),
        };
        let Expression::Or(left, right) = filter else {
            panic!("expected || at the top, got {:?}", filter);
        };
        match left.as_ref() {
            Expression::Compare(Comparison::Greater, sum, product) => {
                assert!(matches!(sum.as_ref(), Expression::Arithmetic(Arithmetic::Add, _, _)));
                assert!(matches!(product.as_ref(), Expression::Arithmetic(Arithmetic::Multiply, _, _)));
            }
            other => panic!("unexpected left operand {:?}", other),
        }
        match right.as_ref() {
            Expression::And(negated, compare) => {
                assert!(matches!(negated.as_ref(), Expression::Not(_)));
                assert!(matches!(compare.as_ref(), Expression::Compare(Comparison::NotEqual, _, _)));
            }
            other => panic!("unexpected right operand {:?}", other),
        }
    }

    #[test]
    fn test_property_paths() {
        let group = where_group(
            "PREFIX ex: <http://ex.org/> INSERT { ?a ex:reach ?b } WHERE { ?a ex:next+ ?b . ?b ^ex:head/(ex:p|ex:q)* ?c . ?c ex:plain ?d }",
        );
        match &group.elements[0] {
            GroupElement::Path(PathPattern {
                path: PropertyPath::OneOrMore(inner),
                ..
            }) => assert_eq!(**inner, PropertyPath::Iri(Term::iri("http://ex.org/next"))),
            other => panic!("unexpected element {:?}", other),
        }
        match &group.elements[1] {
            GroupElement::Path(PathPattern {
                path: PropertyPath::Sequence(first, rest),
                ..
            }) => {
                assert!(matches!(first.as_ref(), PropertyPath::Inverse(_)));
                assert!(matches!(rest.as_ref(), PropertyPath::ZeroOrMore(_)));
            }
            other => panic!("unexpected element {:?}", other),
        }
        // A single IRI stays a plain triple pattern.
        assert!(matches!(group.elements[2], GroupElement::Triple(_)));
    }

    #[test]
    fn test_rejects_bad_expressions() {
        assert!(parse_update("INSERT { ?s <p> 1 } WHERE { ?s ?p ?o FILTER(REGEX(?o, \"x\")) }").is_err());
        assert!(parse_update("INSERT { ?s <p> 1 } WHERE { ?s ?p ?o FILTER(BOUND(1)) }").is_err());
        assert!(parse_update("INSERT { ?s <p> 1 } WHERE { ?s ?p ?o FILTER(STRLEN(?o, ?o)) }").is_err());
        assert!(parse_update("INSERT { ?s <p> 1 } WHERE { BIND(1 AS 2) }").is_err());
        assert!(parse_update("INSERT { ?s <p>+ 1 } WHERE { ?s ?p ?o }").is_err());
    }

    #[test]
    fn test_clear_targets() {
        let request = parse_update("CLEAR SILENT GRAPH <http://g> ; CLEAR DEFAULT").unwrap();
        assert_eq!(
            request.operations()[0],
            UpdateOperation::Clear {
                target: ClearTarget::Named("http://g".to_string()),
                silent: true
            }
        );
        assert_eq!(
            request.operations()[1],
            UpdateOperation::Clear {
                target: ClearTarget::Default,
                silent: false
            }
        );
    }
}
