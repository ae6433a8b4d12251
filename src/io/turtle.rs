// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Line-oriented Turtle subset used on the stream boundary.
//!
//! Every statement sits on its own line: either a prefix declaration
//! (`@prefix p: <ns> .` or `PREFIX p: <ns>`) or a single triple terminated by
//! `.`. Lines starting with `#` are comments. This covers N-Triples plus the
//! compact prefixed form the sink writes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::TurtleParseError;
use crate::graph::{Graph, Term, Triple, RDF_TYPE, XSD_BOOLEAN, XSD_INTEGER};

/// Prefix name to namespace IRI.
pub type PrefixMap = BTreeMap<String, String>;

/// Parses statements while remembering prefix declarations, so a header
/// declared once at the top of a stream applies to every later segment.
#[derive(Debug, Default)]
pub struct TurtleReader {
    prefixes: PrefixMap,
}

impl TurtleReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Parse `text` into a graph. `first_line` is only used for error positions.
    ///
    /// Blank node labels are scoped to one call: every label is replaced by a
    /// freshly minted node, so the same label in two segments (or in a base
    /// graph) never denotes the same node.
    pub fn parse(&mut self, text: &str, first_line: usize) -> Result<Graph, TurtleParseError> {
        let mut graph = Graph::new();
        let mut blanks = BlankScope::default();
        for (offset, raw) in text.lines().enumerate() {
            let line_no = first_line + offset;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cursor = Cursor::new(line, line_no);
            if cursor.eat_keyword("@prefix") {
                let (prefix, namespace) = cursor.prefix_declaration()?;
                cursor.skip_ws();
                cursor.expect('.')?;
                self.prefixes.insert(prefix, namespace);
            } else if cursor.eat_keyword("PREFIX") {
                let (prefix, namespace) = cursor.prefix_declaration()?;
                self.prefixes.insert(prefix, namespace);
            } else {
                let subject = cursor.term(&self.prefixes, &mut blanks, false)?;
                let predicate = cursor.term(&self.prefixes, &mut blanks, true)?;
                let object = cursor.term(&self.prefixes, &mut blanks, false)?;
                if subject.is_literal() {
                    return Err(cursor.error("literal in subject position"));
                }
                if predicate.as_iri().is_none() {
                    return Err(cursor.error("predicate must be an IRI"));
                }
                cursor.skip_ws();
                cursor.expect('.')?;
                graph.insert(Triple::new(subject, predicate, object));
            }
            cursor.skip_ws();
            if !cursor.at_end() && !cursor.at_comment() {
                return Err(cursor.error("trailing content after statement"));
            }
        }
        Ok(graph)
    }
}

/// Document-local blank node labels mapped to process-unique nodes.
#[derive(Debug, Default)]
struct BlankScope {
    nodes: HashMap<String, Term>,
}

impl BlankScope {
    fn node(&mut self, label: String) -> Term {
        self.nodes.entry(label).or_insert_with(Term::fresh_blank).clone()
    }
}

/// Parse a complete document with its own prefix declarations.
pub fn parse_document(text: &str) -> Result<Graph, TurtleParseError> {
    TurtleReader::new().parse(text, 1)
}

/// Render a graph line by line, compacting IRIs with `prefixes` where the
/// local part is a plain name. Returns the prefixes that were actually used.
pub fn write_graph(graph: &Graph, prefixes: &PrefixMap, out: &mut String) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    for triple in graph.iter() {
        for (i, term) in [&triple.subject, &triple.predicate, &triple.object]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                out.push(' ');
            }
            match compact(term, prefixes) {
                Some((prefix, name)) => {
                    out.push_str(&name);
                    used.insert(prefix);
                }
                None => out.push_str(&term.to_string()),
            }
        }
        out.push_str(" .\n");
    }
    used
}

/// `@prefix` line for a declaration.
pub fn prefix_line(prefix: &str, namespace: &str) -> String {
    format!("@prefix {}: <{}> .\n", prefix, namespace)
}

fn compact(term: &Term, prefixes: &PrefixMap) -> Option<(String, String)> {
    let iri = term.as_iri()?;
    prefixes.iter().find_map(|(prefix, namespace)| {
        let local = iri.strip_prefix(namespace.as_str())?;
        let plain = local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        let starts_ok = local
            .chars()
            .next()
            .map_or(true, |c| c.is_ascii_alphanumeric() || c == '_');
        (plain && starts_ok).then(|| (prefix.clone(), format!("{}:{}", prefix, local)))
    })
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn new(text: &str, line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn error(&self, message: impl Into<String>) -> TurtleParseError {
        TurtleParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('#')
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TurtleParseError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let len = keyword.chars().count();
        let candidate: String = self.chars.iter().skip(self.pos).take(len).collect();
        let boundary = self
            .chars
            .get(self.pos + len)
            .map_or(true, |c| c.is_whitespace());
        if candidate.eq_ignore_ascii_case(keyword) && boundary {
            self.pos += len;
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().map_or(false, &pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn prefix_declaration(&mut self) -> Result<(String, String), TurtleParseError> {
        self.skip_ws();
        let prefix = self.take_while(is_name_char);
        self.expect(':')?;
        self.skip_ws();
        let namespace = self.iri_ref()?;
        Ok((prefix, namespace))
    }

    fn iri_ref(&mut self) -> Result<String, TurtleParseError> {
        self.expect('<')?;
        let iri = self.take_while(|c| c != '>' && !c.is_whitespace());
        self.expect('>')?;
        Ok(iri)
    }

    fn term(
        &mut self,
        prefixes: &PrefixMap,
        blanks: &mut BlankScope,
        predicate: bool,
    ) -> Result<Term, TurtleParseError> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri_ref()?)),
            Some('"') => self.literal(prefixes),
            Some('_') if self.chars.get(self.pos + 1) == Some(&':') => {
                self.pos += 2;
                let label = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
                if label.is_empty() {
                    return Err(self.error("empty blank node label"));
                }
                Ok(blanks.node(label))
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => {
                let number = self.take_while(|c| c.is_ascii_digit() || c == '-' || c == '+');
                Ok(Term::typed_literal(number, XSD_INTEGER))
            }
            Some(_) => {
                let name = self.take_while(|c| is_name_char(c) || c == ':' || c == '.');
                let name = self.unread_trailing_dots(name);
                if predicate && name == "a" {
                    return Ok(Term::iri(RDF_TYPE));
                }
                if name == "true" || name == "false" {
                    return Ok(Term::typed_literal(name, XSD_BOOLEAN));
                }
                self.expand(&name, prefixes)
            }
            None => Err(self.error("unexpected end of statement")),
        }
    }

    fn unread_trailing_dots(&mut self, mut name: String) -> String {
        while name.ends_with('.') {
            name.pop();
            self.pos -= 1;
        }
        name
    }

    fn expand(&self, name: &str, prefixes: &PrefixMap) -> Result<Term, TurtleParseError> {
        let (prefix, local) = name
            .split_once(':')
            .ok_or_else(|| self.error(format!("unexpected token '{}'", name)))?;
        let namespace = prefixes
            .get(prefix)
            .ok_or_else(|| self.error(format!("undeclared prefix '{}'", prefix)))?;
        Ok(Term::iri(format!("{}{}", namespace, local)))
    }

    fn literal(&mut self, prefixes: &PrefixMap) -> Result<Term, TurtleParseError> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated literal")),
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        _ => return Err(self.error("invalid escape sequence")),
                    };
                    value.push(escaped);
                    self.pos += 1;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        if self.peek() == Some('@') {
            self.pos += 1;
            let language = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
            return Ok(Term::lang_literal(value, language));
        }
        if self.peek() == Some('^') && self.chars.get(self.pos + 1) == Some(&'^') {
            self.pos += 2;
            let datatype = match self.peek() {
                Some('<') => self.iri_ref()?,
                _ => {
                    let name = self.take_while(|c| is_name_char(c) || c == ':' || c == '.');
                    let name = self.unread_trailing_dots(name);
                    match self.expand(&name, prefixes)? {
                        Term::Iri(iri) => iri,
                        _ => return Err(self.error("invalid datatype")),
                    }
                }
            };
            return Ok(Term::typed_literal(value, datatype));
        }
        Ok(Term::literal(value))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NIF_SENTENCE;

    #[test]
    fn test_parse_ntriples_and_prefixed_lines() {
        let text = r#"
# a comment
@prefix nif: <http://persistence.uni-leipzig.org/nlp2rdf/ontologies/nif-core#> .
PREFIX : <http://ex.org/>
:s1 a nif:Sentence .
<http://ex.org/w1> :form "Hello"@en .
_:b0 :count 3 .
:w1 :ok "true"^^<http://www.w3.org/2001/XMLSchema#boolean> .
"#;
        let graph = parse_document(text).unwrap();
        assert_eq!(graph.len(), 4);
        assert!(graph.contains(&Triple::new(
            Term::iri("http://ex.org/s1"),
            Term::iri(RDF_TYPE),
            Term::iri(NIF_SENTENCE),
        )));
        let count = Term::iri("http://ex.org/count");
        let counted: Vec<_> = graph.matching(None, Some(&count), None).collect();
        assert_eq!(counted.len(), 1);
        assert!(counted[0].subject.is_blank());
        assert_ne!(counted[0].subject, Term::blank("b0"));
        assert_eq!(counted[0].object, Term::typed_literal("3", XSD_INTEGER));
    }

    #[test]
    fn test_blank_labels_are_scoped_to_one_parse() {
        let mut reader = TurtleReader::new();
        let mut merged = reader.parse("_:b <http://ex.org/p> \"1\" .", 1).unwrap();
        let second = reader.parse("_:b <http://ex.org/p> \"2\" .", 2).unwrap();
        merged.extend_from(&second);

        let subjects: BTreeSet<_> = merged.iter().map(|t| t.subject.clone()).collect();
        assert_eq!(subjects.len(), 2);

        let same = parse_document("_:x <http://ex.org/p> _:x .\n_:x <http://ex.org/q> \"v\" .").unwrap();
        let nodes: BTreeSet<_> = same
            .iter()
            .flat_map(|t| [t.subject.clone(), t.object.clone()])
            .filter(Term::is_blank)
            .collect();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_prefixes_carry_over_between_segments() {
        let mut reader = TurtleReader::new();
        reader.parse("@prefix ex: <http://ex.org/> .\nex:a ex:p ex:b .", 1).unwrap();
        let second = reader.parse("ex:c ex:p ex:d .", 3).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_document("<a> <b> <c> .\n<a> <b>\n").unwrap_err();
        assert_eq!(err.line, 2);
        let err = parse_document("ex:a <p> <o> .").unwrap_err();
        assert!(err.message.contains("undeclared prefix"));
    }

    #[test]
    fn test_write_graph_compacts_known_namespaces() {
        let graph = parse_document(
            "<http://ex.org/a> <http://ex.org/p> <http://other.org/x> .\n<http://ex.org/b> <http://ex.org/p> \"v\" .",
        )
        .unwrap();
        let prefixes = PrefixMap::from([("ex".to_string(), "http://ex.org/".to_string())]);
        let mut out = String::new();
        let used = write_graph(&graph, &prefixes, &mut out);
        assert_eq!(
            out,
            "ex:a ex:p <http://other.org/x> .\nex:b ex:p \"v\" .\n"
        );
        assert_eq!(used.into_iter().collect::<Vec<_>>(), vec!["ex".to_string()]);
    }
}
