// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! RDF terms and triples.
//!
//! Terms order lexicographically by kind and then by content, which gives every
//! [`Graph`](super::Graph) a stable iteration order. That order is what the
//! textual snapshots used for change detection and debug output rely on.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

static BLANK_NODE_COUNTER: AtomicU64 = AtomicU64::new(0);
const FRESH_BLANK_PREFIX: &str = "genid-";

/// A single RDF term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
}

/// Literal value with an optional language tag or datatype (never both).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub value: String,
    pub language: Option<String>,
    pub datatype: Option<String>,
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            language: None,
            datatype: None,
        })
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            language: Some(language.into().to_ascii_lowercase()),
            datatype: None,
        })
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        })
    }

    /// Mint a blank node whose label is unique for the lifetime of the process.
    ///
    /// Workers insert fresh blank nodes concurrently, so the counter is global
    /// rather than per dataset. The Turtle reader maps every input label onto
    /// one of these, so parsed data never carries a label of its own.
    pub fn fresh_blank() -> Self {
        let n = BLANK_NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Term::BlankNode(format!("{}{}", FRESH_BLANK_PREFIX, n))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Local name of an IRI: the part after the last `#` or `/`.
    pub fn local_name(&self) -> Option<&str> {
        let iri = self.as_iri()?;
        let start = iri.rfind(['#', '/']).map(|i| i + 1).unwrap_or(0);
        Some(&iri[start..])
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Literal(literal) => {
                write!(f, "\"{}\"", escape_literal(&literal.value))?;
                if let Some(language) = &literal.language {
                    write!(f, "@{}", language)
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

pub(crate) fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Subject, predicate, object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_uses_last_separator() {
        assert_eq!(Term::iri("http://ex.org/a#s1_0").local_name(), Some("s1_0"));
        assert_eq!(Term::iri("http://ex.org/corpus/s2").local_name(), Some("s2"));
        assert_eq!(Term::literal("x").local_name(), None);
    }

    #[test]
    fn test_literal_display_escapes_quotes() {
        let term = Term::lang_literal("say \"hi\"", "EN");
        assert_eq!(term.to_string(), "\"say \\\"hi\\\"\"@en");
        let typed = Term::typed_literal("3", XSD_INTEGER);
        assert_eq!(
            typed.to_string(),
            "\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_fresh_blank_nodes_are_distinct() {
        assert_ne!(Term::fresh_blank(), Term::fresh_blank());
    }
}
