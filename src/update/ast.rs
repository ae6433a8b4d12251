// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::Term;

/// Position in a triple pattern or template.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternTerm {
    Term(Term),
    Variable(String),
    /// Blank node in a template: a fresh node per solution.
    Blank(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

/// Graph position of a quad or a `GRAPH` block.
#[derive(Debug, Clone, PartialEq)]
pub enum VarOrGraph {
    Default,
    Named(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadPattern {
    pub graph: VarOrGraph,
    pub triple: TriplePattern,
}

/// Predicate path in a `WHERE` pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyPath {
    Iri(Term),
    Inverse(Box<PropertyPath>),
    Sequence(Box<PropertyPath>, Box<PropertyPath>),
    Alternative(Box<PropertyPath>, Box<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub subject: PatternTerm,
    pub path: PropertyPath,
    pub object: PatternTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Built-in functions usable in `FILTER` and `BIND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Bound,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    Str,
    Lang,
    Datatype,
    Iri,
    SameTerm,
    StrLen,
    LowerCase,
    UpperCase,
    Contains,
    StrStarts,
    StrEnds,
    Concat,
    If,
    Coalesce,
}

impl Function {
    /// Look a function up by its (case-insensitive) keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let function = match keyword.to_ascii_uppercase().as_str() {
            "BOUND" => Function::Bound,
            "ISIRI" | "ISURI" => Function::IsIri,
            "ISBLANK" => Function::IsBlank,
            "ISLITERAL" => Function::IsLiteral,
            "ISNUMERIC" => Function::IsNumeric,
            "STR" => Function::Str,
            "LANG" => Function::Lang,
            "DATATYPE" => Function::Datatype,
            "IRI" | "URI" => Function::Iri,
            "SAMETERM" => Function::SameTerm,
            "STRLEN" => Function::StrLen,
            "LCASE" => Function::LowerCase,
            "UCASE" => Function::UpperCase,
            "CONTAINS" => Function::Contains,
            "STRSTARTS" => Function::StrStarts,
            "STRENDS" => Function::StrEnds,
            "CONCAT" => Function::Concat,
            "IF" => Function::If,
            "COALESCE" => Function::Coalesce,
            _ => return None,
        };
        Some(function)
    }

    /// Accepted argument counts, `None` as upper bound for variadic functions.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Concat | Function::Coalesce => (0, None),
            Function::SameTerm | Function::Contains | Function::StrStarts | Function::StrEnds => {
                (2, Some(2))
            }
            Function::If => (3, Some(3)),
            _ => (1, Some(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Term(Term),
    Variable(String),
    Or(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Negate(Box<Expression>),
    Compare(Comparison, Box<Expression>, Box<Expression>),
    Arithmetic(Arithmetic, Box<Expression>, Box<Expression>),
    Call(Function, Vec<Expression>),
    Exists { negated: bool, group: Group },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupElement {
    Triple(TriplePattern),
    Path(PathPattern),
    Graph { graph: VarOrGraph, group: Group },
    /// A nested `{ ... }` joined with the rest of the group.
    Group(Group),
    Optional(Group),
    Union(Vec<Group>),
    Minus(Group),
    Bind { expression: Expression, variable: String },
    Filter(Expression),
}

/// A group graph pattern: elements joined in order, filters applied last.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub elements: Vec<GroupElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClearTarget {
    Default,
    Named(String),
    AllNamed,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    InsertData(Vec<QuadPattern>),
    DeleteData(Vec<QuadPattern>),
    DeleteWhere(Vec<QuadPattern>),
    Modify {
        delete: Vec<QuadPattern>,
        insert: Vec<QuadPattern>,
        pattern: Group,
    },
    Clear {
        target: ClearTarget,
        silent: bool,
    },
}

/// A parsed update script: its operations plus the source text of each one.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    operations: Vec<UpdateOperation>,
    texts: Vec<String>,
}

impl UpdateRequest {
    pub(crate) fn new(operations: Vec<UpdateOperation>, texts: Vec<String>) -> Self {
        Self { operations, texts }
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn operation_text(&self, step: usize) -> Option<&str> {
        self.texts.get(step).map(String::as_str)
    }
}
