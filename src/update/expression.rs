// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `FILTER` and `BIND` expression evaluation.
//!
//! An expression either yields a term or fails (unbound variable, type
//! mismatch, unknown comparison). A failing `FILTER` drops the solution and a
//! failing `BIND` leaves its variable unbound.

use std::cmp::Ordering;

use super::ast::{Arithmetic, Comparison, Expression, Function};
use super::eval::{evaluate, Solution};
use crate::errors::UpdateError;
use crate::graph::{
    Dataset, GraphName, Literal, Term, RDF_LANG_STRING, XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER,
    XSD_NAMESPACE, XSD_STRING,
};

const NUMERIC_TYPES: [&str; 14] = [
    "integer",
    "decimal",
    "double",
    "float",
    "int",
    "long",
    "short",
    "byte",
    "nonNegativeInteger",
    "positiveInteger",
    "negativeInteger",
    "nonPositiveInteger",
    "unsignedInt",
    "unsignedLong",
];

/// Evaluation context shared by every sub-expression of one solution.
pub(super) struct Scope<'a> {
    pub dataset: &'a Dataset,
    pub active: &'a GraphName,
    pub solution: &'a Solution,
}

/// `None` is an expression error.
pub(super) fn value(expression: &Expression, scope: &Scope) -> Result<Option<Term>, UpdateError> {
    let term = match expression {
        Expression::Term(term) => Some(term.clone()),
        Expression::Variable(name) => scope.solution.get(name).cloned(),
        Expression::Or(left, right) => {
            // A true operand wins over an error on the other side.
            let left = truth(left, scope)?;
            if left == Some(true) {
                return Ok(Some(boolean(true)));
            }
            match (left, truth(right, scope)?) {
                (_, Some(true)) => Some(boolean(true)),
                (Some(false), Some(false)) => Some(boolean(false)),
                _ => None,
            }
        }
        Expression::And(left, right) => {
            let left = truth(left, scope)?;
            if left == Some(false) {
                return Ok(Some(boolean(false)));
            }
            match (left, truth(right, scope)?) {
                (_, Some(false)) => Some(boolean(false)),
                (Some(true), Some(true)) => Some(boolean(true)),
                _ => None,
            }
        }
        Expression::Not(inner) => truth(inner, scope)?.map(|b| boolean(!b)),
        Expression::Negate(inner) => value(inner, scope)?
            .as_ref()
            .and_then(number)
            .map(|n| n.negate().into_term()),
        Expression::Compare(op, left, right) => {
            let left = value(left, scope)?;
            let right = value(right, scope)?;
            match (left, right) {
                (Some(left), Some(right)) => compare(*op, &left, &right).map(boolean),
                _ => None,
            }
        }
        Expression::Arithmetic(op, left, right) => {
            let left = value(left, scope)?.as_ref().and_then(number);
            let right = value(right, scope)?.as_ref().and_then(number);
            match (left, right) {
                (Some(left), Some(right)) => left.apply(*op, right).map(Number::into_term),
                _ => None,
            }
        }
        Expression::Call(function, args) => call(*function, args, scope)?,
        Expression::Exists { negated, group } => {
            let found = !evaluate(group, scope.dataset, scope.active, vec![scope.solution.clone()])?
                .is_empty();
            Some(boolean(found != *negated))
        }
    };
    Ok(term)
}

/// Effective boolean value, `None` on error.
pub(super) fn truth(expression: &Expression, scope: &Scope) -> Result<Option<bool>, UpdateError> {
    Ok(value(expression, scope)?.as_ref().and_then(effective_boolean))
}

fn effective_boolean(term: &Term) -> Option<bool> {
    let Term::Literal(literal) = term else {
        return None;
    };
    match literal.datatype.as_deref() {
        Some(XSD_BOOLEAN) => match literal.value.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Some(XSD_STRING) | None => Some(!literal.value.is_empty()),
        Some(_) => number(term).map(|n| !n.is_zero()),
    }
}

fn boolean(value: bool) -> Term {
    Term::typed_literal(value.to_string(), XSD_BOOLEAN)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Decimal(n) => n,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    fn negate(self) -> Self {
        match self {
            Number::Integer(n) => n.checked_neg().map_or(Number::Decimal(-(n as f64)), Number::Integer),
            Number::Decimal(n) => Number::Decimal(-n),
        }
    }

    fn apply(self, op: Arithmetic, other: Number) -> Option<Number> {
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            let exact = match op {
                Arithmetic::Add => a.checked_add(b),
                Arithmetic::Subtract => a.checked_sub(b),
                Arithmetic::Multiply => a.checked_mul(b),
                Arithmetic::Divide => None,
            };
            if let Some(n) = exact {
                return Some(Number::Integer(n));
            }
        }
        let (a, b) = (self.as_f64(), other.as_f64());
        let result = match op {
            Arithmetic::Add => a + b,
            Arithmetic::Subtract => a - b,
            Arithmetic::Multiply => a * b,
            Arithmetic::Divide if b == 0.0 => return None,
            Arithmetic::Divide => a / b,
        };
        result.is_finite().then_some(Number::Decimal(result))
    }

    fn into_term(self) -> Term {
        match self {
            Number::Integer(n) => Term::typed_literal(n.to_string(), XSD_INTEGER),
            Number::Decimal(n) => Term::typed_literal(n.to_string(), XSD_DECIMAL),
        }
    }
}

fn is_numeric_type(datatype: &str) -> bool {
    datatype
        .strip_prefix(XSD_NAMESPACE)
        .map_or(false, |local| NUMERIC_TYPES.contains(&local))
}

fn number(term: &Term) -> Option<Number> {
    let Term::Literal(Literal {
        value,
        datatype: Some(datatype),
        ..
    }) = term
    else {
        return None;
    };
    if !is_numeric_type(datatype) {
        return None;
    }
    let value = value.trim();
    if let Ok(n) = value.trim_start_matches('+').parse::<i64>() {
        return Some(Number::Integer(n));
    }
    value.parse::<f64>().ok().map(Number::Decimal)
}

/// Plain or `xsd:string` literal text.
fn simple_string(term: &Term) -> Option<&str> {
    match term {
        Term::Literal(Literal {
            value,
            language: None,
            datatype: None,
        }) => Some(value),
        Term::Literal(Literal {
            value,
            language: None,
            datatype: Some(datatype),
        }) if datatype == XSD_STRING => Some(value),
        _ => None,
    }
}

/// Any string literal, language tagged or not.
fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::Literal(literal) if literal.language.is_some() => Some(&literal.value),
        other => simple_string(other),
    }
}

fn compare(op: Comparison, left: &Term, right: &Term) -> Option<bool> {
    let ordering = if let (Some(a), Some(b)) = (number(left), number(right)) {
        a.as_f64().partial_cmp(&b.as_f64())
    } else if let (Some(a), Some(b)) = (simple_string(left), simple_string(right)) {
        Some(a.cmp(b))
    } else if let (Some(a), Some(b)) = (boolean_value(left), boolean_value(right)) {
        Some(a.cmp(&b))
    } else {
        // Unrelated terms only support (in)equality by identity.
        return match op {
            Comparison::Equal => Some(left == right),
            Comparison::NotEqual => Some(left != right),
            _ => None,
        };
    };
    let ordering = ordering?;
    Some(match op {
        Comparison::Equal => ordering == Ordering::Equal,
        Comparison::NotEqual => ordering != Ordering::Equal,
        Comparison::Less => ordering == Ordering::Less,
        Comparison::LessOrEqual => ordering != Ordering::Greater,
        Comparison::Greater => ordering == Ordering::Greater,
        Comparison::GreaterOrEqual => ordering != Ordering::Less,
    })
}

fn boolean_value(term: &Term) -> Option<bool> {
    match term {
        Term::Literal(Literal {
            value,
            datatype: Some(datatype),
            ..
        }) if datatype == XSD_BOOLEAN => match value.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn call(function: Function, args: &[Expression], scope: &Scope) -> Result<Option<Term>, UpdateError> {
    match function {
        Function::Bound => {
            return Ok(match args.first() {
                Some(Expression::Variable(name)) => Some(boolean(scope.solution.contains_key(name))),
                _ => None,
            });
        }
        Function::If => {
            let (Some(condition), Some(then), Some(otherwise)) = (args.first(), args.get(1), args.get(2))
            else {
                return Ok(None);
            };
            return match truth(condition, scope)? {
                Some(true) => value(then, scope),
                Some(false) => value(otherwise, scope),
                None => Ok(None),
            };
        }
        Function::Coalesce => {
            for arg in args {
                if let Some(term) = value(arg, scope)? {
                    return Ok(Some(term));
                }
            }
            return Ok(None);
        }
        _ => {}
    }

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match value(arg, scope)? {
            Some(term) => values.push(term),
            None => return Ok(None),
        }
    }
    let first = values.first();
    let term = match function {
        Function::IsIri => first.map(|t| boolean(matches!(t, Term::Iri(_)))),
        Function::IsBlank => first.map(|t| boolean(t.is_blank())),
        Function::IsLiteral => first.map(|t| boolean(t.is_literal())),
        Function::IsNumeric => first.map(|t| boolean(number(t).is_some())),
        Function::Str => first.and_then(|t| match t {
            Term::Iri(iri) => Some(Term::literal(iri.clone())),
            Term::Literal(literal) => Some(Term::literal(literal.value.clone())),
            Term::BlankNode(_) => None,
        }),
        Function::Lang => first.and_then(|t| match t {
            Term::Literal(literal) => Some(Term::literal(literal.language.clone().unwrap_or_default())),
            _ => None,
        }),
        Function::Datatype => first.and_then(|t| match t {
            Term::Literal(literal) if literal.language.is_some() => Some(Term::iri(RDF_LANG_STRING)),
            Term::Literal(literal) => Some(Term::iri(
                literal.datatype.clone().unwrap_or_else(|| XSD_STRING.to_string()),
            )),
            _ => None,
        }),
        Function::Iri => first.and_then(|t| match t {
            Term::Iri(_) => Some(t.clone()),
            other => simple_string(other).map(Term::iri),
        }),
        Function::SameTerm => match (values.first(), values.get(1)) {
            (Some(a), Some(b)) => Some(boolean(a == b)),
            _ => None,
        },
        Function::StrLen => first
            .and_then(string_value)
            .map(|s| Term::typed_literal(s.chars().count().to_string(), XSD_INTEGER)),
        Function::LowerCase => first.and_then(|t| map_string(t, str::to_lowercase)),
        Function::UpperCase => first.and_then(|t| map_string(t, str::to_uppercase)),
        Function::Contains | Function::StrStarts | Function::StrEnds => {
            match (
                values.first().and_then(string_value),
                values.get(1).and_then(string_value),
            ) {
                (Some(haystack), Some(needle)) => Some(boolean(match function {
                    Function::Contains => haystack.contains(needle),
                    Function::StrStarts => haystack.starts_with(needle),
                    _ => haystack.ends_with(needle),
                })),
                _ => None,
            }
        }
        Function::Concat => {
            let mut joined = String::new();
            for term in &values {
                match string_value(term) {
                    Some(part) => joined.push_str(part),
                    None => return Ok(None),
                }
            }
            Some(Term::literal(joined))
        }
        Function::Bound | Function::If | Function::Coalesce => None,
    };
    Ok(term)
}

/// Apply a string transformation, keeping the language tag.
fn map_string(term: &Term, f: impl Fn(&str) -> String) -> Option<Term> {
    match term {
        Term::Literal(literal) if literal.language.is_some() => Some(Term::Literal(Literal {
            value: f(&literal.value),
            language: literal.language.clone(),
            datatype: None,
        })),
        other => simple_string(other).map(|s| Term::literal(f(s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Term {
        Term::typed_literal(n.to_string(), XSD_INTEGER)
    }

    fn eval(expression: &Expression, solution: &Solution) -> Option<Term> {
        let dataset = Dataset::new();
        let scope = Scope {
            dataset: &dataset,
            active: &GraphName::Default,
            solution,
        };
        value(expression, &scope).unwrap()
    }

    fn var(name: &str) -> Box<Expression> {
        Box::new(Expression::Variable(name.to_string()))
    }

    fn lit(term: Term) -> Box<Expression> {
        Box::new(Expression::Term(term))
    }

    #[test]
    fn test_numeric_comparison_crosses_datatypes() {
        let solution = Solution::from([("n".to_string(), int(3))]);
        let decimal = Term::typed_literal("2.5", XSD_DECIMAL);
        let greater = Expression::Compare(Comparison::Greater, var("n"), lit(decimal));
        assert_eq!(eval(&greater, &solution), Some(boolean(true)));

        let text = Expression::Compare(Comparison::Less, var("n"), lit(Term::literal("4")));
        assert_eq!(eval(&text, &solution), None);
    }

    #[test]
    fn test_arithmetic_stays_integer_until_division() {
        let solution = Solution::from([("n".to_string(), int(7))]);
        let sum = Expression::Arithmetic(Arithmetic::Add, var("n"), lit(int(1)));
        assert_eq!(eval(&sum, &solution), Some(int(8)));

        let half = Expression::Arithmetic(Arithmetic::Divide, var("n"), lit(int(2)));
        assert_eq!(eval(&half, &solution), Some(Term::typed_literal("3.5", XSD_DECIMAL)));

        let by_zero = Expression::Arithmetic(Arithmetic::Divide, var("n"), lit(int(0)));
        assert_eq!(eval(&by_zero, &solution), None);
    }

    #[test]
    fn test_or_tolerates_an_error_beside_true() {
        let solution = Solution::new();
        let unbound_or_true = Expression::Or(var("missing"), lit(boolean(true)));
        assert_eq!(eval(&unbound_or_true, &solution), Some(boolean(true)));

        let unbound_and_true = Expression::And(var("missing"), lit(boolean(true)));
        assert_eq!(eval(&unbound_and_true, &solution), None);
    }

    #[test]
    fn test_string_functions_keep_language() {
        let solution = Solution::from([("w".to_string(), Term::lang_literal("Cat", "en"))]);
        let lower = Expression::Call(Function::LowerCase, vec![*var("w")]);
        assert_eq!(eval(&lower, &solution), Some(Term::lang_literal("cat", "en")));

        let lang = Expression::Call(Function::Lang, vec![*var("w")]);
        assert_eq!(eval(&lang, &solution), Some(Term::literal("en")));

        let starts = Expression::Call(Function::StrStarts, vec![*var("w"), *lit(Term::literal("Ca"))]);
        assert_eq!(eval(&starts, &solution), Some(boolean(true)));
    }

    #[test]
    fn test_bound_and_coalesce() {
        let solution = Solution::from([("x".to_string(), Term::iri("http://ex.org/x"))]);
        let bound = Expression::Call(Function::Bound, vec![*var("y")]);
        assert_eq!(eval(&bound, &solution), Some(boolean(false)));

        let first = Expression::Call(Function::Coalesce, vec![*var("y"), *var("x")]);
        assert_eq!(eval(&first, &solution), Some(Term::iri("http://ex.org/x")));
    }
}
