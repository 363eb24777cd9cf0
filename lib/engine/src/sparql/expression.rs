use crate::sparql::eval::Bindings;
use mediator_common::{MediationError, MediationResult};
use mediator_model::{vocab::xsd, Literal, Term};
use regex::RegexBuilder;
use spargebra::algebra::{Expression, Function};
use std::cmp::Ordering;

/// Computes the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of
/// `expression`. Errors of the expression (e.g. unbound variables) evaluate to `false`.
pub(super) fn effective_boolean_value(
    expression: &Expression,
    bindings: &Bindings,
) -> MediationResult<bool> {
    Ok(evaluate(expression, bindings)?
        .as_ref()
        .and_then(to_bool)
        .unwrap_or(false))
}

/// Evaluates `expression`. `None` is a SPARQL expression error.
fn evaluate(expression: &Expression, bindings: &Bindings) -> MediationResult<Option<Term>> {
    Ok(match expression {
        Expression::NamedNode(node) => Some(node.clone().into()),
        Expression::Literal(literal) => Some(literal.clone().into()),
        Expression::Variable(variable) => bindings.get(variable).cloned(),
        Expression::Bound(variable) => Some(bool_term(bindings.contains_key(variable))),
        Expression::Not(inner) => evaluate_bool(inner, bindings)?.map(|value| bool_term(!value)),
        Expression::And(left, right) => {
            let left = evaluate_bool(left, bindings)?;
            let right = evaluate_bool(right, bindings)?;
            match (left, right) {
                (Some(false), _) | (_, Some(false)) => Some(bool_term(false)),
                (Some(true), Some(true)) => Some(bool_term(true)),
                _ => None,
            }
        }
        Expression::Or(left, right) => {
            let left = evaluate_bool(left, bindings)?;
            let right = evaluate_bool(right, bindings)?;
            match (left, right) {
                (Some(true), _) | (_, Some(true)) => Some(bool_term(true)),
                (Some(false), Some(false)) => Some(bool_term(false)),
                _ => None,
            }
        }
        Expression::SameTerm(left, right) => evaluate_pair(left, right, bindings)?
            .map(|(left, right)| bool_term(left == right)),
        Expression::Equal(left, right) => {
            evaluate_pair(left, right, bindings)?.map(|(left, right)| {
                bool_term(match compare(&left, &right) {
                    Some(ordering) => ordering == Ordering::Equal,
                    None => left == right,
                })
            })
        }
        Expression::Greater(left, right) => {
            evaluate_comparison(left, right, bindings, Ordering::is_gt)?
        }
        Expression::GreaterOrEqual(left, right) => {
            evaluate_comparison(left, right, bindings, Ordering::is_ge)?
        }
        Expression::Less(left, right) => {
            evaluate_comparison(left, right, bindings, Ordering::is_lt)?
        }
        Expression::LessOrEqual(left, right) => {
            evaluate_comparison(left, right, bindings, Ordering::is_le)?
        }
        Expression::FunctionCall(function, arguments) => {
            evaluate_function(function, arguments, bindings)?
        }
        _ => {
            return Err(MediationError::Evaluation(format!(
                "the expression {expression} is not supported"
            )))
        }
    })
}

fn evaluate_bool(expression: &Expression, bindings: &Bindings) -> MediationResult<Option<bool>> {
    Ok(evaluate(expression, bindings)?.as_ref().and_then(to_bool))
}

fn evaluate_pair(
    left: &Expression,
    right: &Expression,
    bindings: &Bindings,
) -> MediationResult<Option<(Term, Term)>> {
    let left = evaluate(left, bindings)?;
    let right = evaluate(right, bindings)?;
    Ok(left.zip(right))
}

fn evaluate_comparison(
    left: &Expression,
    right: &Expression,
    bindings: &Bindings,
    accept: fn(Ordering) -> bool,
) -> MediationResult<Option<Term>> {
    Ok(evaluate_pair(left, right, bindings)?
        .and_then(|(left, right)| compare(&left, &right))
        .map(|ordering| bool_term(accept(ordering))))
}

fn evaluate_function(
    function: &Function,
    arguments: &[Expression],
    bindings: &Bindings,
) -> MediationResult<Option<Term>> {
    let mut values = Vec::with_capacity(arguments.len());
    for argument in arguments {
        values.push(evaluate(argument, bindings)?);
    }
    Ok(match (function, values.as_slice()) {
        (Function::Str, [Some(value)]) => string_value(value).map(string_term),
        (Function::Lang, [Some(Term::Literal(literal))]) => {
            Some(string_term(literal.language().unwrap_or_default()))
        }
        (Function::Contains, [Some(Term::Literal(text)), Some(Term::Literal(pattern))]) => {
            Some(bool_term(text.value().contains(pattern.value())))
        }
        (Function::StrStarts, [Some(Term::Literal(text)), Some(Term::Literal(pattern))]) => {
            Some(bool_term(text.value().starts_with(pattern.value())))
        }
        (Function::Regex, [Some(Term::Literal(text)), Some(Term::Literal(pattern))]) => {
            regex_match(text.value(), pattern.value(), "")
        }
        (
            Function::Regex,
            [Some(Term::Literal(text)), Some(Term::Literal(pattern)), Some(Term::Literal(flags))],
        ) => regex_match(text.value(), pattern.value(), flags.value()),
        (Function::Str | Function::Lang | Function::Contains | Function::StrStarts, _)
        | (Function::Regex, _) => None,
        _ => {
            return Err(MediationError::Evaluation(format!(
                "the function {function} is not supported"
            )))
        }
    })
}

fn regex_match(text: &str, pattern: &str, flags: &str) -> Option<Term> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            's' => builder.dot_matches_new_line(true),
            'm' => builder.multi_line(true),
            'x' => builder.ignore_whitespace(true),
            _ => return None,
        };
    }
    let regex = builder.build().ok()?;
    Some(bool_term(regex.is_match(text)))
}

fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(node) => Some(node.as_str()),
        Term::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

fn bool_term(value: bool) -> Term {
    Literal::from(value).into()
}

fn string_term(value: &str) -> Term {
    Literal::new_simple_literal(value).into()
}

fn to_bool(term: &Term) -> Option<bool> {
    let Term::Literal(literal) = term else {
        return None;
    };
    let datatype = literal.datatype();
    if datatype == xsd::BOOLEAN {
        match literal.value() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    } else if datatype == xsd::STRING {
        Some(!literal.value().is_empty())
    } else {
        numeric_value(literal).map(|value| value != 0.0 && !value.is_nan())
    }
}

/// Compares two terms. Numbers are compared by value, literals of the same datatype by their
/// lexical form. Everything else is incomparable.
fn compare(left: &Term, right: &Term) -> Option<Ordering> {
    let (Term::Literal(left), Term::Literal(right)) = (left, right) else {
        return None;
    };
    if let (Some(left), Some(right)) = (numeric_value(left), numeric_value(right)) {
        return left.partial_cmp(&right);
    }
    (left.datatype() == right.datatype() && left.language() == right.language())
        .then(|| left.value().cmp(right.value()))
}

fn numeric_value(literal: &Literal) -> Option<f64> {
    let datatype = literal.datatype();
    let numeric = [
        xsd::INTEGER,
        xsd::DECIMAL,
        xsd::DOUBLE,
        xsd::FLOAT,
        xsd::INT,
        xsd::LONG,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ];
    if !numeric.contains(&datatype) {
        return None;
    }
    literal.value().trim().parse().ok()
}
