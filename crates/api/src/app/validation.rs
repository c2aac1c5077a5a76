//! Declarative request validation.
//!
//! Each route declares one [`Chain`] per field; [`run`] evaluates every
//! chain against the request, stops a chain at its first failing rule,
//! and collects one [`Violation`] per failed chain in declaration order.
//! Value coercion (`decimal_field`, `int_param`, ...) happens only after
//! the chains passed.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// One failed field check, rendered verbatim in the 400 body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Required,
    Numeric,
    Integer,
    GtZero,
    Boolean,
    IsEmail,
    MaxLen(usize),
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Body,
    Param,
}

/// A per-field rule chain. Built with [`body`] or [`param`], then one
/// builder call per rule; rule order is evaluation order.
pub struct Chain {
    field: &'static str,
    source: Source,
    optional: bool,
    rules: Vec<(Rule, &'static str)>,
}

/// Chain over a JSON body field.
pub fn body(field: &'static str) -> Chain {
    Chain {
        field,
        source: Source::Body,
        optional: false,
        rules: Vec::new(),
    }
}

/// Chain over a path parameter.
pub fn param(field: &'static str) -> Chain {
    Chain {
        field,
        source: Source::Param,
        optional: false,
        rules: Vec::new(),
    }
}

impl Chain {
    /// Skip the whole chain when the field is absent from the request.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::Required, message));
        self
    }

    pub fn numeric(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::Numeric, message));
        self
    }

    pub fn integer(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::Integer, message));
        self
    }

    pub fn gt_zero(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::GtZero, message));
        self
    }

    pub fn boolean(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::Boolean, message));
        self
    }

    pub fn is_email(mut self, message: &'static str) -> Self {
        self.rules.push((Rule::IsEmail, message));
        self
    }

    pub fn max_len(mut self, limit: usize, message: &'static str) -> Self {
        self.rules.push((Rule::MaxLen(limit), message));
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str], message: &'static str) -> Self {
        self.rules.push((Rule::OneOf(allowed), message));
        self
    }
}

/// Evaluate every chain; `Err` carries one violation per failed chain,
/// in chain declaration order.
pub fn run(chains: &[Chain], body: &Value, params: &[(&str, &str)]) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    for chain in chains {
        let value = match chain.source {
            Source::Body => body.get(chain.field).cloned(),
            Source::Param => params
                .iter()
                .find(|(name, _)| *name == chain.field)
                .map(|(_, raw)| Value::String((*raw).to_string())),
        };

        if chain.optional && value.is_none() {
            continue;
        }

        for (rule, message) in &chain.rules {
            if !check(*rule, value.as_ref()) {
                violations.push(Violation {
                    field: chain.field.to_string(),
                    message: (*message).to_string(),
                });
                break;
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check(rule: Rule, value: Option<&Value>) -> bool {
    match rule {
        Rule::Required => match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        },
        Rule::Numeric => match value {
            Some(Value::Number(_)) => true,
            Some(Value::String(s)) => s.trim().parse::<Decimal>().is_ok(),
            _ => false,
        },
        Rule::Integer => match value {
            Some(Value::Number(n)) => n.as_i64().is_some_and(|v| i32::try_from(v).is_ok()),
            Some(Value::String(s)) => s.trim().parse::<i32>().is_ok(),
            _ => false,
        },
        // Prices persist at two decimals, so the rule judges the value the
        // store will actually see: 0.004 rounds to 0.00 and fails here.
        Rule::GtZero => as_decimal(value).is_some_and(|d| d.round_dp(2) > Decimal::ZERO),
        Rule::Boolean => matches!(value, Some(Value::Bool(_))),
        Rule::IsEmail => match value {
            Some(Value::String(s)) => is_valid_email(s),
            _ => false,
        },
        Rule::MaxLen(limit) => match value {
            Some(Value::String(s)) => s.chars().count() <= limit,
            _ => false,
        },
        Rule::OneOf(allowed) => match value {
            Some(Value::String(s)) => allowed.contains(&s.as_str()),
            _ => false,
        },
    }
}

fn as_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value {
        Some(Value::Number(n)) => n.to_string().parse::<Decimal>().ok(),
        Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn is_valid_email(raw: &str) -> bool {
    if raw.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = raw.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty())
}

/// Coerce a validated body field to a two-decimal price.
pub fn decimal_field(body: &Value, field: &str) -> Option<Decimal> {
    as_decimal(body.get(field)).map(|d| d.round_dp(2))
}

/// Coerce a validated path parameter to an id.
pub fn int_param(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

pub fn string_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

pub fn bool_field(body: &Value, field: &str) -> Option<bool> {
    body.get(field).and_then(Value::as_bool)
}
