//! In-process evaluation of the predicate shapes the builder emits.
//!
//! The mock backends have to honor the same filters a real service would.
//! This is not a SQL engine: it recognizes exactly the three fragment
//! shapes the predicate builder produces (pass-all, `LIKE '%x%'`, and an
//! integer comparison) and nothing else. An unrecognized fragment, or a
//! comparison against a field the row does not carry (the literal
//! analytical placeholder, for instance), matches no rows.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{get_ci, AttributeMap};
use crate::predicate::PASS_ALL;

/// A parsed filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Like { field: String, needle: String },
    Cmp { field: String, op: CmpOp, operand: i64 },
    /// Unrecognized fragment; matches nothing.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

fn like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\w+)\s+LIKE\s+'%(.*)%'$").expect("like pattern"))
}

fn cmp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w{}]+)\s*(>=|<=|>|<|=)\s*(-?\d+)$").expect("cmp pattern"))
}

/// Parse a where-expression into an evaluable filter.
pub fn parse(where_expr: &str) -> Filter {
    let expr = where_expr.trim();
    if expr.is_empty() || expr == PASS_ALL {
        return Filter::All;
    }

    if let Some(caps) = like_re().captures(expr) {
        return Filter::Like {
            field: caps[1].to_owned(),
            needle: caps[2].to_lowercase(),
        };
    }

    if let Some(caps) = cmp_re().captures(expr) {
        let op = match &caps[2] {
            ">" => CmpOp::Gt,
            ">=" => CmpOp::Gte,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Lte,
            _ => CmpOp::Eq,
        };
        if let Ok(operand) = caps[3].parse::<i64>() {
            return Filter::Cmp { field: caps[1].to_owned(), op, operand };
        }
    }

    Filter::Nothing
}

/// Does a row match the filter?
pub fn matches(filter: &Filter, attrs: &AttributeMap) -> bool {
    match filter {
        Filter::All => true,
        Filter::Nothing => false,
        Filter::Like { field, needle } => get_ci(attrs, field)
            .map(|v| v.display_string().to_lowercase().contains(needle))
            .unwrap_or(false),
        Filter::Cmp { field, op, operand } => {
            // Values are coerced to integers; a row whose field cannot be
            // read as a number simply does not match.
            let Some(value) = get_ci(attrs, field).and_then(|v| v.as_int()) else {
                return false;
            };
            match op {
                CmpOp::Gt => value > *operand,
                CmpOp::Gte => value >= *operand,
                CmpOp::Lt => value < *operand,
                CmpOp::Lte => value <= *operand,
                CmpOp::Eq => value == *operand,
            }
        }
    }
}
