//! Search parameter validation and filter compilation.

use tracing::{debug, warn};

use aggreports_core::ValidationError;
use aggreports_core::wire::describe;

use crate::filter::{Condition, Filter, Literal, Range};
use crate::param::{INVENTORY_CATEGORY, ParamType, SearchByFieldValue, SearchCriteria, SearchParam};

/// Compile the inventory category of `criteria`.
pub fn compile(criteria: &SearchCriteria) -> Result<Filter, ValidationError> {
    compile_category(criteria, INVENTORY_CATEGORY)
}

pub fn compile_category(criteria: &SearchCriteria, category: &str) -> Result<Filter, ValidationError> {
    let filter = compile_params(criteria.category(category))?;
    debug!(category, clauses = filter.len(), filter = %filter, "compiled search filter");
    Ok(filter)
}

/// Validate every parameter in order and build the conjunctive filter.
///
/// Checks run per parameter as: type, field, bound present, bounds not
/// mixed, then type-specific parsing. The first failure aborts the whole
/// compilation. Parameters of an unknown type are skipped. A later
/// parameter on the same field replaces the earlier clause.
pub fn compile_params(params: &[SearchParam]) -> Result<Filter, ValidationError> {
    let mut filter = Filter::new();
    for (index, param) in params.iter().enumerate() {
        let Some(condition) = compile_param(index, param)? else {
            continue;
        };
        if let Some(previous) = filter.insert(param.field.clone(), condition) {
            debug!(index, field = %param.field, ?previous, "search parameter replaces earlier clause");
        }
    }
    Ok(filter)
}

/// Single equality clause from a field/value search.
///
/// Only the last usable pair counts; earlier pairs are ignored. `None` when
/// no pair is usable.
pub fn compile_field_values(pairs: &[SearchByFieldValue]) -> Result<Option<Filter>, ValidationError> {
    let Some((index, pair)) = pairs.iter().enumerate().rev().find(|(_, p)| p.is_usable()) else {
        return Ok(None);
    };
    if pairs.len() > 1 {
        debug!(index, pairs = pairs.len(), field = %pair.search_field, "field/value search keeps the last usable pair");
    }
    let literal = Literal::from_value(&pair.search_val).ok_or_else(|| ValidationError::UnsupportedValue {
        index,
        field: pair.search_field.clone(),
        found: describe(&pair.search_val),
    })?;
    Ok(Some(Filter::eq(pair.search_field.clone(), literal)))
}

fn compile_param(index: usize, param: &SearchParam) -> Result<Option<Condition>, ValidationError> {
    if param.kind.is_empty() {
        return Err(ValidationError::MissingType { index });
    }
    if param.field.is_empty() {
        return Err(ValidationError::MissingField { index });
    }
    match (param.has_equal(), param.has_limits()) {
        (false, false) => {
            return Err(ValidationError::MissingBound {
                index,
                field: param.field.clone(),
            });
        }
        (true, true) => {
            return Err(ValidationError::ConflictingBounds {
                index,
                field: param.field.clone(),
            });
        }
        _ => {}
    }

    let Some(kind) = ParamType::parse(&param.kind) else {
        warn!(index, field = %param.field, kind = %param.kind, "ignoring search parameter of unknown type");
        return Ok(None);
    };

    let condition = match kind {
        ParamType::Text if param.has_equal() => Condition::Eq(Literal::Text(param.equal.clone())),
        ParamType::Text => {
            return Err(ValidationError::TextRange {
                index,
                field: param.field.clone(),
            });
        }
        ParamType::Float if param.has_equal() => Condition::Eq(Literal::Float(parse_float(index, param)?)),
        ParamType::Float => Condition::Range(Range {
            gt: set_limit(param.lower_limit).map(Literal::Float),
            lt: set_limit(param.upper_limit).map(Literal::Float),
        }),
        ParamType::Int if param.has_equal() => Condition::Eq(Literal::Int(parse_int(index, param)?)),
        ParamType::Int => Condition::Range(Range {
            gt: set_limit(param.lower_limit).map(|l| Literal::Int(l as i64)),
            lt: set_limit(param.upper_limit).map(|l| Literal::Int(l as i64)),
        }),
    };
    Ok(Some(condition))
}

fn set_limit(limit: f64) -> Option<f64> {
    (limit != 0.0).then_some(limit)
}

fn parse_float(index: usize, param: &SearchParam) -> Result<f64, ValidationError> {
    let bad = |reason: String| ValidationError::BadFloat {
        index,
        field: param.field.clone(),
        value: param.equal.clone(),
        reason,
    };
    let value = param
        .equal
        .trim()
        .parse::<f64>()
        .map_err(|e| bad(e.to_string()))?;
    if !value.is_finite() {
        return Err(bad("not a finite number".to_string()));
    }
    Ok(value)
}

fn parse_int(index: usize, param: &SearchParam) -> Result<i64, ValidationError> {
    param
        .equal
        .trim()
        .parse::<i64>()
        .map_err(|e| ValidationError::BadInt {
            index,
            field: param.field.clone(),
            value: param.equal.clone(),
            reason: e.to_string(),
        })
}
