//! Projection of request data onto a rule set
use crate::rules::RuleSet;
use serde_json::{Map, Number, Value};

/// Largest magnitude at which every integer is exactly representable as an `f64`.
const MAX_SAFE_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Keeps the candidate fields named by `rules`, in rule order.
///
/// Fields missing from `candidate` are left out rather than defaulted, so the engine decides what "required"
/// means. When `coerce` is set, string values that read as numbers become JSON numbers.
pub fn project<R>(candidate: &Map<String, Value>, rules: &RuleSet<R>, coerce: bool) -> Map<String, Value> {
  rules
    .keys()
    .filter_map(|key| {
      let value = candidate.get(key)?;
      let value = if coerce { coerce_value(value) } else { value.clone() };
      Some((key.to_owned(), value))
    })
    .collect()
}

/// Parses `raw` as a number when the whole string is a finite numeral.
///
/// Integral values are returned as integers (`"1e3"` gives `1000`), everything else as a float. Unlike a
/// JavaScript `isNaN` check, empty strings, padded numerals (`" 42 "`) and hex literals (`"0x10"`) stay strings.
pub fn coerce_number(raw: &str) -> Option<Value> {
  if let Ok(int) = raw.parse::<i64>() {
    return Some(int.into());
  }
  if let Ok(uint) = raw.parse::<u64>() {
    return Some(uint.into());
  }

  let float = raw.parse::<f64>().ok().filter(|f| f.is_finite())?;
  if float.fract() == 0.0 && float.abs() <= MAX_SAFE_FLOAT_INT {
    return Some((float as i64).into());
  }
  Number::from_f64(float).map(Value::Number)
}

fn coerce_value(value: &Value) -> Value {
  match value {
    Value::String(raw) => coerce_number(raw).unwrap_or_else(|| {
      log::trace!("Keeping non-numeric value {raw:?} as string");
      value.clone()
    }),
    other => other.clone(),
  }
}
