//! Rule engines the middleware delegates validation to
use crate::rules::RuleSet;
use derive_more::{AsRef, Deref, From};
use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::marker::PhantomData;

pub const MISSING_FIELD: &str = "missing_field";
pub const INVALID: &str = "invalid";

/// One failed field, as reported by a rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub message: String,
  pub code: String,
  pub field: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      code: code.into(),
      field: field.into(),
    }
  }

  pub fn missing(field: impl Into<String>) -> Self {
    Self::new(field, MISSING_FIELD, "required")
  }

  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::new(field, INVALID, message)
  }
}

/// Ordered list of field errors. Serializes as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, AsRef, Deref, From)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
  pub fn into_inner(self) -> Vec<FieldError> {
    self.0
  }

  /// `Ok(())` when no error was collected
  pub fn into_result(self) -> Result<(), Self> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl FromIterator<FieldError> for FieldErrors {
  fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// Validates projected request data against a rule set.
///
/// Engines are shared by every request going through a middleware and must not keep per-request state.
/// Any `Fn(&RuleSet<R>, &Map<String, Value>) -> Result<(), FieldErrors>` is an engine.
pub trait RuleEngine<R> {
  fn validate(&self, rules: &RuleSet<R>, data: &Map<String, Value>) -> Result<(), FieldErrors>;
}

impl<R, F> RuleEngine<R> for F
where
  F: Fn(&RuleSet<R>, &Map<String, Value>) -> Result<(), FieldErrors>,
{
  fn validate(&self, rules: &RuleSet<R>, data: &Map<String, Value>) -> Result<(), FieldErrors> {
    (self)(rules, data)
  }
}

/// Engine backed by a [garde](https://github.com/jprochazk/garde) type.
///
/// Projected data is deserialized into `T`, then validated with `T`'s garde rules. Rule descriptions from the
/// [`RuleSet`] are ignored, so `RuleSet<()>` is enough: the rule set only decides which fields reach `T`, and
/// every field `T` expects must be declared in it.
///
/// ```rust
/// use garde::Validate;
/// use garde_actix_middleware::{GardeEngine, RuleEngine, RuleSet};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize, Validate)]
/// struct Item {
///   #[garde(range(min = 1))]
///   id: u64,
/// }
///
/// let rules = RuleSet::new().field("id", ());
/// let data = json!({ "id": 42 }).as_object().cloned().unwrap_or_default();
/// assert!(GardeEngine::<Item>::new().validate(&rules, &data).is_ok());
/// ```
pub struct GardeEngine<T: Validate> {
  context: T::Context,
  marker: PhantomData<fn() -> T>,
}

impl<T> GardeEngine<T>
where
  T: Validate,
  T::Context: Default,
{
  pub fn new() -> Self {
    Self::with_context(T::Context::default())
  }
}

impl<T: Validate> GardeEngine<T> {
  /// Validates against `context` instead of `T::Context::default()`.
  pub fn with_context(context: T::Context) -> Self {
    Self {
      context,
      marker: PhantomData,
    }
  }

  pub fn context(&self) -> &T::Context {
    &self.context
  }
}

impl<T> Default for GardeEngine<T>
where
  T: Validate,
  T::Context: Default,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<T, R> RuleEngine<R> for GardeEngine<T>
where
  T: DeserializeOwned + Validate,
{
  fn validate(&self, _rules: &RuleSet<R>, data: &Map<String, Value>) -> Result<(), FieldErrors> {
    let value: T = serde_path_to_error::deserialize(Value::Object(data.clone()))
      .map_err(|e| FieldErrors::from(vec![deserialize_error(&e)]))?;

    value.validate_with(&self.context).map_err(|report| {
      report
        .iter()
        .map(|(path, error)| FieldError::invalid(path.to_string(), error.to_string()))
        .collect()
    })
  }
}

fn deserialize_error(error: &serde_path_to_error::Error<serde_json::Error>) -> FieldError {
  let path = error.path().to_string();
  let path = if path == "." { "" } else { path.as_str() };
  let message = error.inner().to_string();

  match missing_field_name(&message) {
    Some(name) if path.is_empty() => FieldError::missing(name),
    Some(name) => FieldError::missing(format!("{path}.{name}")),
    None => FieldError::invalid(path, message),
  }
}

// serde reports missing fields on the enclosing struct as "missing field `name`"
fn missing_field_name(message: &str) -> Option<&str> {
  message.strip_prefix("missing field `")?.split('`').next()
}

#[cfg(test)]
mod test {
  use super::{FieldError, FieldErrors, GardeEngine, RuleEngine, INVALID};
  use crate::rules::RuleSet;
  use garde::Validate;
  use serde::Deserialize;
  use serde_json::{json, Map, Value};

  #[derive(Debug, Deserialize, Validate)]
  struct Item {
    #[garde(range(min = 1))]
    id: u64,
    #[garde(length(min = 3, max = 25))]
    name: String,
  }

  #[derive(Debug, Deserialize, Validate)]
  #[garde(context(Limits))]
  struct Page {
    #[garde(custom(within_limit))]
    size: u32,
  }

  #[derive(Debug, Default)]
  struct Limits {
    max: u32,
  }

  fn within_limit(value: &u32, context: &Limits) -> garde::Result {
    if *value > context.max {
      return Err(garde::Error::new("page is too large"));
    }
    Ok(())
  }

  fn data(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }

  fn item_rules() -> RuleSet<()> {
    RuleSet::new().field("id", ()).field("name", ())
  }

  #[test]
  fn test_garde_engine_accepts_valid_data() {
    let engine = GardeEngine::<Item>::new();
    let result = engine.validate(&item_rules(), &data(json!({ "id": 42, "name": "widget" })));

    assert_eq!(result, Ok(()));
  }

  #[test]
  fn test_garde_engine_reports_missing_field() {
    let engine = GardeEngine::<Item>::new();
    let errors = engine.validate(&item_rules(), &data(json!({ "name": "widget" }))).unwrap_err();

    assert_eq!(errors.into_inner(), vec![FieldError::missing("id")]);
  }

  #[test]
  fn test_garde_engine_reports_type_mismatch_with_path() {
    let engine = GardeEngine::<Item>::new();
    let errors = engine
      .validate(&item_rules(), &data(json!({ "id": "abc", "name": "widget" })))
      .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "id");
    assert_eq!(errors[0].code, INVALID);
  }

  #[test]
  fn test_garde_engine_reports_every_rule_violation() {
    let engine = GardeEngine::<Item>::new();
    let errors = engine
      .validate(&item_rules(), &data(json!({ "id": 0, "name": "ab" })))
      .unwrap_err();

    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(errors.len(), 2);
    assert!(fields.contains(&"id"));
    assert!(fields.contains(&"name"));
    assert!(errors.iter().all(|e| e.code == INVALID));
  }

  #[test]
  fn test_garde_engine_with_context() {
    let rules = RuleSet::new().field("size", ());

    let strict = GardeEngine::<Page>::with_context(Limits { max: 10 });
    assert_eq!(strict.context().max, 10);
    let errors = strict.validate(&rules, &data(json!({ "size": 50 }))).unwrap_err();
    assert_eq!(errors[0].field, "size");
    assert_eq!(errors[0].message, "page is too large");

    let relaxed = GardeEngine::<Page>::with_context(Limits { max: 100 });
    assert_eq!(relaxed.validate(&rules, &data(json!({ "size": 50 }))), Ok(()));
  }

  #[test]
  fn test_closure_engine() {
    let engine = |rules: &RuleSet<&str>, data: &Map<String, Value>| -> Result<(), FieldErrors> {
      rules
        .keys()
        .filter(|key| !data.contains_key(*key))
        .map(FieldError::missing)
        .collect::<FieldErrors>()
        .into_result()
    };
    let rules = RuleSet::new().field("a", "any").field("b", "any");

    assert_eq!(engine.validate(&rules, &data(json!({ "a": 1, "b": 2 }))), Ok(()));
    assert_eq!(
      engine.validate(&rules, &data(json!({ "a": 1 }))),
      Err(FieldErrors::from(vec![FieldError::missing("b")]))
    );
  }

  #[test]
  fn test_field_errors_serialize_as_array() {
    let errors = FieldErrors::from(vec![FieldError::missing("id")]);

    assert_eq!(
      serde_json::to_value(&errors).unwrap(),
      json!([{ "message": "required", "code": "missing_field", "field": "id" }])
    );
  }
}
