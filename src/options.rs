//! Middleware configuration
use crate::source::Source;
use actix_web::http::StatusCode;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Status used for rejected requests unless configured otherwise.
pub const DEFAULT_ERROR_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// How a rejected request is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
  /// Error with the message `"<label> is invalid."`
  #[default]
  Simple,
  /// `application/json` response whose body is the list of field errors
  Json,
  /// Error with the message `"<label> is invalid."` followed by the serialized field errors
  #[serde(alias = "complex")]
  Detailed,
}

/// Which sources get numeric strings turned into numbers before validation.
///
/// Custom sources are never coerced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
  /// Path parameters and query strings, whose values are always strings
  #[default]
  Auto,
  /// Every built-in source, body included
  Always,
  Never,
}

impl Coercion {
  pub fn applies_to(self, source: &Source) -> bool {
    match (self, source) {
      (_, Source::Custom(_)) | (Coercion::Never, _) => false,
      (Coercion::Always, _) => true,
      (Coercion::Auto, source) => matches!(source, Source::Params | Source::Query),
    }
  }
}

/// Validation options, fixed when the middleware is built.
///
/// Can be loaded from configuration; missing keys take their defaults:
///
/// ```rust
/// use garde_actix_middleware::{OutputStyle, Options};
///
/// let options: Options = serde_json::from_str(r#"{ "source": "body", "output_style": "json", "error_status": 409 }"#)
///   .unwrap_or_default();
/// assert_eq!(options.output_style, OutputStyle::Json);
/// assert_eq!(options.error_status.as_u16(), 409);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
  pub source: Source,
  pub output_style: OutputStyle,
  #[serde(deserialize_with = "deserialize_status")]
  pub error_status: StatusCode,
  pub coercion: Coercion,
}

impl Options {
  /// Whether values drawn from the configured source are coerced
  pub fn coerces(&self) -> bool {
    self.coercion.applies_to(&self.source)
  }
}

impl Default for Options {
  fn default() -> Self {
    Self {
      source: Source::default(),
      output_style: OutputStyle::default(),
      error_status: DEFAULT_ERROR_STATUS,
      coercion: Coercion::default(),
    }
  }
}

fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
  let code = u16::deserialize(deserializer)?;
  StatusCode::from_u16(code).map_err(D::Error::custom)
}

#[cfg(test)]
mod test {
  use super::{Coercion, Options, OutputStyle, DEFAULT_ERROR_STATUS};
  use crate::source::Source;
  use actix_web::http::StatusCode;
  use serde_json::{json, Map};

  #[test]
  fn test_default_options() {
    let options = Options::default();

    assert_eq!(options.source.tag(), Some("params"));
    assert_eq!(options.output_style, OutputStyle::Simple);
    assert_eq!(options.error_status, DEFAULT_ERROR_STATUS);
    assert_eq!(options.coercion, Coercion::Auto);
    assert!(options.coerces());
  }

  #[test]
  fn test_deserialize_options() {
    let options: Options = serde_json::from_value(json!({
      "source": "query",
      "output_style": "complex",
      "error_status": 409,
      "coercion": "never"
    }))
    .unwrap();

    assert_eq!(options.source.tag(), Some("query"));
    assert_eq!(options.output_style, OutputStyle::Detailed);
    assert_eq!(options.error_status, StatusCode::CONFLICT);
    assert!(!options.coerces());
  }

  #[test]
  fn test_deserialize_partial_options() {
    let options: Options = serde_json::from_value(json!({ "source": "cookies" })).unwrap();

    assert_eq!(options.source.tag(), Some("params"));
    assert_eq!(options.error_status, DEFAULT_ERROR_STATUS);
  }

  #[test]
  fn test_deserialize_invalid_status() {
    assert!(serde_json::from_value::<Options>(json!({ "error_status": 1000 })).is_err());
  }

  #[test]
  fn test_coercion_policy() {
    let custom = Source::custom(|_req| Ok(Map::new()));

    assert!(Coercion::Auto.applies_to(&Source::Params));
    assert!(Coercion::Auto.applies_to(&Source::Query));
    assert!(!Coercion::Auto.applies_to(&Source::Body));
    assert!(Coercion::Always.applies_to(&Source::Body));
    assert!(!Coercion::Always.applies_to(&custom));
    assert!(!Coercion::Never.applies_to(&Source::Params));
  }
}
