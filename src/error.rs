//! Errors raised by the validation middleware
//!
//! Custom error handlers (see [`ValidateRequest::error_handler`](crate::ValidateRequest::error_handler)) map from a
//! `garde_actix_middleware::error::Error` to an `actix_web::error::Error`
use crate::engine::FieldErrors;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  ValidationError(Rejection),
  #[error("Payload error: {0}")]
  JsonPayloadError(serde_json::Error),
  #[error("Urlencoded error: {0}")]
  UrlencodedError(serde_urlencoded::de::Error),
  #[error("Query error: {0}")]
  QueryPayloadError(serde_urlencoded::de::Error),
  #[cfg(feature = "serde_qs")]
  #[error("Query error: {0}")]
  QsError(serde_qs::Error),
}

impl From<Rejection> for Error {
  fn from(rejection: Rejection) -> Self {
    Self::ValidationError(rejection)
  }
}

impl From<serde_json::Error> for Error {
  fn from(error: serde_json::Error) -> Self {
    Self::JsonPayloadError(error)
  }
}

#[cfg(feature = "serde_qs")]
impl From<serde_qs::Error> for Error {
  fn from(error: serde_qs::Error) -> Self {
    Self::QsError(error)
  }
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::ValidationError(rejection) => rejection.status(),
      Error::JsonPayloadError(_) | Error::UrlencodedError(_) | Error::QueryPayloadError(_) => StatusCode::BAD_REQUEST,
      #[cfg(feature = "serde_qs")]
      Error::QsError(_) => StatusCode::BAD_REQUEST,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .content_type(mime::TEXT_PLAIN_UTF_8)
      .body(format!("{}", *self))
  }
}

/// A request that failed validation.
///
/// Displays as `"<label> is invalid."`, followed by the serialized field errors when detailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
  status: StatusCode,
  label: String,
  errors: FieldErrors,
  detailed: bool,
}

impl Rejection {
  pub fn new(status: StatusCode, label: impl Into<String>, errors: FieldErrors) -> Self {
    Self {
      status,
      label: label.into(),
      errors,
      detailed: false,
    }
  }

  /// Includes the field errors in the message.
  pub fn detailed(mut self) -> Self {
    self.detailed = true;
    self
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn errors(&self) -> &FieldErrors {
    &self.errors
  }

  pub fn is_detailed(&self) -> bool {
    self.detailed
  }
}

impl fmt::Display for Rejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} is invalid.", self.label)?;
    if self.detailed {
      let detail = serde_json::to_string(&self.errors).map_err(|_| fmt::Error)?;
      write!(f, "\n\nDETAIL:\n{detail}")?;
    }
    Ok(())
  }
}
