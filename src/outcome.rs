//! Mapping of validation results to middleware decisions
use crate::engine::FieldErrors;
use crate::error::{Error, Rejection};
use crate::options::{Options, OutputStyle};
use actix_web::HttpResponse;

/// What the middleware does with a request once it has been validated
#[derive(Debug)]
pub enum Decision {
  /// Hand the request to the next service
  Continue,
  /// Answer directly with this response
  Respond(HttpResponse),
  /// Fail the request through actix-web's error path
  Abort(Error),
}

/// Turns an engine result into a [`Decision`] according to `options`.
pub fn decide(outcome: Result<(), FieldErrors>, options: &Options) -> Decision {
  let Err(errors) = outcome else {
    return Decision::Continue;
  };

  match options.output_style {
    OutputStyle::Json => Decision::Respond(HttpResponse::build(options.error_status).json(&errors)),
    OutputStyle::Detailed => {
      Decision::Abort(Rejection::new(options.error_status, options.source.label(), errors).detailed().into())
    }
    OutputStyle::Simple => Decision::Abort(Rejection::new(options.error_status, options.source.label(), errors).into()),
  }
}

#[cfg(test)]
mod test {
  use super::{decide, Decision};
  use crate::engine::{FieldError, FieldErrors};
  use crate::error::Error;
  use crate::options::{Options, OutputStyle};
  use crate::source::Source;
  use actix_web::body::MessageBody;
  use actix_web::http::{header, StatusCode};
  use actix_web::ResponseError;
  use serde_json::{json, Map, Value};

  fn failure() -> Result<(), FieldErrors> {
    Err(FieldErrors::from(vec![FieldError::missing("id")]))
  }

  fn options(source: Source, output_style: OutputStyle, error_status: StatusCode) -> Options {
    Options {
      source,
      output_style,
      error_status,
      ..Options::default()
    }
  }

  #[test]
  fn test_success_continues() {
    assert!(matches!(decide(Ok(()), &Options::default()), Decision::Continue));
  }

  #[test]
  fn test_simple_style_aborts_with_label() {
    let options = options(Source::Body, OutputStyle::Simple, StatusCode::CONFLICT);

    let Decision::Abort(error) = decide(failure(), &options) else {
      panic!("expected an abort");
    };

    assert_eq!(error.to_string(), "Request body is invalid.");
    assert_eq!(error.status_code(), StatusCode::CONFLICT);
  }

  #[test]
  fn test_detailed_style_aborts_with_errors() {
    let options = options(Source::Params, OutputStyle::Detailed, StatusCode::BAD_REQUEST);

    let Decision::Abort(Error::ValidationError(rejection)) = decide(failure(), &options) else {
      panic!("expected a validation error");
    };

    assert!(rejection.is_detailed());
    assert_eq!(rejection.errors().len(), 1);
    assert!(rejection
      .to_string()
      .starts_with("Request params is invalid.\n\nDETAIL:\n[{"));
  }

  #[test]
  fn test_custom_source_label() {
    let source = Source::custom(|_req| Ok(Map::new()));
    let options = options(source, OutputStyle::Simple, StatusCode::BAD_REQUEST);

    let Decision::Abort(error) = decide(failure(), &options) else {
      panic!("expected an abort");
    };

    assert_eq!(error.to_string(), "Request is invalid.");
  }

  #[test]
  fn test_json_style_responds_directly() {
    let options = options(Source::Params, OutputStyle::Json, StatusCode::CONFLICT);

    let Decision::Respond(response) = decide(failure(), &options) else {
      panic!("expected a response");
    };

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
      response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
      Some("application/json")
    );
    let body = response.into_body().try_into_bytes().unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!([{ "message": "required", "code": "missing_field", "field": "id" }]));
  }

  #[test]
  fn test_decisions_are_repeatable() {
    let options = options(Source::Query, OutputStyle::Detailed, StatusCode::UNPROCESSABLE_ENTITY);

    let first = decide(failure(), &options);
    let second = decide(failure(), &options);

    match (first, second) {
      (Decision::Abort(Error::ValidationError(a)), Decision::Abort(Error::ValidationError(b))) => assert_eq!(a, b),
      other => panic!("unexpected decisions: {other:?}"),
    }
  }
}
