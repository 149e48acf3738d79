//! Selection of the request data to validate
use crate::error::Error;
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::web::Bytes;
use actix_web::{HttpMessage, HttpRequest};
use serde::{Deserialize, Deserializer};
use serde_json::map::Entry;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Failure to read a [`Source`]
#[derive(Debug)]
pub enum SourceError {
  /// The query string or body could not be decoded
  Decode(Error),
  /// Payload, content type or callback failure, passed through unchanged
  Request(actix_web::Error),
}

impl From<Error> for SourceError {
  fn from(error: Error) -> Self {
    Self::Decode(error)
  }
}

impl From<actix_web::Error> for SourceError {
  fn from(error: actix_web::Error) -> Self {
    Self::Request(error)
  }
}

impl From<SourceError> for actix_web::Error {
  fn from(error: SourceError) -> Self {
    match error {
      SourceError::Decode(error) => error.into(),
      SourceError::Request(error) => error,
    }
  }
}

type SourceFn = dyn Fn(&HttpRequest) -> Result<Map<String, Value>, actix_web::Error> + Send + Sync;

/// Part of the request a middleware validates.
///
/// Deserializes from `"params"`, `"query"` or `"body"`; any other tag falls back to [`Source::Params`].
#[derive(Clone, Default)]
pub enum Source {
  /// Matched path parameters
  #[default]
  Params,
  /// Query string
  Query,
  /// JSON or urlencoded body. The payload is buffered and handed back to the request, so handlers can still
  /// extract it.
  Body,
  /// Fields computed by a callback, validated without coercion
  Custom(Arc<SourceFn>),
}

impl Source {
  pub fn custom<F>(f: F) -> Self
  where
    F: Fn(&HttpRequest) -> Result<Map<String, Value>, actix_web::Error> + Send + Sync + 'static,
  {
    Self::Custom(Arc::new(f))
  }

  /// Configuration tag, `None` for custom sources
  pub fn tag(&self) -> Option<&'static str> {
    match self {
      Source::Params => Some("params"),
      Source::Query => Some("query"),
      Source::Body => Some("body"),
      Source::Custom(_) => None,
    }
  }

  /// Name used in rejection messages, e.g. `Request params`
  pub fn label(&self) -> String {
    match self.tag() {
      Some(tag) => format!("Request {tag}"),
      None => "Request".to_owned(),
    }
  }

  pub fn is_custom(&self) -> bool {
    matches!(self, Source::Custom(_))
  }

  /// Reads the candidate fields from `req`.
  ///
  /// Missing or empty sources give an empty map. Decoding failures are [`SourceError::Decode`]; callback and
  /// payload failures are returned unchanged as [`SourceError::Request`].
  pub async fn select(&self, req: &mut ServiceRequest) -> Result<Map<String, Value>, SourceError> {
    match self {
      Source::Params => Ok(
        req
          .match_info()
          .iter()
          .map(|(name, value)| (name.to_owned(), Value::String(value.to_owned())))
          .collect(),
      ),
      Source::Query => query_fields(req.query_string()).map_err(|e| {
        log::debug!(
          "Failed to decode query string for validation. \
                     Request path: {:?}",
          req.path()
        );
        e.into()
      }),
      Source::Body => read_body(req).await,
      Source::Custom(callback) => callback(req.request()).map_err(SourceError::Request),
    }
  }
}

impl From<&str> for Source {
  fn from(tag: &str) -> Self {
    match tag {
      "query" => Source::Query,
      "body" => Source::Body,
      _ => Source::Params,
    }
  }
}

impl<'de> Deserialize<'de> for Source {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let tag = String::deserialize(deserializer)?;
    Ok(Source::from(tag.as_str()))
  }
}

impl fmt::Debug for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Source::Params => f.write_str("Params"),
      Source::Query => f.write_str("Query"),
      Source::Body => f.write_str("Body"),
      Source::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

#[cfg(not(feature = "serde_qs"))]
fn query_fields(query: &str) -> Result<Map<String, Value>, Error> {
  serde_urlencoded::from_str::<Vec<(String, String)>>(query)
    .map(collect_pairs)
    .map_err(Error::QueryPayloadError)
}

// serde_qs refuses repeated plain keys (`tag=a&tag=b`); such queries are decoded as flat pairs instead.
#[cfg(feature = "serde_qs")]
fn query_fields(query: &str) -> Result<Map<String, Value>, Error> {
  serde_qs::from_str::<Map<String, Value>>(query).or_else(|qs_error| {
    log::trace!("Falling back to flat query decoding: {qs_error}");
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
      .map(collect_pairs)
      .map_err(|_| Error::QsError(qs_error))
  })
}

async fn read_body(req: &mut ServiceRequest) -> Result<Map<String, Value>, SourceError> {
  let body = req.extract::<Bytes>().await?;
  req.set_payload(bytes_to_payload(body.clone()));

  let content_type = req.mime_type().map_err(actix_web::Error::from)?;
  parse_body(content_type.as_ref(), &body).map_err(|e| {
    log::debug!(
      "Failed to decode body for validation. \
                 Request path: {:?}",
      req.path()
    );
    e.into()
  })
}

fn bytes_to_payload(body: Bytes) -> Payload {
  let (_, mut payload) = actix_http::h1::Payload::create(true);
  payload.unread_data(body);
  Payload::from(payload)
}

fn parse_body(content_type: Option<&mime::Mime>, body: &[u8]) -> Result<Map<String, Value>, Error> {
  if body.is_empty() {
    return Ok(Map::new());
  }

  match content_type {
    Some(ct) if ct.subtype() == mime::JSON || ct.suffix() == Some(mime::JSON) => {
      match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Ok(Map::new()),
      }
    }
    Some(ct) if ct.type_() == mime::APPLICATION && ct.subtype() == mime::WWW_FORM_URLENCODED => {
      serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map(collect_pairs)
        .map_err(Error::UrlencodedError)
    }
    _ => {
      log::debug!("Unsupported content type {content_type:?}, validating an empty body");
      Ok(Map::new())
    }
  }
}

// Repeated keys collect into an array, in order of appearance.
fn collect_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
  let mut fields = Map::new();
  for (key, value) in pairs {
    match fields.entry(key) {
      Entry::Vacant(entry) => {
        entry.insert(Value::String(value));
      }
      Entry::Occupied(mut entry) => match entry.get_mut() {
        Value::Array(values) => values.push(Value::String(value)),
        existing => {
          let first = existing.take();
          *existing = Value::Array(vec![first, Value::String(value)]);
        }
      },
    }
  }
  fields
}
