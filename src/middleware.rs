//! Request validation middleware
use crate::engine::RuleEngine;
use crate::error::Error;
use crate::options::{Coercion, Options, OutputStyle};
use crate::outcome::{decide, Decision};
use crate::project::project;
use crate::rules::RuleSet;
use crate::source::{Source, SourceError};
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::HttpRequest;
use futures::future::{ok, LocalBoxFuture, Ready};
use futures::FutureExt;
use std::rc::Rc;
use std::sync::Arc;

type ErrorHandler = Arc<dyn Fn(Error, &HttpRequest) -> actix_web::Error + Send + Sync>;

/// Middleware validating part of each request against a [`RuleSet`].
///
/// Fields named by the rule set are read from the configured [`Source`], projected, checked by the engine, and
/// the request either continues to the wrapped service or is rejected. Wrap resources (or scopes) rather than
/// the whole `App`, so that path parameters are matched by the time the middleware runs.
///
/// ```rust
/// use actix_web::{web, App, HttpResponse};
/// use garde::Validate;
/// use garde_actix_middleware::{GardeEngine, RuleSet, Source, ValidateRequest};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Validate)]
/// struct NewUser {
///   #[garde(ascii, length(min = 3, max = 25))]
///   username: String,
/// }
///
/// let rules = RuleSet::new().field("username", ());
///
/// let _app = App::new().service(
///   web::resource("/users")
///     .wrap(ValidateRequest::new(rules, GardeEngine::<NewUser>::new()).source(Source::Body))
///     .route(web::post().to(|| async { HttpResponse::Created().finish() })),
/// );
/// ```
pub struct ValidateRequest<R, E> {
  rules: Arc<RuleSet<R>>,
  engine: Arc<E>,
  options: Options,
  err_handler: Option<ErrorHandler>,
}

impl<R, E> ValidateRequest<R, E>
where
  E: RuleEngine<R>,
{
  pub fn new(rules: RuleSet<R>, engine: E) -> Self {
    Self::shared(Arc::new(rules), Arc::new(engine))
  }

  /// Builds a middleware around a rule set and an engine that other middlewares may also use.
  pub fn shared(rules: Arc<RuleSet<R>>, engine: Arc<E>) -> Self {
    Self {
      rules,
      engine,
      options: Options::default(),
      err_handler: None,
    }
  }
}

impl<R, E> ValidateRequest<R, E> {
  /// Replaces every option at once
  pub fn options(mut self, options: Options) -> Self {
    self.options = options;
    self
  }

  pub fn source(mut self, source: Source) -> Self {
    self.options.source = source;
    self
  }

  pub fn output_style(mut self, output_style: OutputStyle) -> Self {
    self.options.output_style = output_style;
    self
  }

  pub fn error_status(mut self, error_status: StatusCode) -> Self {
    self.options.error_status = error_status;
    self
  }

  pub fn coercion(mut self, coercion: Coercion) -> Self {
    self.options.coercion = coercion;
    self
  }

  /// Maps rejections raised through the error path (simple and detailed styles) and query or body decoding
  /// failures to custom errors.
  pub fn error_handler<F>(mut self, f: F) -> Self
  where
    F: Fn(Error, &HttpRequest) -> actix_web::Error + Send + Sync + 'static,
  {
    self.err_handler = Some(Arc::new(f));
    self
  }
}

impl<R, E> ValidateRequest<R, E> {
  fn handle_error(&self, err: Error, req: &HttpRequest) -> actix_web::Error {
    match self.err_handler.as_ref() {
      Some(err_handler) => (*err_handler)(err, req),
      None => err.into(),
    }
  }
}

impl<R, E> Clone for ValidateRequest<R, E> {
  fn clone(&self) -> Self {
    Self {
      rules: Arc::clone(&self.rules),
      engine: Arc::clone(&self.engine),
      options: self.options.clone(),
      err_handler: self.err_handler.clone(),
    }
  }
}

impl<S, B, R, E> Transform<S, ServiceRequest> for ValidateRequest<R, E>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
  B: 'static,
  R: 'static,
  E: RuleEngine<R> + 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = actix_web::Error;
  type Transform = ValidateRequestMiddleware<S, R, E>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ok(ValidateRequestMiddleware {
      service: Rc::new(service),
      config: self.clone(),
    })
  }
}

/// Service produced by [`ValidateRequest`]
pub struct ValidateRequestMiddleware<S, R, E> {
  service: Rc<S>,
  config: ValidateRequest<R, E>,
}

impl<S, B, R, E> Service<ServiceRequest> for ValidateRequestMiddleware<S, R, E>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
  B: 'static,
  R: 'static,
  E: RuleEngine<R> + 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, mut req: ServiceRequest) -> Self::Future {
    let service = Rc::clone(&self.service);
    let config = self.config.clone();

    async move {
      let options = &config.options;
      let candidate = match options.source.select(&mut req).await {
        Ok(candidate) => candidate,
        Err(SourceError::Decode(err)) => return Err(config.handle_error(err, req.request())),
        Err(SourceError::Request(err)) => return Err(err),
      };
      let data = project(&candidate, &config.rules, options.coerces());
      let outcome = config.engine.validate(&config.rules, &data);

      match decide(outcome, options) {
        Decision::Continue => service.call(req).await.map(ServiceResponse::map_into_left_body),
        Decision::Respond(response) => {
          log::debug!(
            "Request failed validation, responding with {}. \
                         Request path: {:?}",
            response.status(),
            req.path()
          );
          Ok(req.into_response(response).map_into_right_body())
        }
        Decision::Abort(err) => {
          log::debug!(
            "Request failed validation: {err}. \
                         Request path: {:?}",
            req.path()
          );
          Err(config.handle_error(err, req.request()))
        }
      }
    }
    .boxed_local()
  }
}
