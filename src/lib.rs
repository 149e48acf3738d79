//! Actix-web middleware validating request data with [garde](https://github.com/jprochazk/garde), a Rust validation
//! library.
//!
//! # Installation
//!
//! ```toml
//! [dependencies]
//! garde = "0.20"
//! garde-actix-middleware = "0.1.0"
//! ```
//!
//! # Usage example
//!
//! Declare the fields to validate in a [`RuleSet`], pick an engine and wrap a resource with [`ValidateRequest`].
//! Only the declared fields are read from the request, so undeclared parameters never reach the engine. With
//! [`GardeEngine`] the rules live on the garde type, so the rule set only lists field names.
//!
//! Path parameters and query strings arrive as strings: values reading as numbers are turned into JSON numbers
//! before validation, which lets numeric fields deserialize (see [`Coercion`]).
//!
//! If the request is invalid, a 400 error is returned. The status code, the error format ([`OutputStyle`]) and the
//! error itself ([`ValidateRequest::error_handler`]) can be configured.
//!
//! ```rust
//! use actix_web::http::StatusCode;
//! use actix_web::{web, App, HttpResponse};
//! use garde::Validate;
//! use garde_actix_middleware::{GardeEngine, OutputStyle, RuleSet, ValidateRequest};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Validate)]
//! struct Article {
//!   #[garde(range(min = 1))]
//!   id: u64,
//! }
//!
//! async fn show() -> HttpResponse {
//!   HttpResponse::Ok().finish()
//! }
//!
//! let rules = RuleSet::new().field("id", ());
//! let validation = ValidateRequest::new(rules, GardeEngine::<Article>::new())
//!   .output_style(OutputStyle::Json)
//!   .error_status(StatusCode::CONFLICT);
//!
//! let _app = App::new().service(web::resource("/articles/{id}").wrap(validation).route(web::get().to(show)));
//! ```
//!
//! Any closure `Fn(&RuleSet<R>, &serde_json::Map<String, Value>) -> Result<(), FieldErrors>` can be used in place
//! of [`GardeEngine`]. Closures receive the rule descriptions, so `R` can carry whatever they need to read.
//!
//! # Feature flags
//!
//! | name       | description                                                   | extra dependencies                                  |
//! |------------|---------------------------------------------------------------|-----------------------------------------------------|
//! | `serde_qs` | Decodes query strings with nested brackets (`user[name]=x`)   | [`serde_qs`](https://crates.io/crates/serde_qs)     |

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod middleware;
pub mod options;
pub mod outcome;
pub mod project;
pub mod rules;
pub mod source;

pub use engine::{FieldError, FieldErrors, GardeEngine, RuleEngine};
pub use middleware::{ValidateRequest, ValidateRequestMiddleware};
pub use options::{Coercion, Options, OutputStyle, DEFAULT_ERROR_STATUS};
pub use rules::RuleSet;
pub use source::Source;
