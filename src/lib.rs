//! # brains
//!
//! A small REST API for humans and zombies, and the machinery it runs on:
//! header-based API versioning, content negotiation, and one generic
//! resource handler reused for every resource type.
//!
//! ## Versioning
//!
//! Paths carry no version. Clients pick one with a vendor media type:
//!
//! ```text
//! GET /humans HTTP/1.1
//! Accept: application/vnd.zombies.v1+json
//! ```
//!
//! Versions are declared in order on the [`Router`]; the first whose
//! [`VersionMatcher`] predicate holds handles the request. A version flagged
//! default matches everything, so it catches requests that name no version.
//!
//! ## Negotiation
//!
//! `Accept` selects JSON or XML (406 otherwise); `Accept-Language` selects
//! the locale for localized messages. Both are derived per request into a
//! [`Context`] that is passed to the handler as an argument.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use brains::{Config, Server, Stores, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), brains::Error> {
//!     let config = Config::default();
//!     let router = app::router(&config, &Stores::default());
//!     Server::bind(config.bind).serve(router).await
//! }
//! ```

mod context;
mod error;
mod handler;
mod i18n;
mod method;
mod negotiate;
mod render;
mod request;
mod resource;
mod response;
mod router;
mod server;
mod status;
mod store;
mod version;

pub mod app;
pub mod config;
pub mod domain;
pub mod health;

pub use app::Stores;
pub use config::{Config, ConfigError};
pub use context::Context;
pub use error::{ApiError, Error, ValidationErrors};
pub use handler::Handler;
pub use i18n::Translations;
pub use method::{Method, UnknownMethod};
pub use negotiate::{Negotiation, Negotiator, NotAcceptable, Representation};
pub use render::Document;
pub use request::{Request, RequestBuilder};
pub use resource::{FieldSpec, ResourceHandler, Schema};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Router, Scope};
pub use server::Server;
pub use status::Status;
pub use store::{Fields, Filters, MemoryStore, Record, RecordId, RecordStore};
pub use version::{ApiVersion, VersionMatcher};
