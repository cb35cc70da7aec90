//! Error types.
//!
//! Two layers, kept apart:
//!
//! - [`Error`] is infrastructure: binding a port, loading configuration.
//!   It is returned from [`Server::serve`](crate::Server::serve) and
//!   [`Config::load`](crate::Config::load) and ends the process.
//! - [`ApiError`] is one request going wrong. It always becomes a response
//!   and never escapes a handler.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::config::ConfigError;
use crate::context::Context;
use crate::render::Document;
use crate::response::Response;
use crate::status::Status;

/// Infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Request-level failure, rendered through the request's [`Context`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("record not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("no acceptable representation")]
    NotAcceptable,

    /// No declared version scope matched. Rendered exactly like
    /// [`ApiError::NotFound`] so clients cannot probe the version table.
    #[error("no api version matches the request")]
    NoVersionMatch,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("malformed body: {0}")]
    MalformedBody(String),

    #[error("unsupported media type")]
    UnsupportedMediaType,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound | Self::NoVersionMatch => Status::NotFound,
            Self::Validation(_) => Status::UnprocessableContent,
            Self::NotAcceptable => Status::NotAcceptable,
            Self::MethodNotAllowed => Status::MethodNotAllowed,
            Self::MalformedBody(_) => Status::BadRequest,
            Self::UnsupportedMediaType => Status::UnsupportedMediaType,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            Self::NotFound | Self::NoVersionMatch => "not_found",
            Self::Validation(_) => "unprocessable",
            Self::NotAcceptable => "not_acceptable",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MalformedBody(_) => "malformed_body",
            Self::UnsupportedMediaType => "unsupported_media_type",
        }
    }

    /// Validation failures render the field → reason map itself; everything
    /// else renders `{"error": "<localized message>"}`.
    pub fn into_response(self, cx: &Context) -> Response {
        let status = self.status();
        let doc = match &self {
            Self::Validation(errors) => Document::object("errors", errors.localized(cx)),
            other => {
                let mut body = serde_json::Map::new();
                body.insert("error".to_owned(), Value::from(cx.translate(other.message_key())));
                Document::object("error", Value::Object(body))
            }
        };
        cx.render(status, &doc)
    }
}

/// Every field that failed validation, with a reason key per field.
///
/// Reason keys (`required`, `must_be_string`, `unknown_field`) are translated
/// only when rendered.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationErrors(BTreeMap<String, &'static str>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure. The first reason recorded for a field wins.
    pub fn add(&mut self, field: impl Into<String>, reason: &'static str) {
        self.0.entry(field.into()).or_insert(reason);
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() { Ok(()) } else { Err(ApiError::Validation(self)) }
    }

    fn localized(&self, cx: &Context) -> Value {
        Value::Object(
            self.iter()
                .map(|(field, reason)| (field.to_owned(), Value::from(cx.translate(reason))))
                .collect(),
        )
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, reason)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field} {reason}")?;
        }
        Ok(())
    }
}
