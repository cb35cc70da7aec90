//! Per-request context handed to every handler.
//!
//! Everything the negotiator and the version router derive for a request is
//! carried here and passed down the call chain by value. Two requests never
//! share a `Context`, so concurrent requests cannot see each other's locale.

use std::sync::Arc;

use crate::i18n::Translations;
use crate::negotiate::{Negotiation, Representation};
use crate::render::Document;
use crate::response::Response;
use crate::status::Status;

#[derive(Clone, Debug)]
pub struct Context {
    negotiation: Negotiation,
    version: Option<String>,
    translations: Arc<Translations>,
}

impl Context {
    pub(crate) fn new(negotiation: Negotiation, translations: Arc<Translations>) -> Self {
        Self { negotiation, version: None, translations }
    }

    pub(crate) fn with_version(mut self, identifier: &str) -> Self {
        self.version = Some(identifier.to_owned());
        self
    }

    pub fn representation(&self) -> Representation { self.negotiation.representation }
    pub fn locale(&self) -> &str { &self.negotiation.locale }

    /// Identifier of the version scope that matched, `None` for routes
    /// declared outside any scope.
    pub fn version(&self) -> Option<&str> { self.version.as_deref() }

    /// Localized text for a message key in this request's locale.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.lookup(&self.negotiation.locale, key)
    }

    /// Encodes `doc` in the negotiated representation.
    pub fn render(&self, status: Status, doc: &Document) -> Response {
        let (content_type, body) = doc.encode(self.representation());
        Response::builder().status(status).bytes(content_type, body)
    }
}
