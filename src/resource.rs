//! Generic resource handler.
//!
//! One [`ResourceHandler`] implementation serves every resource type; the
//! type parameter is a [`Schema`] that names the resource and declares its
//! fields. Mounting a handler on a scope registers the usual routes:
//!
//! | Method | Path | Operation | Success |
//! |---|---|---|---|
//! | `GET` | `/{plural}` | [`list`](ResourceHandler::list) | 200 |
//! | `GET` | `/{plural}/{id}` | [`show`](ResourceHandler::show) | 200 |
//! | `POST` | `/{plural}` | [`create`](ResourceHandler::create) | 201 |
//! | `PATCH`, `PUT` | `/{plural}/{id}` | [`update`](ResourceHandler::update) | 200 |
//! | `DELETE` | `/{plural}/{id}` | [`delete`](ResourceHandler::delete) | 204 |

use std::future::ready;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::{ApiError, ValidationErrors};
use crate::method::Method;
use crate::render::Document;
use crate::request::Request;
use crate::response::Response;
use crate::router::Scope;
use crate::status::Status;
use crate::store::{Fields, Filters, Record, RecordId, RecordStore};

/// One declared field of a resource.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str) -> Self {
        Self { name, required: true }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self { name, required: false }
    }
}

/// Shape of one resource type.
pub trait Schema: Send + Sync + 'static {
    /// Element name of one record, e.g. `human`.
    const SINGULAR: &'static str;
    /// Collection name and path segment, e.g. `humans`.
    const PLURAL: &'static str;
    const FIELDS: &'static [FieldSpec];

    fn declares(field: &str) -> bool {
        Self::FIELDS.iter().any(|f| f.name == field)
    }

    /// Checks a complete record. The default treats every field as a string
    /// and requires non-blank values for required fields. Override to add
    /// rules; record every failure rather than stopping at the first.
    fn check(fields: &Fields, errors: &mut ValidationErrors) {
        for spec in Self::FIELDS {
            match fields.get(spec.name) {
                None | Some(Value::Null) if spec.required => errors.add(spec.name, "required"),
                Some(Value::String(s)) if spec.required && s.trim().is_empty() => {
                    errors.add(spec.name, "required")
                }
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => errors.add(spec.name, "must_be_string"),
            }
        }
    }
}

/// List/show/create/update/delete over a [`RecordStore`] for schema `S`.
pub struct ResourceHandler<S> {
    store: Arc<dyn RecordStore>,
    _schema: PhantomData<fn() -> S>,
}

impl<S> Clone for ResourceHandler<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _schema: PhantomData }
    }
}

impl<S: Schema> ResourceHandler<S> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, _schema: PhantomData }
    }

    /// Records equal on every filter, in store order. An empty filter
    /// returns everything.
    pub fn list(&self, filters: &Filters) -> Vec<Record> {
        self.store.filter(filters)
    }

    pub fn show(&self, id: RecordId) -> Result<Record, ApiError> {
        self.store.get(id).ok_or(ApiError::NotFound)
    }

    /// Validates and stores a new record. `null` values are dropped.
    pub fn create(&self, fields: Fields) -> Result<Record, ApiError> {
        let mut record = Fields::new();
        let mut errors = ValidationErrors::new();
        apply::<S>(&mut record, fields, &mut errors);
        S::check(&record, &mut errors);
        errors.into_result()?;
        Ok(self.store.insert(record))
    }

    /// Merges `patch` into an existing record and validates the result.
    /// A `null` value removes the field. Unknown ids fail before validation.
    pub fn update(&self, id: RecordId, patch: Fields) -> Result<Record, ApiError> {
        let mut record = self.store.get(id).ok_or(ApiError::NotFound)?.fields;
        let mut errors = ValidationErrors::new();
        apply::<S>(&mut record, patch, &mut errors);
        S::check(&record, &mut errors);
        errors.into_result()?;
        // Deleted between read and write.
        self.store.replace(id, record).ok_or(ApiError::NotFound)
    }

    /// Not idempotent: deleting the same id twice fails the second time.
    pub fn delete(&self, id: RecordId) -> Result<(), ApiError> {
        self.store.remove(id).map(drop).ok_or(ApiError::NotFound)
    }

    // ── HTTP glue ────────────────────────────────────────────────────────────

    pub(crate) fn mount(self, scope: Scope) -> Scope {
        let collection = format!("/{}", S::PLURAL);
        let member = format!("/{}/{{id}}", S::PLURAL);
        let this = Arc::new(self);

        let h = Arc::clone(&this);
        let scope = scope.on(Method::Get, &collection, move |req: Request, cx: Context| {
            ready(h.index(&req, &cx))
        });
        let h = Arc::clone(&this);
        let scope = scope.on(Method::Post, &collection, move |req: Request, cx: Context| {
            ready(h.respond(&cx, h.store_new(&req, &cx)))
        });
        let h = Arc::clone(&this);
        let scope = scope.on(Method::Get, &member, move |req: Request, cx: Context| {
            ready(h.respond(&cx, h.fetch(&req, &cx)))
        });
        let h = Arc::clone(&this);
        let scope = scope.on(Method::Patch, &member, move |req: Request, cx: Context| {
            ready(h.respond(&cx, h.modify(&req, &cx)))
        });
        let h = Arc::clone(&this);
        let scope = scope.on(Method::Put, &member, move |req: Request, cx: Context| {
            ready(h.respond(&cx, h.modify(&req, &cx)))
        });
        let h = this;
        scope.on(Method::Delete, &member, move |req: Request, cx: Context| {
            ready(h.respond(&cx, h.destroy(&req)))
        })
    }

    fn index(&self, req: &Request, cx: &Context) -> Response {
        let filters: Filters = req
            .query_pairs()
            .iter()
            .filter(|(k, _)| k == "id" || S::declares(k))
            .cloned()
            .collect();
        let records = self.list(&filters).iter().map(Record::to_json).collect();
        cx.render(Status::Ok, &Document::collection(S::PLURAL, S::SINGULAR, Value::Array(records)))
    }

    fn fetch(&self, req: &Request, cx: &Context) -> Result<Response, ApiError> {
        let record = self.show(record_id(req)?)?;
        Ok(cx.render(Status::Ok, &Document::object(S::SINGULAR, record.to_json())))
    }

    fn store_new(&self, req: &Request, cx: &Context) -> Result<Response, ApiError> {
        let record = self.create(read_fields::<S>(req)?)?;
        let (content_type, body) =
            Document::object(S::SINGULAR, record.to_json()).encode(cx.representation());
        Ok(Response::builder()
            .status(Status::Created)
            .header("location", &format!("/{}/{}", S::PLURAL, record.id))
            .bytes(content_type, body))
    }

    fn modify(&self, req: &Request, cx: &Context) -> Result<Response, ApiError> {
        let id = record_id(req)?;
        // An unknown id is 404 whatever the body holds.
        self.show(id)?;
        let record = self.update(id, read_fields::<S>(req)?)?;
        Ok(cx.render(Status::Ok, &Document::object(S::SINGULAR, record.to_json())))
    }

    fn destroy(&self, req: &Request) -> Result<Response, ApiError> {
        self.delete(record_id(req)?)?;
        Ok(Response::status(Status::NoContent))
    }

    fn respond(&self, cx: &Context, result: Result<Response, ApiError>) -> Response {
        result.unwrap_or_else(|e| e.into_response(cx))
    }
}

/// Copies `patch` into `record`, reporting fields the schema does not declare.
fn apply<S: Schema>(record: &mut Fields, patch: Fields, errors: &mut ValidationErrors) {
    for (key, value) in patch {
        if !S::declares(&key) {
            errors.add(key, "unknown_field");
        } else if value.is_null() {
            record.remove(&key);
        } else {
            record.insert(key, value);
        }
    }
}

/// Ids that do not parse cannot exist, so they are a plain 404.
fn record_id(req: &Request) -> Result<RecordId, ApiError> {
    req.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or(ApiError::NotFound)
}

/// Decodes a JSON object body. An empty body is an empty object. A body
/// wrapped in the singular resource name (`{"human": {...}}`) is unwrapped.
/// A client-supplied `id` is ignored.
fn read_fields<S: Schema>(req: &Request) -> Result<Fields, ApiError> {
    if let Some(content_type) = req.header("content-type") {
        let media = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if media != "application/json" && !media.ends_with("+json") {
            return Err(ApiError::UnsupportedMediaType);
        }
    }
    if req.body().iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }

    let value: Value = serde_json::from_slice(req.body())
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(ApiError::MalformedBody("expected a JSON object".to_owned()));
    };

    if fields.len() == 1 && fields.get(S::SINGULAR).is_some_and(Value::is_object) {
        if let Some(Value::Object(inner)) = fields.remove(S::SINGULAR) {
            fields = inner;
        }
    }
    fields.remove("id");
    Ok(fields)
}
