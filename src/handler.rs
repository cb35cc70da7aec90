//! Handler trait and type erasure.
//!
//! A handler is any async function of a [`Request`] and its [`Context`]:
//!
//! ```text
//! async fn show(req: Request, cx: Context) -> impl IntoResponse
//! ```
//!
//! The context is an argument rather than something a handler looks up, so
//! per-request state (locale, representation, matched version) reaches the
//! handler without passing through anything shared.
//!
//! Routes of different handler types live in one tree, so each is boxed
//! behind [`ErasedHandler`]:
//!
//! ```text
//! show                          ← user fn
//!   ↓ scope.on(Method::Get, "/humans/{id}", show)
//! Arc::new(FnHandler(show))     ← stored as BoxedHandler
//!   ↓ at request time
//! handler.call(req, cx)         ← one virtual call, returns BoxFuture
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, cx: Context) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `Fn(Request, Context) -> impl Future`
/// whose output implements [`IntoResponse`]. Sealed: only the blanket impl
/// below can implement it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, cx: Context) -> BoxFuture {
        let fut = (self.0)(req, cx);
        Box::pin(async move { fut.await.into_response() })
    }
}
