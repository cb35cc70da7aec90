//! Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them outside any version scope so probes never need a vendor
//! `Accept` header or the API host:
//!
//! ```rust
//! use brains::{Method, Router, health};
//!
//! let app = Router::new("zombies")
//!     .on(Method::Get, "/healthz", health::liveness)
//!     .on(Method::Get, "/readyz", health::readiness);
//! ```

use crate::{Context, Request, Response};

/// Always `200 OK`, body `"ok"`.
pub async fn liveness(_req: Request, _cx: Context) -> Response {
    Response::text("ok")
}

/// `200 OK`, body `"ready"`. The in-memory stores need no warm-up; replace
/// this when a store has to connect to something first.
pub async fn readiness(_req: Request, _cx: Context) -> Response {
    Response::text("ready")
}
