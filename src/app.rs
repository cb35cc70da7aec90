//! Wires the humans/zombies API from a [`Config`].

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::domain::{Human, Zombie};
use crate::health;
use crate::method::Method;
use crate::negotiate::Negotiator;
use crate::resource::ResourceHandler;
use crate::router::Router;
use crate::store::{MemoryStore, RecordStore};

/// The stores behind the API. Shared by every version scope, so a record
/// created through `v1` is visible through `v2`.
#[derive(Clone)]
pub struct Stores {
    pub humans: Arc<dyn RecordStore>,
    pub zombies: Arc<dyn RecordStore>,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            humans: Arc::new(MemoryStore::new()),
            zombies: Arc::new(MemoryStore::new()),
        }
    }
}

/// Health probes plus one scope per configured version, each serving
/// `/humans` and `/zombies`.
pub fn router(config: &Config, stores: &Stores) -> Router {
    let mut app = Router::new(config.namespace.clone())
        .negotiator(Negotiator::new(config.default_locale.clone()))
        .translations(config.translations())
        .on(Method::Get, "/healthz", health::liveness)
        .on(Method::Get, "/readyz", health::readiness);

    if let Some(host) = &config.host {
        app = app.host(host.clone());
    }

    for version in &config.versions {
        info!(
            version = version.identifier(),
            default = version.is_default(),
            "declaring api version",
        );
        app = app.version(version.clone(), |scope| {
            scope
                .resource(ResourceHandler::<Human>::new(Arc::clone(&stores.humans)))
                .resource(ResourceHandler::<Zombie>::new(Arc::clone(&stores.zombies)))
        });
    }

    app
}
