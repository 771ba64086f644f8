//! Language registry: per-language resources, materialized or pending.
//!
//! A pending language holds a loader. The first `load` call invokes it;
//! concurrent callers for the same language await the same shared future, so
//! the loader runs once per attempt. Success replaces the pending entry for
//! good. Failure leaves the entry pending and a later call may try again.

use crate::i18n::error::ResourceLoadError;
use crate::i18n::metrics::TranslationMetrics;
use crate::i18n::resource::Resource;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// A one-shot resource loader.
pub type Loader = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Resource>> + Send + Sync>;

/// Where a language's resource comes from.
pub enum ResourceSource {
    Ready(Resource),
    Lazy(Loader),
}

impl ResourceSource {
    /// Wrap an async closure as a lazy source.
    pub fn lazy<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Resource>> + Send + 'static,
    {
        ResourceSource::Lazy(Arc::new(move || loader().boxed()))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceSource::Ready(_))
    }
}

impl From<Resource> for ResourceSource {
    fn from(resource: Resource) -> Self {
        ResourceSource::Ready(resource)
    }
}

impl std::fmt::Debug for ResourceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceSource::Ready(resource) => f.debug_tuple("Ready").field(resource).finish(),
            ResourceSource::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<Resource>, ResourceLoadError>>>;

enum Slot {
    Ready(Arc<Resource>),
    Pending {
        loader: Loader,
        /// The in-flight attempt, tagged with an attempt number.
        inflight: Option<(u64, SharedLoad)>,
    },
}

/// Per-language resource storage.
pub struct LanguageRegistry {
    slots: Mutex<HashMap<String, Slot>>,
    attempts: Mutex<u64>,
    metrics: Arc<TranslationMetrics>,
}

impl LanguageRegistry {
    pub fn new(
        sources: impl IntoIterator<Item = (String, ResourceSource)>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        let slots = sources
            .into_iter()
            .map(|(language, source)| {
                let slot = match source {
                    ResourceSource::Ready(resource) => Slot::Ready(Arc::new(resource)),
                    ResourceSource::Lazy(loader) => Slot::Pending {
                        loader,
                        inflight: None,
                    },
                };
                (language, slot)
            })
            .collect();

        Self {
            slots: Mutex::new(slots),
            attempts: Mutex::new(0),
            metrics,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_attempt(&self) -> u64 {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        *attempts += 1;
        *attempts
    }

    /// The materialized resource for `language`, if it has been loaded.
    pub fn get(&self, language: &str) -> Option<Arc<Resource>> {
        match self.slots().get(language) {
            Some(Slot::Ready(resource)) => Some(Arc::clone(resource)),
            Some(Slot::Pending { .. }) | None => None,
        }
    }

    /// Whether `language` still waits for its loader.
    pub fn is_pending(&self, language: &str) -> bool {
        matches!(self.slots().get(language), Some(Slot::Pending { .. }))
    }

    /// Languages that have not been loaded yet.
    pub fn pending_languages(&self) -> Vec<String> {
        self.slots()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Pending { .. }))
            .map(|(language, _)| language.clone())
            .collect()
    }

    /// Return the resource for `language`, running its loader if needed.
    ///
    /// Concurrent calls for the same language share one loader invocation.
    pub async fn load(&self, language: &str) -> Result<Arc<Resource>, ResourceLoadError> {
        let (attempt, load) = {
            let mut slots = self.slots();
            match slots.get_mut(language) {
                None => {
                    return Err(ResourceLoadError {
                        language: language.to_string(),
                        reason: "language is not configured".to_string(),
                    })
                }
                Some(Slot::Ready(resource)) => return Ok(Arc::clone(resource)),
                Some(Slot::Pending {
                    inflight: Some((attempt, load)),
                    ..
                }) => (*attempt, load.clone()),
                Some(Slot::Pending { loader, inflight }) => {
                    let attempt = self.next_attempt();
                    let owned_language = language.to_string();
                    let loader = Arc::clone(loader);
                    self.metrics.record_load_started();

                    // The loader is invoked on first poll, after the slots lock is released
                    let load = async move {
                        (loader.as_ref())()
                            .await
                            .map(Arc::new)
                            .map_err(|err| ResourceLoadError::new(owned_language, &err))
                    }
                    .boxed()
                    .shared();

                    *inflight = Some((attempt, load.clone()));
                    (attempt, load)
                }
            }
        };

        let outcome = load.await;
        self.commit(language, attempt, &outcome);
        outcome
    }

    /// Record the outcome of `attempt`, once, by whichever awaiter gets here first.
    fn commit(
        &self,
        language: &str,
        attempt: u64,
        outcome: &Result<Arc<Resource>, ResourceLoadError>,
    ) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(language) else {
            return;
        };
        let current = match slot {
            Slot::Pending {
                inflight: Some((current, _)),
                ..
            } => *current,
            _ => return,
        };
        if current != attempt {
            return;
        }

        match outcome {
            Ok(resource) => {
                info!("Loaded resource for language '{}'", language);
                *slot = Slot::Ready(Arc::clone(resource));
            }
            Err(err) => {
                warn!("{}", err);
                self.metrics.record_load_failure();
                if let Slot::Pending { inflight, .. } = slot {
                    *inflight = None;
                }
            }
        }
    }
}
