//! Model caching utilities for sharing weights across multiple pipelines.
//!
//! Loading a ModernBERT checkpoint dominates the cost of building a pipeline,
//! so builders go through a process-wide cache and hand out clones that share
//! the underlying weights.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::Result;

/// Trait implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// A thread-safe cache for model instances.
///
/// Entries are keyed by the model type and a string key (typically the model
/// size plus device), so two model types may reuse the same string key.
pub struct ModelCache {
    cache: Mutex<CacheStorage>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn storage(&self) -> MutexGuard<'_, CacheStorage> {
        // A panicking loader never holds the lock, so a poisoned map is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get or create a model from the cache.
    ///
    /// If a model with the given key already exists, a clone is returned.
    /// Otherwise `loader` is called and its result is stored. Loader errors
    /// are returned as-is and nothing is cached.
    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        if let Some(model) = self
            .storage()
            .get(&cache_key)
            .and_then(|cached| cached.downcast_ref::<M>())
        {
            tracing::debug!(key, "model cache hit");
            return Ok(model.clone());
        }

        // The lock is released while loading; weights can take minutes to fetch.
        let model = loader()?;

        self.storage().insert(
            cache_key,
            Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>,
        );

        Ok(model)
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage().is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// Get a reference to the global model cache.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
