//! Runtime backend registration and selection.
//!
//! Backends are registered by name with a rank and a probe. Selection walks
//! the backends from highest to lowest rank and returns the first whose probe
//! succeeds. The fallback backend is held outside the ranked list and is the
//! answer when nothing else probes successfully.

use std::sync::Arc;

use memvault_core::config::BackendPreference;
use memvault_core::{env, Config};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{FallbackStorage, SecretStorage};
use crate::error::{Result, SecureDataError};

/// Registry name of the in-process fallback backend.
pub const FALLBACK_BACKEND: &str = "fallback";

/// Registry name of the OS keychain backend.
pub const KEYCHAIN_BACKEND: &str = "keychain";

#[cfg(feature = "keychain")]
const KEYCHAIN_RANK: u32 = 100;

type Probe = Box<dyn Fn() -> Result<Arc<dyn SecretStorage>> + Send + Sync>;

struct RegisteredBackend {
    name: String,
    rank: u32,
    probe: Probe,
}

/// Ranked set of secret storage backends.
pub struct StorageRegistry {
    backends: Vec<RegisteredBackend>,
    fallback: Arc<dyn SecretStorage>,
}

impl StorageRegistry {
    /// Registry containing only a fallback backend with the process-wide keys.
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(FallbackStorage::with_process_keys()))
    }

    /// Registry containing only the given fallback backend.
    pub fn with_fallback(fallback: Arc<dyn SecretStorage>) -> Self {
        Self {
            backends: Vec::new(),
            fallback,
        }
    }

    /// Default registry for `config`: every backend compiled into this build,
    /// plus the fallback.
    pub fn from_config(config: &Config) -> Self {
        #[cfg_attr(not(feature = "keychain"), allow(unused_mut))]
        let mut registry = Self::new();

        #[cfg(feature = "keychain")]
        {
            let service = config.storage.keychain_service.clone();
            registry.register(KEYCHAIN_BACKEND, KEYCHAIN_RANK, move || {
                let storage = super::KeychainStorage::probe(service.clone())?;
                Ok(Arc::new(storage) as Arc<dyn SecretStorage>)
            });
        }
        #[cfg(not(feature = "keychain"))]
        let _ = config;

        registry
    }

    /// Register a backend. A later registration under the same name replaces
    /// the earlier one. The fallback name is reserved.
    pub fn register<F>(&mut self, name: impl Into<String>, rank: u32, probe: F)
    where
        F: Fn() -> Result<Arc<dyn SecretStorage>> + Send + Sync + 'static,
    {
        let name = name.into();
        if name == FALLBACK_BACKEND {
            warn!("ignoring registration under the reserved fallback backend name");
            return;
        }

        self.backends.retain(|b| b.name != name);
        self.backends.push(RegisteredBackend {
            name,
            rank,
            probe: Box::new(probe),
        });
        // Stable sort keeps registration order among equal ranks.
        self.backends.sort_by(|a, b| b.rank.cmp(&a.rank));
    }

    /// Registered backend names, best first. The fallback is always last.
    pub fn names(&self) -> Vec<&str> {
        self.backends
            .iter()
            .map(|b| b.name.as_str())
            .chain(std::iter::once(FALLBACK_BACKEND))
            .collect()
    }

    /// The fallback backend.
    pub fn fallback(&self) -> Arc<dyn SecretStorage> {
        Arc::clone(&self.fallback)
    }

    /// Highest-ranked backend whose probe succeeds, else the fallback.
    pub fn select(&self) -> Arc<dyn SecretStorage> {
        for backend in &self.backends {
            match (backend.probe)() {
                Ok(storage) => {
                    debug!(backend = %backend.name, "selected secret storage backend");
                    return storage;
                }
                Err(e) => {
                    warn!(backend = %backend.name, "secret storage backend unavailable: {e}");
                }
            }
        }

        debug!(backend = FALLBACK_BACKEND, "selected secret storage backend");
        self.fallback()
    }

    /// The backend registered as `name`, if it probes successfully.
    pub fn select_named(&self, name: &str) -> Result<Arc<dyn SecretStorage>> {
        if name == FALLBACK_BACKEND {
            return Ok(self.fallback());
        }

        let backend = self
            .backends
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| SecureDataError::NotFound(name.to_string()))?;
        (backend.probe)()
    }

    /// Backend chosen by `preference`, honoring `MEMVAULT_FORCE_FALLBACK`.
    pub fn select_preferred(&self, preference: BackendPreference) -> Result<Arc<dyn SecretStorage>> {
        if env::get_bool(env::vars::MEMVAULT_FORCE_FALLBACK) {
            return Ok(self.fallback());
        }

        match preference.backend_name() {
            Some(name) => self.select_named(name),
            None => Ok(self.select()),
        }
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_STORAGE: OnceCell<Arc<dyn SecretStorage>> = OnceCell::new();

/// Process-wide secret storage shared by key managers that are not given an
/// explicit backend.
pub struct PlatformSecureStorage;

impl PlatformSecureStorage {
    /// The process-wide backend, selected on first use from the configuration
    /// file (or defaults).
    pub fn global() -> Arc<dyn SecretStorage> {
        let storage = GLOBAL_STORAGE.get_or_init(|| {
            let config = Config::load_or_default();
            let registry = StorageRegistry::from_config(&config);
            registry
                .select_preferred(config.storage.backend)
                .unwrap_or_else(|e| {
                    warn!("configured secret storage backend unavailable, using fallback: {e}");
                    registry.fallback()
                })
        });
        Arc::clone(storage)
    }

    /// Select the process-wide backend from `config`. Must run before the
    /// first call to [`PlatformSecureStorage::global`].
    pub fn init(config: &Config) -> Result<Arc<dyn SecretStorage>> {
        config.validate()?;

        let registry = StorageRegistry::from_config(config);
        let storage = registry.select_preferred(config.storage.backend)?;
        GLOBAL_STORAGE.set(Arc::clone(&storage)).map_err(|_| {
            SecureDataError::InvalidState("secret storage is already initialized".to_string())
        })?;

        info!(backend = storage.name(), "initialized secret storage");
        Ok(storage)
    }

    /// Whether the process-wide backend has been selected.
    pub fn is_initialized() -> bool {
        GLOBAL_STORAGE.get().is_some()
    }
}
