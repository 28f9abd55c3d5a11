//! Builds the session, cooldown store, and reward gate used by hosts.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ads_runtime::{
    AdProvider, AdSession, Clock, CooldownStore, FileKeyValueStore, InMemoryKeyValueStore,
    KeyValueStore, RewardGate, RewardGrantor, SessionConfig, SystemClock, WaitPolicy,
};

use crate::config::AdsConfig;
use crate::providers::{ProviderFactory, factory_for};

/// File name of the key-value store inside the data directory.
pub const PREFS_FILE: &str = "prefs.json";

/// Builder that assembles an ad session, its cooldown store, and a reward gate.
pub struct AdsBuilder {
    config: AdsConfig,
    provider_factory: Arc<dyn ProviderFactory>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    grantor: Option<Arc<dyn RewardGrantor>>,
}

impl AdsBuilder {
    pub fn new(config: AdsConfig) -> Self {
        let provider_factory = factory_for(config.provider);
        Self {
            config,
            provider_factory,
            store: None,
            clock: Arc::new(SystemClock),
            grantor: None,
        }
    }

    /// Provide a custom provider factory (e.g., a real SDK binding).
    pub fn provider_factory(mut self, factory: impl ProviderFactory + 'static) -> Self {
        self.provider_factory = Arc::new(factory);
        self
    }

    /// Use `store` instead of the file store in the data directory.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn grantor(mut self, grantor: Arc<dyn RewardGrantor>) -> Self {
        self.grantor = Some(grantor);
        self
    }

    pub fn build(self) -> Result<AdsSetup> {
        let provider: Arc<dyn AdProvider> = self.provider_factory.build();

        let store = match self.store {
            Some(store) => store,
            None => open_store(&self.config)?,
        };
        let cooldowns = Arc::new(CooldownStore::new(store, self.clock));

        let session = AdSession::builder()
            .config(SessionConfig {
                settings: self.config.settings.clone(),
                init_watch: WaitPolicy::indefinite().interval(self.config.init_wait.interval),
                ..SessionConfig::default()
            })
            .shared_provider(provider)
            .build();
        session.set_gamer_sid(self.config.gamer_sid.as_deref());

        let gate = match self.grantor {
            Some(grantor) => RewardGate::with_grantor(session.clone(), Arc::clone(&cooldowns), grantor),
            None => RewardGate::new(session.clone(), Arc::clone(&cooldowns)),
        };

        tracing::debug!(
            "Ad session assembled for platform {} ({:?} provider)",
            self.config.settings.platform,
            self.config.provider
        );

        Ok(AdsSetup {
            config: self.config,
            session,
            cooldowns,
            gate,
        })
    }
}

fn open_store(config: &AdsConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.resolve_data_dir() {
        Some(dir) => {
            let path: PathBuf = dir.join(PREFS_FILE);
            let store = FileKeyValueStore::open(&path)
                .with_context(|| format!("failed to open cooldown store at {}", path.display()))?;
            tracing::info!("Cooldown store: {}", path.display());
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No data directory available; cooldowns will not persist");
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
    }
}

pub struct AdsSetup {
    pub config: AdsConfig,
    pub session: AdSession,
    pub cooldowns: Arc<CooldownStore>,
    pub gate: RewardGate,
}
