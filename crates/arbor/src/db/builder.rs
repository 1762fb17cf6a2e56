use super::Db;
use crate::{engine::AliasCache, engine::Engine, Config, Localizer};

use arbor_core::{driver::Driver, Schema};

use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Builder {
    config: Config,
    localizer: Option<Arc<dyn Localizer>>,
}

impl Builder {
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Translates localized string fields.
    pub fn localizer(&mut self, localizer: impl Localizer) -> &mut Self {
        self.localizer = Some(Arc::new(localizer));
        self
    }

    /// Builds the handle.
    ///
    /// When the alias cache is enabled and a tokio runtime is running, a
    /// background task sweeps expired plans until the last handle is dropped.
    pub fn build(&mut self, schema: impl Into<Arc<Schema>>, driver: impl Driver) -> Db {
        let config = Arc::new(self.config.clone());

        let cache = config.alias_cache.enabled.then(|| {
            let cache = Arc::new(AliasCache::new(&config.alias_cache));

            if tokio::runtime::Handle::try_current().is_ok() {
                cache.spawn_sweeper(config.alias_cache.sweep_interval());
            }

            cache
        });

        Db {
            engine: Engine {
                schema: schema.into(),
                driver: Arc::new(driver),
                config,
                localizer: self.localizer.clone(),
                cache,
            },
        }
    }
}
