use super::{plan, query::Query, AliasMap, Engine};
use crate::CacheConfig;

use arbor_core::{schema::Model, Result};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::{Duration, Instant},
};

/// Time-limited cache of alias plans keyed by request shape.
///
/// Entries expire after a fixed time to live. Expired entries are skipped by
/// lookups and removed by [`AliasCache::sweep`]. Inserts that would push the
/// total estimated size over the budget are rejected; existing entries are
/// never evicted to make room.
#[derive(Debug)]
pub struct AliasCache {
    ttl: Duration,
    max_bytes: usize,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<PlanKey, Entry>,

    /// Sum of the estimated sizes of all entries
    used: usize,
}

#[derive(Debug)]
struct Entry {
    map: Arc<AliasMap>,
    size: usize,
    expires: Instant,
}

/// Why an alias plan was not cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheRejected {
    /// The entry alone is larger than the budget
    TooLarge { size: usize, max_bytes: usize },

    /// The entry would push the cache over its budget
    OverBudget {
        size: usize,
        used: usize,
        max_bytes: usize,
    },
}

/// The request shape an alias plan depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PlanKey {
    model: String,
    preset: Option<String>,
    filter_fields: Vec<String>,
    sort_fields: Vec<String>,
    scope_paths: Vec<String>,
    ancestry: Vec<String>,
    truncated: bool,
    unwrap: Option<String>,
}

impl AliasCache {
    pub fn new(config: &CacheConfig) -> AliasCache {
        AliasCache {
            ttl: config.ttl(),
            max_bytes: config.max_bytes,
            state: Mutex::new(State::default()),
        }
    }

    /// Number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Estimated size of all entries.
    pub fn used_bytes(&self) -> usize {
        self.lock().used
    }

    pub(crate) fn get(&self, key: &PlanKey) -> Option<Arc<AliasMap>> {
        let state = self.lock();
        let entry = state.entries.get(key)?;

        if Instant::now() >= entry.expires {
            return None;
        }

        Some(entry.map.clone())
    }

    pub(crate) fn insert(&self, key: PlanKey, map: Arc<AliasMap>) -> std::result::Result<(), CacheRejected> {
        let size = key.estimated_size() + map.estimated_size();

        if size > self.max_bytes {
            return Err(CacheRejected::TooLarge {
                size,
                max_bytes: self.max_bytes,
            });
        }

        let mut state = self.lock();
        let replaced = state.entries.get(&key).map(|entry| entry.size).unwrap_or(0);
        let used = state.used - replaced;

        if used + size > self.max_bytes {
            return Err(CacheRejected::OverBudget {
                size,
                used,
                max_bytes: self.max_bytes,
            });
        }

        state.entries.insert(
            key,
            Entry {
                map,
                size,
                expires: Instant::now() + self.ttl,
            },
        );
        state.used = used + size;

        Ok(())
    }

    /// Removes expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();
        let before = state.entries.len();
        let mut freed = 0;

        state.entries.retain(|_, entry| {
            let live = now < entry.expires;
            if !live {
                freed += entry.size;
            }
            live
        });

        state.used -= freed;
        before - state.entries.len()
    }

    /// Sweeps the cache every `every` on the current tokio runtime. The task
    /// ends once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache: Weak<AliasCache> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let Some(cache) = cache.upgrade() else {
                    break;
                };

                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "swept expired alias plans");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Display for CacheRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheRejected::TooLarge { size, max_bytes } => {
                write!(f, "plan of {size} bytes exceeds the {max_bytes} byte budget")
            }
            CacheRejected::OverBudget {
                size,
                used,
                max_bytes,
            } => write!(
                f,
                "plan of {size} bytes does not fit; {used} of {max_bytes} bytes in use"
            ),
        }
    }
}

impl std::error::Error for CacheRejected {}

impl PlanKey {
    pub(crate) fn new(query: &Query) -> PlanKey {
        PlanKey {
            model: query.model.clone(),
            preset: query.preset().map(|preset| preset.name.clone()),
            filter_fields: query
                .filter
                .conds()
                .into_iter()
                .map(|cond| cond.field.clone())
                .collect(),
            sort_fields: query.sorts.iter().map(|sort| sort.field.clone()).collect(),
            scope_paths: query.scopes.iter().map(|scope| scope.path.clone()).collect(),
            ancestry: query.ancestry.clone(),
            truncated: query.truncated,
            unwrap: query.unwrap.clone(),
        }
    }

    /// The key of the preset-only plan the full plan extends.
    pub(crate) fn base(&self) -> PlanKey {
        PlanKey {
            filter_fields: vec![],
            sort_fields: vec![],
            scope_paths: vec![],
            ..self.clone()
        }
    }

    fn estimated_size(&self) -> usize {
        let strings = self
            .filter_fields
            .iter()
            .chain(&self.sort_fields)
            .chain(&self.scope_paths)
            .chain(&self.ancestry)
            .chain(&self.preset)
            .chain(&self.unwrap)
            .map(|s| s.len() + std::mem::size_of::<String>())
            .sum::<usize>();

        std::mem::size_of::<PlanKey>() + self.model.len() + strings
    }
}

impl Engine {
    /// Returns the alias plan for `query`, reusing cached plans when the
    /// cache is enabled.
    ///
    /// A miss on the full plan falls back to the cached preset-only plan and
    /// extends it with the query's filter, sort, and scope paths.
    pub(crate) fn plan(&self, model: &Model, query: &Query) -> Result<Arc<AliasMap>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(plan::plan(&self.schema, model, query)?));
        };

        let key = PlanKey::new(query);

        if let Some(map) = cache.get(&key) {
            tracing::debug!(model = %query.model, "alias plan cache hit");
            return Ok(map);
        }

        tracing::debug!(model = %query.model, "alias plan cache miss");

        let base_key = key.base();
        let base = match cache.get(&base_key) {
            Some(base) => base,
            None => {
                let base = Arc::new(plan::plan_preset(&self.schema, model, query)?);
                remember(cache, base_key.clone(), base.clone());
                base
            }
        };

        if key == base_key {
            return Ok(base);
        }

        let map = Arc::new(plan::extend(
            AliasMap::clone(&base),
            &self.schema,
            model,
            query,
        )?);
        remember(cache, key, map.clone());
        Ok(map)
    }
}

fn remember(cache: &AliasCache, key: PlanKey, map: Arc<AliasMap>) {
    if let Err(rejected) = cache.insert(key, map) {
        tracing::warn!(%rejected, "alias plan not cached");
    }
}
