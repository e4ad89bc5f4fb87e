use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::facts::definition::FactDefinition;
use crate::facts::registry::{get_available_facts, FactRegistry};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

struct CachedRegistry {
    fingerprint: blake3::Hash,
    registry: Arc<FactRegistry>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedRegistry>,
    stats: CacheStats,
}

/// Memoizes merged registries per agent.
///
/// Entries are keyed by agent id and carry a content hash of the agent's custom
/// facts, so editing the definitions rebuilds the registry on the next lookup.
#[derive(Default)]
pub struct FactRegistryCache {
    state: Mutex<CacheState>,
}

impl FactRegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, agent_id: &str, custom_facts: &[FactDefinition]) -> Arc<FactRegistry> {
        let fingerprint = fingerprint(custom_facts);
        let mut state = self.lock();

        if let Some(cached) = state.entries.get(agent_id) {
            if cached.fingerprint == fingerprint {
                let registry = Arc::clone(&cached.registry);
                state.stats.hits += 1;
                return registry;
            }
        }

        tracing::debug!(
            event_name = "facts.cache.rebuild",
            agent_id,
            custom_facts = custom_facts.len(),
            "building fact registry"
        );
        let registry = Arc::new(get_available_facts(custom_facts));
        state.entries.insert(
            agent_id.to_string(),
            CachedRegistry { fingerprint, registry: Arc::clone(&registry) },
        );
        state.stats.misses += 1;
        registry
    }

    pub fn invalidate(&self, agent_id: &str) -> bool {
        self.lock().entries.remove(agent_id).is_some()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn fingerprint(custom_facts: &[FactDefinition]) -> blake3::Hash {
    let bytes = serde_json::to_vec(custom_facts)
        .unwrap_or_else(|_| format!("{custom_facts:?}").into_bytes());
    blake3::hash(&bytes)
}
