//! Two-tier result cache behind a single get/set interface.
//!
//! The backend is chosen exactly once, at startup, by a PING probe: Redis when
//! reachable, otherwise an in-process map with no TTL enforcement (data loss on
//! restart is the accepted trade-off). Per-call Redis failures after that are
//! logged and absorbed: a failed `get` is a miss, a failed `set` is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::models::document::DocKind;

#[derive(Clone)]
pub struct ResultCache {
    backend: Backend,
    ttl_secs: u64,
}

#[derive(Clone)]
enum Backend {
    Redis(redis::aio::ConnectionManager),
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

impl ResultCache {
    /// Probes the Redis backend once; the decision holds for the process
    /// lifetime (no per-call re-probe).
    pub async fn connect(redis_url: &str, ttl_secs: u64) -> Self {
        match Self::probe(redis_url).await {
            Ok(manager) => {
                info!("Redis cache backend ready");
                Self {
                    backend: Backend::Redis(manager),
                    ttl_secs,
                }
            }
            Err(e) => {
                warn!("Redis unavailable ({e}); falling back to in-process cache");
                Self::in_memory(ttl_secs)
            }
        }
    }

    pub fn in_memory(ttl_secs: u64) -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))),
            ttl_secs,
        }
    }

    async fn probe(redis_url: &str) -> anyhow::Result<redis::aio::ConnectionManager> {
        let client = redis::Client::open(redis_url)?;
        let mut manager = client.get_connection_manager().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut manager)
            .await?;
        Ok(manager)
    }

    /// Serializes `value` as JSON and stores it under `key` with the
    /// configured TTL (memory tier ignores the TTL).
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                warn!("Cache payload for {key} failed to serialize: {e}");
                return;
            }
        };

        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let result: redis::RedisResult<()> =
                    con.set_ex(key, payload, self.ttl_secs).await;
                if let Err(e) = result {
                    warn!("Cache set failed for key {key}: {e}");
                }
            }
            Backend::Memory(map) => {
                if let Ok(mut guard) = map.lock() {
                    guard.insert(key.to_string(), payload);
                }
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                match con.get::<_, Option<String>>(key).await {
                    Ok(value) => value?,
                    Err(e) => {
                        warn!("Cache get failed for key {key}: {e}");
                        return None;
                    }
                }
            }
            Backend::Memory(map) => map.lock().ok()?.get(key).cloned()?,
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache payload for {key} failed to decode: {e}");
                None
            }
        }
    }
}

// Key namespaces are part of the persisted layout; they never collide because
// each carries its own prefix and the id segments are uuids.

pub fn text_key(kind: DocKind, id: &str) -> String {
    format!("text:{}:{}", kind.as_str(), id)
}

pub fn chunks_key(kind: DocKind, id: &str) -> String {
    format!("chunks:{}:{}", kind.as_str(), id)
}

pub fn embeddings_key(kind: DocKind, id: &str) -> String {
    format!("embeddings:{}:{}", kind.as_str(), id)
}

pub fn result_key(resume_id: &str, job_id: &str) -> String {
    format!("result:{resume_id}:{job_id}")
}
