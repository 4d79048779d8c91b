use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::domain::Flow;

/// Where admitted-submission timestamps live between requests.
///
/// `save` overwrites the whole record; concurrent writers on the same key
/// race and the last one wins, so the effective limit can be exceeded by a
/// small margin under simultaneous load from one client.
pub trait RateLimitStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Vec<i64>, anyhow::Error>;
    fn save(&self, key: &str, timestamps: &[i64]) -> Result<(), anyhow::Error>;
}

/// One-way record key so the store never holds raw client addresses.
pub fn submission_key(client_addr: &str, flow: Flow) -> String {
    let digest = Sha256::digest(format!("{}|{}", client_addr, flow.as_str()).as_bytes());
    hex::encode(digest)
}

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Vec<i64>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryStore {
    fn load(&self, key: &str) -> Result<Vec<i64>, anyhow::Error> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("rate limit store mutex poisoned"))?;
        Ok(records.get(key).cloned().unwrap_or_default())
    }

    fn save(&self, key: &str, timestamps: &[i64]) -> Result<(), anyhow::Error> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("rate limit store mutex poisoned"))?;
        records.insert(key.to_string(), timestamps.to_vec());
        Ok(())
    }
}

/// One JSON file of timestamps per hashed key, under a dedicated directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl RateLimitStore for FileStore {
    fn load(&self, key: &str) -> Result<Vec<i64>, anyhow::Error> {
        let path = self.record_path(key);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        // A mangled record counts as empty rather than poisoning the key.
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    fn save(&self, key: &str, timestamps: &[i64]) -> Result<(), anyhow::Error> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.record_path(key), serde_json::to_vec(timestamps)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Limited,
}

/// Sliding-window admission control keyed by hashed client address and flow.
///
/// The guard fails open: if the store cannot be read or written, the
/// submission channel stays available and the incident is logged.
pub struct SlidingWindow {
    store: Arc<dyn RateLimitStore>,
    window_seconds: i64,
    max_requests: usize,
}

impl SlidingWindow {
    /// The floors keep a misconfigured window or threshold from disabling
    /// the guard outright.
    pub fn new(store: Arc<dyn RateLimitStore>, window_seconds: u64, max_requests: u64) -> Self {
        Self {
            store,
            window_seconds: window_seconds.max(60) as i64,
            max_requests: max_requests.max(1) as usize,
        }
    }

    pub fn admit(&self, client_addr: &str, flow: Flow) -> Admission {
        self.admit_at(client_addr, flow, chrono::Utc::now().timestamp())
    }

    /// Admission decision at an explicit clock reading.
    pub fn admit_at(&self, client_addr: &str, flow: Flow, now: i64) -> Admission {
        let key = submission_key(client_addr, flow);
        let timestamps = match self.store.load(&key) {
            Ok(timestamps) => timestamps,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    flow = %flow,
                    "rate limit store unreadable; admitting request"
                );
                return Admission::Admitted;
            }
        };
        let mut live: Vec<i64> = timestamps
            .into_iter()
            .filter(|ts| now - ts < self.window_seconds)
            .collect();
        if live.len() >= self.max_requests {
            return Admission::Limited;
        }
        live.push(now);
        if let Err(error) = self.store.save(&key, &live) {
            tracing::warn!(
                error = %error,
                flow = %flow,
                "rate limit store unwritable; admitting request"
            );
        }
        Admission::Admitted
    }
}
