//! Session module - per-customer conversation state
//!
//! A `Session` pairs one conversation history with one tool executor
//! (which carries the customer context and rate cache). Sessions are
//! keyed by customer id or a caller-supplied string and live in the
//! `SessionRegistry` for the process lifetime, optionally mirrored to
//! disk as JSON snapshots.
//!
//! Each session sits behind its own mutex: per-session state is not
//! safe for concurrent mutation, so a second caller for the same key
//! waits for the in-flight turn. Different keys run in parallel.

mod store;
mod types;

pub use store::{
    estimate_tokens, ConversationStore, CHARS_PER_TOKEN, KEEP_RECENT_TURNS,
    SUMMARIZE_THRESHOLD_TOKENS,
};
pub use types::{ContentBlock, Message, Role};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::orders::{CustomerContext, OrderBook};
use crate::shipping::ShippingProvider;
use crate::tools::ToolExecutor;

/// One customer's conversation plus its tool executor.
pub struct Session {
    pub key: String,
    pub store: ConversationStore,
    pub executor: ToolExecutor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        key: &str,
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
        context: CustomerContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: key.to_string(),
            store: ConversationStore::new(),
            executor: ToolExecutor::new(shipping, orders, context),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the session as just used.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Durable view of this session. The rate cache is deliberately not
    /// captured: quotes expire faster than any restart cycle.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            key: self.key.clone(),
            messages: self.store.get(None).to_vec(),
            context: self.executor.context().clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn restore(
        snapshot: SessionSnapshot,
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
    ) -> Self {
        let mut store = ConversationStore::new();
        store.replace_all(snapshot.messages);
        Self {
            key: snapshot.key,
            store,
            executor: ToolExecutor::new(shipping, orders, snapshot.context),
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }
}

/// JSON-serializable view of a session for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub key: String,
    pub messages: Vec<Message>,
    pub context: CustomerContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registry of live sessions, keyed by session key.
///
/// Each entry is an `Arc<Mutex<Session>>`: callers lock the session for
/// the duration of one turn. The registry itself holds the shared
/// collaborators every new session needs.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
    shipping: Arc<dyn ShippingProvider>,
    orders: Arc<OrderBook>,
    default_context: CustomerContext,
    storage_path: Option<PathBuf>,
}

impl SessionRegistry {
    /// Registry with file persistence under the config directory.
    pub fn new(
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
        default_context: CustomerContext,
    ) -> Result<Self> {
        let storage_path = crate::config::Config::dir().join("sessions");
        std::fs::create_dir_all(&storage_path)?;
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            shipping,
            orders,
            default_context,
            storage_path: Some(storage_path),
        })
    }

    /// In-memory registry without persistence, for tests and one-off runs.
    pub fn new_memory(
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
        default_context: CustomerContext,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            shipping,
            orders,
            default_context,
            storage_path: None,
        }
    }

    /// Registry persisting to a custom directory.
    pub fn with_path(
        shipping: Arc<dyn ShippingProvider>,
        orders: Arc<OrderBook>,
        default_context: CustomerContext,
        path: PathBuf,
    ) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            shipping,
            orders,
            default_context,
            storage_path: Some(path),
        })
    }

    /// Fetch the session for a key, loading it from disk or creating it
    /// fresh on first use.
    pub async fn get_or_create(&self, key: &str) -> Result<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            return Ok(Arc::clone(session));
        }

        if let Some(storage_path) = &self.storage_path {
            let file_path = storage_path.join(format!("{}.json", sanitize_key(key)));
            if file_path.exists() {
                let content = tokio::fs::read_to_string(&file_path).await?;
                let snapshot: SessionSnapshot = serde_json::from_str(&content)?;
                debug!(key, messages = snapshot.messages.len(), "restored session from disk");
                let session = Arc::new(Mutex::new(Session::restore(
                    snapshot,
                    Arc::clone(&self.shipping),
                    Arc::clone(&self.orders),
                )));
                sessions.insert(key.to_string(), Arc::clone(&session));
                return Ok(session);
            }
        }

        debug!(key, "created new session");
        let session = Arc::new(Mutex::new(Session::new(
            key,
            Arc::clone(&self.shipping),
            Arc::clone(&self.orders),
            self.default_context.clone(),
        )));
        sessions.insert(key.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Write a session snapshot to disk. No-op without persistence.
    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(storage_path) = &self.storage_path {
            let file_path = storage_path.join(format!("{}.json", sanitize_key(&session.key)));
            let content = serde_json::to_string_pretty(&session.snapshot())?;
            tokio::fs::write(&file_path, content).await?;
        }
        Ok(())
    }

    /// Drop a session from memory and disk.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.sessions.lock().await.remove(key);
        if let Some(storage_path) = &self.storage_path {
            let file_path = storage_path.join(format!("{}.json", sanitize_key(key)));
            if file_path.exists() {
                tokio::fs::remove_file(&file_path).await?;
            }
        }
        Ok(())
    }

    /// Evict sessions idle longer than `max_idle`. A session whose lock
    /// is currently held is in use and is kept regardless of its
    /// timestamp. Returns the number evicted.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.updated_at >= cutoff,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "evicted idle sessions");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// Make a session key safe to use as a file name.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
