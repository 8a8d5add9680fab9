//! Shared session over one graph store
//!
//! Every command holds a single coarse lock for its whole duration, so
//! readers and writers never interleave.

use crate::config::EngineConfig;
use crate::graph::GraphStore;
use crate::query::{Command, CommandOutput, QueryEngine, QueryResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Cloneable handle to a store and the engine that runs commands on it
#[derive(Debug, Clone)]
pub struct Session {
    /// Shared graph store
    store: Arc<Mutex<GraphStore>>,
    /// Command engine
    engine: Arc<QueryEngine>,
}

impl Session {
    /// Session over an empty store
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(GraphStore::new(), config)
    }

    /// Session over an existing store
    pub fn with_store(store: GraphStore, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            engine: Arc::new(QueryEngine::with_config(config)),
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Parse and execute one command under the store lock
    pub async fn execute(&self, input: &str) -> QueryResult<CommandOutput> {
        let command = crate::query::parse_command(input)?;
        self.run(command).await
    }

    /// Execute a parsed command under the store lock
    pub async fn run(&self, command: Command) -> QueryResult<CommandOutput> {
        let mut store = self.store.lock().await;
        debug!("Session running {}", command.name());
        self.engine.run(command, &mut store)
    }

    /// Read access to the store
    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&GraphStore) -> R,
    {
        let store = self.store.lock().await;
        f(&store)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_commands_serialize() {
        let session = Session::default();

        let mut handles = Vec::new();
        for id in 1..=16u64 {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session
                    .execute(&format!("CREATE NODE Person {{id: {}, name: 'p{}'}}", id, id))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(session.read(|store| store.node_count()).await, 16);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_store_unchanged() {
        let session = Session::default();
        session.execute("CREATE NODE Person {id: 1}").await.unwrap();

        let err = session.execute("CREATE NODE Person {id: 1}").await.unwrap_err();
        assert!(err.graph_error().is_some());
        assert_eq!(session.read(|store| store.node_count()).await, 1);
    }
}
