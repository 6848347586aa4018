use axum::extract::FromRef;

use crate::history::HistoryStore;
use crate::recommendation::RecommendationEngine;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedEngine = Arc<RecommendationEngine>;
pub type GuardedHistoryStore = Arc<dyn HistoryStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub engine: GuardedEngine,
    pub history: GuardedHistoryStore,
}

impl ServerState {
    pub fn new(config: ServerConfig, engine: GuardedEngine, history: GuardedHistoryStore) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            engine,
            history,
        }
    }
}

impl FromRef<ServerState> for GuardedEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.engine.clone()
    }
}

impl FromRef<ServerState> for GuardedHistoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.history.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
