//! Application state: puzzle generator, durable store, client-local state and
//! the resolved term/synonym/hint tables.
//!
//! Everything optional is decided once at startup from the environment:
//!   - no UNSPLASH_ACCESS_KEY  → no generator; players get the fallback puzzle
//!   - no SUPABASE_* variables → in-memory store
//!
//! Client-local state (best streak, pending streak) lives in one JSON file,
//! LOCAL_STATE_PATH (default ./data/local_state.json).

use std::{path::PathBuf, sync::Arc};

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument, warn};

use crate::config::{load_game_config_from_env, GameConfig};
use crate::domain::Difficulty;
use crate::generator::PuzzleGenerator;
use crate::provider::UnsplashClient;
use crate::store::PuzzleDb;
use crate::streak::{JsonFileStore, LocalStore};

pub type Generator = PuzzleGenerator<UnsplashClient, PuzzleDb>;

const DEFAULT_LOCAL_STATE_PATH: &str = "./data/local_state.json";

pub struct AppState {
    pub generator: Option<Generator>,
    pub db: Arc<PuzzleDb>,
    pub local: Arc<dyn LocalStore>,
    pub config: Arc<GameConfig>,
}

impl AppState {
    /// Build state from env: load config, pick the store, init the image provider.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = Arc::new(load_game_config_from_env());
        for difficulty in [Difficulty::Easy, Difficulty::Regular] {
            let categories = config.categories(difficulty);
            let terms: usize = config.terms(difficulty).values().map(Vec::len).sum();
            info!(target: "puzzle", %difficulty, categories = categories.len(), terms, "Startup term inventory");
            if categories.is_empty() {
                warn!(target: "puzzle", %difficulty, "No categories configured; generation in this mode will fail over to the fallback puzzle");
            }
        }

        let db = Arc::new(PuzzleDb::from_env());

        let generator = match UnsplashClient::from_env() {
            Some(client) => {
                info!(target: "whatsit_backend", base_url = %client.base_url, "Unsplash enabled.");
                Some(PuzzleGenerator::new(client, db.clone(), config.clone()))
            }
            None => {
                info!(target: "whatsit_backend", "Unsplash disabled (no UNSPLASH_ACCESS_KEY). Serving the fallback puzzle only.");
                None
            }
        };

        let local_path = std::env::var("LOCAL_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCAL_STATE_PATH));
        let file_store = JsonFileStore::new(local_path);
        info!(target: "whatsit_backend", path = %file_store.path().display(), "Client-local state file");
        let local: Arc<dyn LocalStore> = Arc::new(file_store);

        Self { generator, db, local, config }
    }

    /// State with no image provider, an in-memory store and the given local store.
    #[cfg(test)]
    pub fn offline(local: Arc<dyn LocalStore>) -> Self {
        Self {
            generator: None,
            db: Arc::new(PuzzleDb::Memory(crate::store::MemoryStore::new())),
            local,
            config: Arc::new(GameConfig::default()),
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
