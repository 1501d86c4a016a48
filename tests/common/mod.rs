use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tally::{
    config::{Config, ConfigManager},
    engine::{CompanyStore, MemorySink},
    storage_json::{JsonCompanyStore, StoragePaths},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub struct TestEnv {
    pub store: Arc<JsonCompanyStore>,
    pub sink: Arc<MemorySink>,
    pub config_manager: ConfigManager,
}

impl TestEnv {
    pub fn store(&self) -> Arc<dyn CompanyStore> {
        self.store.clone()
    }

    pub fn config(&self) -> Config {
        self.config_manager.load().expect("load config")
    }
}

/// Creates a JSON store, a memory sink and a config manager under a unique directory.
pub fn setup_test_env() -> TestEnv {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let store = JsonCompanyStore::with_retention(StoragePaths::under(&base), 3)
        .expect("create json company store");
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");

    TestEnv {
        store: Arc::new(store),
        sink: Arc::new(MemorySink::new()),
        config_manager,
    }
}
