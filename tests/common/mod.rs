use async_trait::async_trait;
use luatbot::completion::CompletionClient;
use luatbot::error::{LuatbotError, Result};
use luatbot::session::SessionStore;
use luatbot::storage::SqliteStorage;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("history.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn open_store(storage: &SqliteStorage) -> SessionStore {
    SessionStore::open(Box::new(storage.clone()), "chatHistory", 20)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Completion client that replays scripted outcomes in order
///
/// `Ok` entries are returned as replies; `Err` entries become network
/// failures. Once the script is exhausted every call fails.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    received: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn new(script: Vec<std::result::Result<&str, &str>>) -> Self {
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, user_text: &str) -> Result<String> {
        self.received.lock().unwrap().push(user_text.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(LuatbotError::Network(reason).into()),
            None => Err(LuatbotError::Network("script exhausted".into()).into()),
        }
    }
}
