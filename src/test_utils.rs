//! Test utilities for Luatbot
//!
//! Temporary directories, config fixtures, and in-memory stores shared by
//! unit tests.

use crate::config::Config;
use crate::session::SessionStore;
use crate::storage::MemoryStorage;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a session store over fresh in-memory storage
///
/// Returns the storage handle too so tests can inspect the persisted value.
pub fn memory_store() -> (SessionStore, MemoryStorage) {
    let storage = MemoryStorage::new();
    let store = SessionStore::open(Box::new(storage.clone()), "chatHistory", 20);
    (store, storage)
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
completion:
  endpoint: http://127.0.0.1:9/v1/chat/completions
  model: test-model
  api_key: sk-from-file
chat:
  title_max_chars: 20
storage:
  key: chatHistory
ui:
  typing_effect: false
"#
    .to_string()
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LuatbotError;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: crate::error::Result<()> =
            Err(LuatbotError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let (store, storage) = memory_store();
        assert!(store.is_empty());
        use crate::storage::StorageBackend;
        assert!(storage.get("chatHistory").unwrap().is_none());
    }

    #[test]
    fn test_test_config_yaml_is_valid() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.completion.api_key.as_deref(), Some("sk-from-file"));
        assert!(test_config().validate().is_ok());
    }
}
