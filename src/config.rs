use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Type-safe configuration key that associates a key name with its value type
#[derive(Debug, Clone, Copy)]
pub struct ConfigKey<T> {
    name: &'static str,
    _phantom: PhantomData<T>,
}

impl<T> ConfigKey<T> {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn key_name(&self) -> &'static str {
        self.name
    }
}

// ===== AI Enhancement Configuration =====

/// Enhancement feature toggles, applied when building the correction prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiFeatures {
    pub punctuation_and_capitalization: bool,
    pub remove_filler_words: bool,
    pub normalize_numbers: bool,
    pub fix_spelling: bool,
}

impl ConfigKey<String> {
    /// Identifier of the active enhancement model. Unset means no model selected.
    pub const AI_SELECTED_MODEL: Self = Self::new("aiSelectedModel");
}

impl ConfigKey<bool> {
    /// Master switch for the AI enhancement feature. Read, not owned, by the
    /// lifecycle controller.
    pub const AI_ENHANCEMENT_ENABLED: Self = Self::new("aiEnhancementEnabled");
}

impl ConfigKey<AiFeatures> {
    pub const AI_FEATURES: Self = Self::new("aiFeatures");
}

// ===== Type-Safe Config Store =====

pub trait ConfigStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T>;
    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), String>;
    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), String>;
}

/// Type-safe configuration store persisted as a flat JSON object on disk.
///
/// Values are kept in memory and flushed on every mutation, matching the
/// save-on-write behavior of the settings store the desktop shell uses.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing values if the file exists.
    /// A missing or unreadable file yields an empty store rather than an error.
    pub fn open(path: PathBuf) -> Self {
        let values = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn save(&self, values: &HashMap<String, serde_json::Value>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let bytes = serde_json::to_vec_pretty(values).map_err(|e| e.to_string())?;
        std::fs::write(&self.path, bytes).map_err(|e| e.to_string())
    }
}

impl ConfigStore for JsonFileStore {
    fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T> {
        self.values
            .lock()
            .unwrap()
            .get(key.key_name())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), String> {
        let val = serde_json::to_value(value).map_err(|e| e.to_string())?;
        let mut values = self.values.lock().unwrap();
        values.insert(key.key_name().to_string(), val);
        self.save(&values)
    }

    fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), String> {
        let mut values = self.values.lock().unwrap();
        values.remove(key.key_name());
        self.save(&values)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Simple in-memory store for testing (and reused by controller tests).
    pub(crate) struct MemoryConfigStore {
        data: Mutex<HashMap<String, serde_json::Value>>,
        /// When set, every `set`/`delete` call fails with this message.
        pub(crate) fail_writes: Mutex<Option<String>>,
    }

    impl MemoryConfigStore {
        pub(crate) fn new() -> Self {
            Self {
                data: Mutex::new(HashMap::new()),
                fail_writes: Mutex::new(None),
            }
        }
    }

    impl ConfigStore for MemoryConfigStore {
        fn get<T: DeserializeOwned>(&self, key: &ConfigKey<T>) -> Option<T> {
            self.data
                .lock()
                .unwrap()
                .get(key.key_name())
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        fn set<T: Serialize>(&self, key: &ConfigKey<T>, value: T) -> Result<(), String> {
            if let Some(msg) = self.fail_writes.lock().unwrap().clone() {
                return Err(msg);
            }
            let val = serde_json::to_value(value).map_err(|e| e.to_string())?;
            self.data
                .lock()
                .unwrap()
                .insert(key.key_name().to_string(), val);
            Ok(())
        }

        fn delete<T>(&self, key: &ConfigKey<T>) -> Result<(), String> {
            if let Some(msg) = self.fail_writes.lock().unwrap().clone() {
                return Err(msg);
            }
            self.data.lock().unwrap().remove(key.key_name());
            Ok(())
        }
    }

    fn is_camel_case(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) if first.is_ascii_lowercase() => chars.all(|c| c.is_alphanumeric()),
            _ => false,
        }
    }

    #[test]
    fn test_selected_model_lifecycle() {
        let store = MemoryConfigStore::new();
        let key = ConfigKey::AI_SELECTED_MODEL;

        assert!(store.get(&key).is_none(), "unset before first write");

        store.set(&key, "llama3.2:1b".to_string()).unwrap();
        assert_eq!(store.get(&key), Some("llama3.2:1b".to_string()));

        store.delete(&key).unwrap();
        assert!(store.get(&key).is_none(), "unset after delete");
    }

    #[test]
    fn test_ai_features_round_trip() {
        let store = MemoryConfigStore::new();
        let features = AiFeatures {
            punctuation_and_capitalization: true,
            remove_filler_words: false,
            normalize_numbers: true,
            fix_spelling: true,
        };

        store.set(&ConfigKey::AI_FEATURES, features).unwrap();
        assert_eq!(store.get(&ConfigKey::AI_FEATURES), Some(features));
    }

    #[test]
    fn test_keys_and_fields_are_camel_case() {
        assert!(is_camel_case(ConfigKey::AI_SELECTED_MODEL.key_name()));
        assert!(is_camel_case(ConfigKey::AI_ENHANCEMENT_ENABLED.key_name()));
        assert!(is_camel_case(ConfigKey::AI_FEATURES.key_name()));

        let json = serde_json::to_value(AiFeatures::default()).unwrap();
        for field in json.as_object().unwrap().keys() {
            assert!(is_camel_case(field), "field '{}' should be camelCase", field);
        }
    }

    #[test]
    fn test_json_file_store_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!(
            "clarify-config-test-{}-{:?}.json",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let store = JsonFileStore::open(path.clone());
            store.set(&ConfigKey::AI_ENHANCEMENT_ENABLED, true).unwrap();
            store
                .set(&ConfigKey::AI_SELECTED_MODEL, "gemma2:2b".to_string())
                .unwrap();
        }

        let reopened = JsonFileStore::open(path.clone());
        assert_eq!(reopened.get(&ConfigKey::AI_ENHANCEMENT_ENABLED), Some(true));
        assert_eq!(
            reopened.get(&ConfigKey::AI_SELECTED_MODEL),
            Some("gemma2:2b".to_string())
        );

        reopened.delete(&ConfigKey::AI_SELECTED_MODEL).unwrap();
        let reopened_again = JsonFileStore::open(path.clone());
        assert!(reopened_again
            .get(&ConfigKey::AI_SELECTED_MODEL)
            .is_none());

        let _ = std::fs::remove_file(&path);
    }
}
