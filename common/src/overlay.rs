//! オーバーレイ永続化
//!
//! バージョン単位でカードリスト全体のスナップショットを保存する（差分ではない）。
//! 保存先はキー・バリューストアで、キーは `"<namespace>_<version>"`。

use crate::catalog::CatalogVersion;
use crate::document::parse_catalog_document;
use crate::error::{Error, Result};
use crate::types::{Card, CatalogSnapshot};
use std::collections::HashMap;

pub const DEFAULT_NAMESPACE: &str = "divinationCards_cache";

/// 文字列キー・バリューストア
pub trait KeyValueStore {
    /// 値を取得（存在しなければ None）
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// 値を保存（上書き）
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// 値を削除。削除した場合は true
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// メモリ上のストア
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// バージョン別オーバーレイ
#[derive(Debug, Clone)]
pub struct OverlayPersistence<S> {
    store: S,
    namespace: String,
}

impl<S: KeyValueStore> OverlayPersistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// バージョンに対応するストアキー
    pub fn key(&self, version: CatalogVersion) -> String {
        format!("{}_{}", self.namespace, version.id())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// スナップショットを保存
    pub fn save(&mut self, version: CatalogVersion, cards: &[Card]) -> Result<()> {
        let snapshot = CatalogSnapshot::new(version, cards.to_vec());
        let json = serde_json::to_string(&snapshot)?;
        let key = self.key(version);
        self.store.set(&key, &json).map_err(|e| match e {
            Error::Storage(_) => e,
            other => Error::Storage(other.to_string()),
        })
    }

    /// スナップショットのカードリストを取得
    ///
    /// 存在しない・読めない・構造が不正な場合は None（不正データは警告ログのみ）。
    pub fn load(&self, version: CatalogVersion) -> Option<Vec<Card>> {
        let key = self.key(version);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read cached modifications");
                return None;
            }
        };

        match parse_catalog_document(&raw) {
            Ok(doc) => Some(doc.cards),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring malformed cached modifications");
                None
            }
        }
    }

    /// スナップショットを削除
    pub fn clear(&mut self, version: CatalogVersion) -> Result<bool> {
        let key = self.key(version);
        self.store.remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: i64) -> Vec<Card> {
        (1..=n).map(|i| Card::new(i, format!("Card {}", i))).collect()
    }

    /// 書き込みが常に失敗するストア
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("quota exceeded")))
        }

        fn remove(&mut self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_key_format() {
        let overlay = OverlayPersistence::new(MemoryStore::new());
        assert_eq!(overlay.key(CatalogVersion::Mercenary), "divinationCards_cache_3.26");

        let custom = OverlayPersistence::with_namespace(MemoryStore::new(), "test");
        assert_eq!(custom.key(CatalogVersion::Keepers), "test_3.27");
    }

    #[test]
    fn test_save_and_load() {
        let mut overlay = OverlayPersistence::new(MemoryStore::new());
        overlay.save(CatalogVersion::Mercenary, &cards(5)).unwrap();

        let loaded = overlay.load(CatalogVersion::Mercenary).expect("オーバーレイが見つからない");
        assert_eq!(loaded, cards(5));
    }

    #[test]
    fn test_snapshot_structure() {
        let mut overlay = OverlayPersistence::new(MemoryStore::new());
        overlay.save(CatalogVersion::Keepers, &cards(1)).unwrap();

        let raw = overlay.store().get("divinationCards_cache_3.27").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], "3.27");
        assert!(value["exportDate"].is_string());
        assert!(value["cards"].is_array());
    }

    #[test]
    fn test_versions_are_isolated() {
        let mut overlay = OverlayPersistence::new(MemoryStore::new());
        overlay.save(CatalogVersion::Mercenary, &cards(2)).unwrap();
        assert!(overlay.load(CatalogVersion::Keepers).is_none());
    }

    #[test]
    fn test_load_absent() {
        let overlay = OverlayPersistence::new(MemoryStore::new());
        assert!(overlay.load(CatalogVersion::Mercenary).is_none());
    }

    #[test]
    fn test_load_malformed_is_absent() {
        let mut overlay = OverlayPersistence::new(MemoryStore::new());
        let key = overlay.key(CatalogVersion::Mercenary);
        overlay.store_mut().set(&key, "{ invalid json }").unwrap();
        assert!(overlay.load(CatalogVersion::Mercenary).is_none());

        overlay.store_mut().set(&key, r#"{"cards": "nope"}"#).unwrap();
        assert!(overlay.load(CatalogVersion::Mercenary).is_none());
    }

    #[test]
    fn test_clear() {
        let mut overlay = OverlayPersistence::new(MemoryStore::new());
        overlay.save(CatalogVersion::Mercenary, &cards(3)).unwrap();

        assert!(overlay.clear(CatalogVersion::Mercenary).unwrap());
        assert!(overlay.load(CatalogVersion::Mercenary).is_none());
        assert!(!overlay.clear(CatalogVersion::Mercenary).unwrap());
    }

    #[test]
    fn test_save_failure_is_storage_error() {
        let mut overlay = OverlayPersistence::new(FullStore);
        let result = overlay.save(CatalogVersion::Mercenary, &cards(1));
        if let Err(Error::Storage(msg)) = result {
            assert!(msg.contains("quota exceeded"));
        } else {
            panic!("Expected Storage error");
        }
    }
}
