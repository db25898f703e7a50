use crate::error::{DivinationError, Result};
use divination_common::overlay::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DIVINATION_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ソースデータセット（3.26mercenary.json など）の置き場所
    pub data_dir: PathBuf,
    /// オーバーレイの保存先（未設定ならユーザーキャッシュディレクトリ）
    pub cache_dir: Option<PathBuf>,
    pub default_version: String,
    pub cache_namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;

        // 環境変数を優先
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DivinationError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("divination-index").join("config.json"))
    }

    /// オーバーレイ保存先を解決
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|d| d.join("divination-index"))
            .unwrap_or_else(|| PathBuf::from(".divination-cache"))
    }

    fn default_config() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: None,
            default_version: "3.26".into(),
            cache_namespace: DEFAULT_NAMESPACE.into(),
        }
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.data_dir = dir;
        self.save()
    }

    pub fn set_default_version(&mut self, version: String) -> Result<()> {
        if version.parse::<divination_common::CatalogVersion>().is_err() {
            return Err(DivinationError::Config(format!(
                "未対応のバージョンです: {}",
                version
            )));
        }
        self.default_version = version;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.default_version, "3.26");
        assert_eq!(config.cache_namespace, "divinationCards_cache");
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"default_version": "3.27"}"#).unwrap();
        assert_eq!(config.default_version, "3.27");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_explicit_cache_dir() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/tmp/overlay")),
            ..Config::default()
        };
        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/tmp/overlay"));
    }
}
