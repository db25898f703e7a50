//! オーバーレイのファイル保存
//!
//! キーごとに `<cache_dir>/<key>.json` を1ファイル作成する。

use divination_common::{Error, KeyValueStore, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// ディレクトリ配下のJSONファイルをキー・バリューストアとして扱う
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// キーに対応するファイルパス
    ///
    /// パス区切りなどファイル名に使えない文字は `_` に置き換える。
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let write = || -> std::io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let mut writer = BufWriter::new(File::create(&path)?);
            writer.write_all(value.as_bytes())?;
            writer.flush()
        };
        write().map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "cache file written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::debug!(path = %path.display(), "cache file removed");
        Ok(true)
    }
}
