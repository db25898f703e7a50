//! ソースデータセットのファイル読み込み

use divination_common::{CatalogSource, Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// データフォルダからソースデータセットを読む
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CatalogSource for FsSource {
    async fn fetch(&self, file_name: &str) -> Result<String> {
        let path = self.root.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::NotFound(format!("{} not found", path.display())))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
