pub mod cache;
mod source;

pub use cache::FileStore;
pub use source::FsSource;

use crate::config::Config;
use crate::error::Result;
use divination_common::{
    CatalogSession, CatalogVersion, LoadOutcome, OverlayPersistence, VersionedCatalogLoader,
};

/// CLIで使うセッションとローダーの組
pub struct Catalog {
    pub session: CatalogSession<FileStore>,
    pub loader: VersionedCatalogLoader<FsSource>,
}

impl Catalog {
    pub fn open(config: &Config, version: CatalogVersion) -> Self {
        let store = FileStore::new(config.resolved_cache_dir());
        let overlay = OverlayPersistence::with_namespace(store, config.cache_namespace.clone());
        Self {
            session: CatalogSession::new(version, overlay),
            loader: VersionedCatalogLoader::new(FsSource::new(config.data_dir.clone())),
        }
    }

    /// アクティブバージョンを読み込む
    pub async fn load(&mut self, apply_overlay: bool) -> Result<LoadOutcome> {
        let version = self.session.version();
        let outcome = self
            .session
            .load_version(&self.loader, version, apply_overlay)
            .await?;
        Ok(outcome)
    }

    /// オーバーレイを削除してソースから読み直す
    pub async fn reload_from_source(&mut self) -> Result<LoadOutcome> {
        Ok(self.session.reload_from_source(&self.loader).await?)
    }
}
