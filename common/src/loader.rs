//! バージョン別カタログローダー
//!
//! バージョンをソースファイルに解決して取得・パースし、
//! 保存済みオーバーレイがあればリスト全体を置き換える。
//!
//! ## 処理フロー
//! 1. `CatalogVersion::source_file` でファイル名を解決
//! 2. `CatalogSource::fetch` で取得（存在しなければ `NotFound`）
//! 3. `cards` 配列をパース（不正なら `Format`）
//! 4. オーバーレイ適用（置換のみ、フィールド単位のマージはしない）

use crate::catalog::CatalogVersion;
use crate::document::parse_catalog_document;
use crate::error::{Error, Result};
use crate::overlay::{KeyValueStore, OverlayPersistence};
use crate::types::Card;
use std::collections::HashMap;

/// ソースデータセットの取得元
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// ファイル名でペイロードを取得。存在しなければ `Error::NotFound`
    async fn fetch(&self, file_name: &str) -> Result<String>;
}

/// メモリ上のソース（テスト・組み込み用）
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(file_name.into(), contents.into());
        self
    }
}

impl CatalogSource for MemorySource {
    async fn fetch(&self, file_name: &str) -> Result<String> {
        self.files
            .get(file_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} not found", file_name)))
    }
}

/// オーバーレイ適用結果
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCatalog {
    pub cards: Vec<Card>,
    /// オーバーレイで置き換えたか
    pub from_overlay: bool,
}

/// オーバーレイがあればソースを丸ごと置き換える
pub fn merge_overlay(source: Vec<Card>, overlay: Option<Vec<Card>>) -> MergedCatalog {
    match overlay {
        Some(cards) => MergedCatalog {
            cards,
            from_overlay: true,
        },
        None => MergedCatalog {
            cards: source,
            from_overlay: false,
        },
    }
}

/// バージョン別ローダー
#[derive(Debug, Clone)]
pub struct VersionedCatalogLoader<Src> {
    source: Src,
}

impl<Src: CatalogSource> VersionedCatalogLoader<Src> {
    pub fn new(source: Src) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Src {
        &self.source
    }

    /// ソースデータセットのみを取得（オーバーレイなし）
    pub async fn fetch_version(&self, version: CatalogVersion) -> Result<Vec<Card>> {
        let file_name = version.source_file();
        let payload = self.source.fetch(file_name).await?;
        let doc = parse_catalog_document(&payload)?;

        tracing::debug!(
            file = file_name,
            declared_version = doc.version.as_deref().unwrap_or("-"),
            cards = doc.cards.len(),
            "source dataset loaded"
        );
        Ok(doc.cards)
    }

    /// ソースを取得し、必要ならオーバーレイを適用
    pub async fn load_version<S: KeyValueStore>(
        &self,
        version: CatalogVersion,
        overlay: &OverlayPersistence<S>,
        apply_overlay: bool,
    ) -> Result<MergedCatalog> {
        let source = self.fetch_version(version).await?;
        let cached = if apply_overlay { overlay.load(version) } else { None };
        Ok(merge_overlay(source, cached))
    }
}
