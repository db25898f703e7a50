//! カタログバージョン定義
//!
//! バージョンIDからソースファイル名と表示ラベルへの固定マッピング。

use std::fmt;
use std::str::FromStr;

/// サポートするカタログバージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CatalogVersion {
    /// 3.26 - Mercenary（デフォルト）
    #[default]
    Mercenary,
    /// 3.27 - Keepers of the Flame
    Keepers,
}

impl CatalogVersion {
    pub const ALL: [CatalogVersion; 2] = [CatalogVersion::Mercenary, CatalogVersion::Keepers];

    /// バージョンID（"3.26" など）
    pub fn id(&self) -> &'static str {
        match self {
            CatalogVersion::Mercenary => "3.26",
            CatalogVersion::Keepers => "3.27",
        }
    }

    /// ソースデータセットのファイル名
    pub fn source_file(&self) -> &'static str {
        match self {
            CatalogVersion::Mercenary => "3.26mercenary.json",
            CatalogVersion::Keepers => "3.27keepers.json",
        }
    }

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            CatalogVersion::Mercenary => "3.26 - Mercenary",
            CatalogVersion::Keepers => "3.27 - Keepers of the Flame",
        }
    }

    /// 文字列からバージョンを解決
    ///
    /// 未知のバージョンはデフォルト（3.26）にフォールバックする。
    pub fn resolve(id: &str) -> Self {
        id.parse().unwrap_or_else(|_| {
            tracing::debug!(version = id, "unknown catalog version, falling back to default");
            Self::default()
        })
    }
}

impl FromStr for CatalogVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3.26" => Ok(CatalogVersion::Mercenary),
            "3.27" => Ok(CatalogVersion::Keepers),
            _ => Err(format!("Unknown version: {}. Use 3.26 or 3.27", s)),
        }
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
