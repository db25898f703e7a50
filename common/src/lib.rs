//! Divination Card Index Common Library
//!
//! カタログエンジン本体（重み計算・CSV取り込み・カードストア・
//! バージョン別ローダー・オーバーレイ永続化）。CLIなどのUI層から利用する。

pub mod catalog;
pub mod csv;
pub mod document;
pub mod error;
pub mod loader;
pub mod overlay;
pub mod session;
pub mod store;
pub mod types;
pub mod weight;

pub use catalog::CatalogVersion;
pub use csv::parse_cards_csv;
pub use document::{parse_catalog_document, CatalogDocument};
pub use error::{Error, Result};
pub use loader::{CatalogSource, MemorySource, MergedCatalog, VersionedCatalogLoader};
pub use overlay::{KeyValueStore, MemoryStore, OverlayPersistence};
pub use session::{CatalogSession, ExportDocument, ImportOutcome, LoadOutcome, LoadTicket};
pub use store::{CardStore, SortColumn, SortDirection, SortSpec};
pub use types::{Card, CardForm, CatalogSnapshot};
pub use weight::{compute_weight, preview_weight};
