//! カタログJSONドキュメントのパーサー
//!
//! ソースデータセット・インポートファイル・オーバーレイで共通の
//! `{ version?, cards: [...] }` 構造を読み込む。

use crate::error::{Error, Result};
use crate::types::Card;
use serde::Deserialize;
use serde_json::Value;

/// 読み込み済みのカタログドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    /// ドキュメントに記載されたバージョン（任意）
    pub version: Option<String>,
    pub cards: Vec<Card>,
}

/// JSON文字列をパース
///
/// `cards` が配列でない場合、または要素がカードとして読めない場合は
/// `Error::Format` を返す。
pub fn parse_catalog_document(text: &str) -> Result<CatalogDocument> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::Format(format!("JSON parse error: {}", e)))?;

    let cards = match value.get("cards") {
        Some(cards @ Value::Array(_)) => cards,
        _ => {
            return Err(Error::Format(
                "Invalid JSON format: Cards array not found".into(),
            ))
        }
    };

    let mut cards = Vec::<Card>::deserialize(cards)
        .map_err(|e| Error::Format(format!("Invalid card entry: {}", e)))?;

    // stackSize 0 の無限大の重みは null で書き出されるため、読み込み時に復元する
    for card in cards.iter_mut().filter(|c| c.stack_size == 0 && c.weight == 0.0) {
        card.recompute_weight();
    }

    let version = value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(CatalogDocument { version, cards })
}
