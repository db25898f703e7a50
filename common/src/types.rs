//! カードデータの型定義
//!
//! - Card: カタログの唯一のエンティティ
//! - CardForm: 追加・編集フォームの入力値（重みを除く）
//! - CatalogSnapshot: エクスポート/オーバーレイ共通の `{version, exportDate, cards}`

use crate::catalog::CatalogVersion;
use crate::error::{Error, Result};
use crate::weight::compute_weight;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// ディビネーションカード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    /// 報酬の説明（レガシー重み計算の分類にも使用）
    #[serde(default)]
    pub reward: String,

    /// 交換に必要な枚数
    #[serde(default = "default_stack_size")]
    pub stack_size: u32,

    /// 入手場所（レガシー重み計算の分類にも使用）
    #[serde(default)]
    pub drop_location: String,

    /// 報酬の市場価格見積もり
    #[serde(default, deserialize_with = "nullable_number")]
    pub gold_cost: f64,

    /// 派生値。保存時に常に再計算される
    #[serde(default, deserialize_with = "nullable_number")]
    pub weight: f64,
}

fn default_stack_size() -> u32 {
    1
}

/// `null` を 0 として読む（非有限値は `null` で書き出されるため）
///
/// 重みの無限大は `parse_catalog_document` が再計算で復元する。
fn nullable_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

impl Card {
    /// ID・名前のみを指定したカード（その他はデフォルト値）
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            reward: String::new(),
            stack_size: default_stack_size(),
            drop_location: String::new(),
            gold_cost: 0.0,
            weight: 0.0,
        }
    }

    /// 重みを再計算して設定
    pub fn recompute_weight(&mut self) {
        self.weight = compute_weight(self);
    }

    /// 検索語を名前・報酬・入手場所に対して大文字小文字を無視して照合
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.reward.to_lowercase().contains(&term)
            || self.drop_location.to_lowercase().contains(&term)
    }
}

/// 追加・編集フォームの入力値
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardForm {
    pub id: i64,
    pub name: String,
    pub reward: String,
    pub stack_size: u32,
    pub drop_location: String,
    pub gold_cost: f64,
}

impl CardForm {
    /// 入力値を検証
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidCard("name must not be empty".into()));
        }
        if self.stack_size == 0 {
            return Err(Error::InvalidCard("stack size must be at least 1".into()));
        }
        if !self.gold_cost.is_finite() || self.gold_cost < 0.0 {
            return Err(Error::InvalidCard(format!(
                "gold cost must be a non-negative number, got {}",
                self.gold_cost
            )));
        }
        Ok(())
    }

    /// 重みを計算してカードに変換
    pub fn into_card(self) -> Card {
        let mut card = Card {
            id: self.id,
            name: self.name,
            reward: self.reward,
            stack_size: self.stack_size,
            drop_location: self.drop_location,
            gold_cost: self.gold_cost,
            weight: 0.0,
        };
        card.recompute_weight();
        card
    }
}

impl From<&Card> for CardForm {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            name: card.name.clone(),
            reward: card.reward.clone(),
            stack_size: card.stack_size,
            drop_location: card.drop_location.clone(),
            gold_cost: card.gold_cost,
        }
    }
}

/// `{version, exportDate, cards}` ドキュメント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub version: String,
    pub export_date: String,
    pub cards: Vec<Card>,
}

impl CatalogSnapshot {
    /// 現在時刻（ISO-8601, UTC, ミリ秒）でスナップショットを作成
    pub fn new(version: CatalogVersion, cards: Vec<Card>) -> Self {
        Self::with_export_date(version, cards, now_iso8601())
    }

    pub fn with_export_date(version: CatalogVersion, cards: Vec<Card>, export_date: String) -> Self {
        Self {
            version: version.id().to_string(),
            export_date,
            cards,
        }
    }

    /// 2スペースインデントのJSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `2026-10-14T09:30:00.000Z` 形式の現在時刻
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
