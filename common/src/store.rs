//! カードストア
//!
//! アクティブなカタログバージョンのカードリストを保持し、
//! 追加・更新・削除・検索・ソートを提供する。IDの一意性は常に保たれる。

use crate::error::{Error, Result};
use crate::types::{Card, CardForm};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// ソート対象の列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Id,
    Name,
    Reward,
    StackSize,
    DropLocation,
    Weight,
}

impl SortColumn {
    /// 数値として比較する列か
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortColumn::StackSize | SortColumn::Weight)
    }

    fn numeric_key(&self, card: &Card) -> f64 {
        match self {
            SortColumn::StackSize => f64::from(card.stack_size),
            SortColumn::Weight => card.weight,
            _ => 0.0,
        }
    }

    // 数値列以外は小文字化した文字列で比較（IDも文字列として扱う）
    fn text_key(&self, card: &Card) -> String {
        match self {
            SortColumn::Id => card.id.to_string(),
            SortColumn::Name => card.name.to_lowercase(),
            SortColumn::Reward => card.reward.to_lowercase(),
            SortColumn::DropLocation => card.drop_location.to_lowercase(),
            SortColumn::StackSize => card.stack_size.to_string(),
            SortColumn::Weight => card.weight.to_string(),
        }
    }

    fn compare(&self, a: &Card, b: &Card) -> Ordering {
        if self.is_numeric() {
            self.numeric_key(a)
                .partial_cmp(&self.numeric_key(b))
                .unwrap_or(Ordering::Equal)
        } else {
            self.text_key(a).cmp(&self.text_key(b))
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "id" => Ok(SortColumn::Id),
            "name" => Ok(SortColumn::Name),
            "reward" => Ok(SortColumn::Reward),
            "stacksize" | "stack" => Ok(SortColumn::StackSize),
            "droplocation" | "location" => Ok(SortColumn::DropLocation),
            "weight" => Ok(SortColumn::Weight),
            _ => Err(format!(
                "Unknown column: {}. Use id, name, reward, stackSize, dropLocation, or weight",
                s
            )),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortColumn::Id => write!(f, "id"),
            SortColumn::Name => write!(f, "name"),
            SortColumn::Reward => write!(f, "reward"),
            SortColumn::StackSize => write!(f, "stackSize"),
            SortColumn::DropLocation => write!(f, "dropLocation"),
            SortColumn::Weight => write!(f, "weight"),
        }
    }
}

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// 現在のソート指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// カードリスト本体
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Vec<Card>,
    sort: Option<SortSpec>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存リストから作成（重複IDは先勝ち）
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let mut store = Self::new();
        store.replace_all(cards);
        store
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.cards.iter().position(|c| c.id == id)
    }

    /// リスト全体を置き換える
    ///
    /// 同じIDが複数ある場合は最初のものを残し、残りは警告して捨てる。
    pub fn replace_all(&mut self, cards: Vec<Card>) {
        let mut seen = HashSet::with_capacity(cards.len());
        self.cards = cards
            .into_iter()
            .filter(|card| {
                let fresh = seen.insert(card.id);
                if !fresh {
                    tracing::warn!(id = card.id, "duplicate card id dropped");
                }
                fresh
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// カードを追加
    pub fn add(&mut self, form: CardForm) -> Result<&Card> {
        form.validate()?;
        if self.position(form.id).is_some() {
            return Err(Error::DuplicateId(form.id));
        }

        self.cards.push(form.into_card());
        Ok(&self.cards[self.cards.len() - 1])
    }

    /// カードを更新（レコード全体を置換、リスト内の位置は維持）
    ///
    /// `form.id` を別の未使用IDに変更することもできる。
    pub fn update(&mut self, id: i64, form: CardForm) -> Result<&Card> {
        form.validate()?;
        let index = self.position(id).ok_or(Error::CardNotFound(id))?;
        if form.id != id && self.position(form.id).is_some() {
            return Err(Error::DuplicateId(form.id));
        }

        self.cards[index] = form.into_card();
        Ok(&self.cards[index])
    }

    /// カードを削除（存在しなければ何もしない）
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        self.cards.len() != before
    }

    /// 名前・報酬・入手場所の部分一致検索
    pub fn search(&self, term: &str) -> Vec<&Card> {
        self.cards.iter().filter(|c| c.matches(term)).collect()
    }

    /// 列でソート
    ///
    /// 昇順中の同じ列を再選択すると降順、それ以外は昇順。安定ソート。
    pub fn sort(&mut self, column: SortColumn) -> SortSpec {
        let direction = match self.sort {
            Some(SortSpec {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        self.cards.sort_by(|a, b| {
            let ordering = column.compare(a, b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        let spec = SortSpec { column, direction };
        self.sort = Some(spec);
        spec
    }

    /// 次のID候補（最大ID + 1、空なら1）
    pub fn suggest_next_id(&self) -> i64 {
        self.cards
            .iter()
            .map(|c| c.id)
            .max()
            .unwrap_or(0)
            .max(0)
            .saturating_add(1)
    }
}
