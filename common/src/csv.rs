//! レガシーCSVインポート
//!
//! `Card ID,Name,...` 形式のCSVから最小限のカードを生成する。
//! ID列と名前列以外はデフォルト値で埋め、重みを計算する。

use crate::error::{Error, Result};
use crate::types::Card;
use std::collections::HashSet;

pub const DEFAULT_REWARD: &str = "Unknown reward";
pub const DEFAULT_DROP_LOCATION: &str = "Unknown location";

/// CSVテキストをカードのリストに変換
///
/// # Examples
/// ```
/// use divination_common::parse_cards_csv;
///
/// let cards = parse_cards_csv("Card ID,Name\n1,Foo\n2,Bar").unwrap();
/// assert_eq!(cards.len(), 2);
/// assert_eq!(cards[1].name, "Bar");
/// ```
pub fn parse_cards_csv(text: &str) -> Result<Vec<Card>> {
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();

    if lines.len() < 2 {
        return Err(Error::Format(
            "CSV file must have at least a header row and one data row".into(),
        ));
    }

    // ヘッダーは単純なカンマ区切り
    let headers: Vec<String> = lines[0].split(',').map(|h| h.trim().to_lowercase()).collect();
    let id_index = headers.iter().position(|h| h.contains("id") || h.contains("card"));
    let name_index = headers.iter().position(|h| h.contains("name"));

    let (id_index, name_index) = match (id_index, name_index) {
        (Some(id), Some(name)) => (id, name),
        _ => {
            return Err(Error::Format(
                "CSV must contain \"Card ID\" and \"Name\" columns".into(),
            ))
        }
    };
    let min_fields = id_index.max(name_index) + 1;

    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for line in &lines[1..] {
        let values = split_csv_line(line);
        if values.len() < min_fields {
            continue;
        }

        let Some(id) = parse_leading_int(&values[id_index]) else {
            continue;
        };
        let name = values[name_index].trim();
        if name.is_empty() {
            continue;
        }

        if !seen.insert(id) {
            tracing::warn!(id, card = name, "duplicate card id in CSV, row skipped");
            continue;
        }

        cards.push(Card {
            id,
            name: name.to_string(),
            reward: DEFAULT_REWARD.to_string(),
            stack_size: 1,
            drop_location: DEFAULT_DROP_LOCATION.to_string(),
            gold_cost: 0.0,
            weight: 0.0,
        });
    }

    for card in &mut cards {
        card.recompute_weight();
    }

    Ok(cards)
}

/// 1行をフィールドに分割
///
/// `"` で囲まれた区間のカンマは区切りとみなさない。引用符自体は取り除き、
/// 各フィールドをトリムする。
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                result.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    result.push(current.trim().to_string());
    result
}

/// 先頭の整数部分を読む（`"12abc"` → 12, `"abc"` → None）
fn parse_leading_int(field: &str) -> Option<i64> {
    let field = field.trim_start();
    let (sign, digits) = match field.as_bytes().first() {
        Some(b'-') => (-1, &field[1..]),
        Some(b'+') => (1, &field[1..]),
        _ => (1, field),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
