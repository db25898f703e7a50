//! カード一覧のテキスト表示

use divination_common::{Card, SortDirection, SortSpec};

const NAME_WIDTH: usize = 28;
const REWARD_WIDTH: usize = 32;
const LOCATION_WIDTH: usize = 28;

/// 表示幅に切り詰める（文字数単位）
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// 重みの表示（非有限値は "-"）
pub fn format_weight(weight: f64) -> String {
    if weight.is_finite() {
        format!("{:.2}", weight)
    } else {
        "-".to_string()
    }
}

/// ソート指定の表示（"weight ▲" など）
pub fn format_sort(spec: &SortSpec) -> String {
    let arrow = match spec.direction {
        SortDirection::Ascending => "▲",
        SortDirection::Descending => "▼",
    };
    format!("{} {}", spec.column, arrow)
}

/// 一覧表を文字列で生成
pub fn render_table(cards: &[&Card]) -> String {
    let mut out = format!(
        "{:>6}  {:<nw$}  {:<rw$}  {:>5}  {:<lw$}  {:>12}\n",
        "ID",
        "Name",
        "Reward",
        "Stack",
        "Drop Location",
        "Weight",
        nw = NAME_WIDTH,
        rw = REWARD_WIDTH,
        lw = LOCATION_WIDTH,
    );

    for card in cards {
        out.push_str(&format!(
            "{:>6}  {:<nw$}  {:<rw$}  {:>5}  {:<lw$}  {:>12}\n",
            card.id,
            truncate(&card.name, NAME_WIDTH),
            truncate(&card.reward, REWARD_WIDTH),
            card.stack_size,
            truncate(&card.drop_location, LOCATION_WIDTH),
            format_weight(card.weight),
            nw = NAME_WIDTH,
            rw = REWARD_WIDTH,
            lw = LOCATION_WIDTH,
        ));
    }

    out
}

/// 1枚の詳細表示
pub fn render_card(card: &Card) -> String {
    let gold = if card.gold_cost > 0.0 {
        format!("{}", card.gold_cost)
    } else {
        "未設定".to_string()
    };
    format!(
        "ID:         {}\n名前:       {}\n報酬:       {}\n交換枚数:   {}\n入手場所:   {}\n市場価格:   {}\n重み:       {}\n",
        card.id,
        card.name,
        card.reward,
        card.stack_size,
        card.drop_location,
        gold,
        format_weight(card.weight),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use divination_common::SortColumn;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(10000.0), "10000.00");
        assert_eq!(format_weight(0.5), "0.50");
        assert_eq!(format_weight(f64::INFINITY), "-");
    }

    #[test]
    fn test_format_sort() {
        let spec = SortSpec {
            column: SortColumn::Weight,
            direction: SortDirection::Descending,
        };
        assert_eq!(format_sort(&spec), "weight ▼");
    }

    #[test]
    fn test_render_table_rows() {
        let a = Card::new(1, "The Doctor");
        let b = Card::new(22, "Rain of Chaos");
        let table = render_table(&[&a, &b]);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("The Doctor"));
        assert!(table.lines().nth(2).unwrap().trim_start().starts_with("22"));
    }

    #[test]
    fn test_render_card_without_gold_cost() {
        let card = Card::new(3, "Her Mask");
        let text = render_card(&card);
        assert!(text.contains("Her Mask"));
        assert!(text.contains("未設定"));
    }
}
