use clap::{Args, Parser, Subcommand};
use divination_common::SortColumn;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "divination-index")]
#[command(about = "ディビネーションカード索引・重み計算ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// カタログバージョン (3.26/3.27、省略時は設定値)
    #[arg(short, long, global = true)]
    pub league: Option<String>,

    /// ソースデータのフォルダ（設定より優先）
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対応バージョン一覧
    Versions,

    /// カード一覧を表示
    List {
        /// 名前・報酬・入手場所で絞り込み
        #[arg(short, long)]
        search: Option<String>,

        /// ソート列 (id/name/reward/stackSize/dropLocation/weight)
        /// 同じ列を2回指定すると降順
        #[arg(long)]
        sort: Vec<SortColumn>,
    },

    /// カードの詳細を表示
    Show {
        #[arg(required = true)]
        id: i64,
    },

    /// カードを追加
    Add {
        /// カードID（省略時は最大ID+1）
        #[arg(long)]
        id: Option<i64>,

        #[command(flatten)]
        fields: CardFields,
    },

    /// カードを編集（指定したフィールドのみ変更）
    Edit {
        #[arg(required = true)]
        id: i64,

        /// 新しいカードID
        #[arg(long)]
        new_id: Option<i64>,

        #[command(flatten)]
        fields: CardFieldUpdates,
    },

    /// カードを削除
    Delete {
        #[arg(required = true)]
        id: i64,

        /// 確認をスキップ
        #[arg(short, long)]
        yes: bool,
    },

    /// 重みを試算
    Weight {
        /// 市場価格（正の値なら価格ベースで計算）
        #[arg(short, long)]
        gold_cost: Option<f64>,

        /// 交換枚数（レガシー計算用）
        #[arg(long, default_value = "1")]
        stack_size: u32,

        /// 報酬（レガシー計算用）
        #[arg(long, default_value = "")]
        reward: String,

        /// 入手場所（レガシー計算用）
        #[arg(long, default_value = "")]
        drop_location: String,
    },

    /// キャッシュを削除してソースデータから再読み込み
    Reload,

    /// キャッシュ（ローカル編集）管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },

    /// カタログをJSONでエクスポート
    Export {
        /// 出力ファイル/ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ソースデータと同じファイル名で出力
        #[arg(long)]
        as_source: bool,
    },

    /// JSON/CSVをインポート
    Import {
        #[arg(required = true)]
        input: PathBuf,

        /// 入力形式 (json/csv、省略時は拡張子で判定)
        #[arg(short, long)]
        format: Option<ImportFormat>,
    },

    /// 設定を表示/編集
    Config {
        /// データフォルダを設定
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// デフォルトバージョンを設定
        #[arg(long)]
        set_version: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 追加時のフィールド
#[derive(Args, Clone, Debug)]
pub struct CardFields {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub reward: String,

    #[arg(long, default_value = "1")]
    pub stack_size: u32,

    #[arg(long, default_value = "")]
    pub drop_location: String,

    #[arg(long, default_value = "0")]
    pub gold_cost: f64,
}

/// 編集時のフィールド（未指定は現在値を維持）
#[derive(Args, Clone, Debug, Default)]
pub struct CardFieldUpdates {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub reward: Option<String>,

    #[arg(long)]
    pub stack_size: Option<u32>,

    #[arg(long)]
    pub drop_location: Option<String>,

    #[arg(long)]
    pub gold_cost: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// 拡張子から判定（`.csv` 以外はJSON）
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ImportFormat::Csv,
            _ => ImportFormat::Json,
        }
    }
}

impl std::str::FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ImportFormat::Json),
            "csv" => Ok(ImportFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use json or csv", s)),
        }
    }
}

impl std::fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportFormat::Json => write!(f, "json"),
            ImportFormat::Csv => write!(f, "csv"),
        }
    }
}
