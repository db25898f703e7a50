//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// ソースデータセットが取得できない
    #[error("Source dataset not found: {0}")]
    NotFound(String),

    /// JSON/CSVの構造が不正
    #[error("Format error: {0}")]
    Format(String),

    /// 追加・更新時のID重複
    #[error("Card ID {0} already exists. Please choose a different ID.")]
    DuplicateId(i64),

    /// 編集対象のカードが存在しない
    #[error("Card ID {0} not found")]
    CardNotFound(i64),

    /// フォーム入力値が不正
    #[error("Invalid card: {0}")]
    InvalidCard(String),

    /// オーバーレイ保存の失敗
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
