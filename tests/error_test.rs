//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use divination_index::config::Config;
use divination_index::error::DivinationError;
use tempfile::tempdir;

/// 存在しない設定ファイルはデフォルト値
#[test]
fn test_config_missing_file_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();
    assert_eq!(config.default_version, "3.26");
}

/// 壊れた設定ファイルはJSONエラー
#[test]
fn test_config_invalid_json() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ invalid json }").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(DivinationError::JsonParse(_))));
}

/// 設定の保存と読み込み
#[test]
fn test_config_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        default_version: "3.27".to_string(),
        ..Config::default()
    };
    config.save_to(&path).expect("設定保存失敗");

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.default_version, "3.27");
}

/// DivinationErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        DivinationError::Config("テスト設定エラー".to_string()),
        DivinationError::FileNotFound("cards.csv".to_string()),
        DivinationError::Prompt("入力なし".to_string()),
        DivinationError::Catalog(divination_common::Error::DuplicateId(5)),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空");
    }
}

/// 共通ライブラリのエラーからの変換
#[test]
fn test_error_from_catalog() {
    let err: DivinationError = divination_common::Error::Format("Cards array not found".into()).into();
    assert!(matches!(err, DivinationError::Catalog(_)));
    assert!(format!("{}", err).contains("Cards array not found"));
}

/// IOエラーからの変換
#[test]
fn test_error_from_io() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: DivinationError = io_error.into();
    assert!(matches!(err, DivinationError::Io(_)));
}
