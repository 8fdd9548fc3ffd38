//! 設定ファイルの発見と読み込み
//!
//! ロール設定（config.json）はrunの開始時に毎回読み直します。
//! 設定の書き換えは外部（コントロールプレーン側）の責務で、
//! オーケストレーターは読み取り専用です。

use crate::error::{HostError, Result};
use crate::model::ServerConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// エージェントの config.json を探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 HOSTFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: config.json
/// 3. ./.hostflow/config.json
/// 4. ~/.config/hostflow/config.json (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("HOSTFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    let path = current_dir.join("config.json");
    if path.exists() {
        return Ok(path);
    }

    // 3. ./.hostflow/ ディレクトリで検索
    let path = current_dir.join(".hostflow").join("config.json");
    if path.exists() {
        return Ok(path);
    }

    // 4. グローバル設定ファイル (~/.config/hostflow/config.json)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("hostflow").join("config.json");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    // どの設定ファイルも見つからなかった
    Err(HostError::ConfigFileNotFound)
}

/// config.json を読み込んでパースする
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    debug!(path = %path.display(), "Loading server role config");

    let content = std::fs::read_to_string(path).map_err(|e| HostError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let config: ServerConfig = serde_json::from_str(&content)
        .map_err(|e| HostError::InvalidConfig(format!("config.json のパースに失敗: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("config.json"), "{}").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(result.is_ok());
        assert!(result.unwrap().ends_with("config.json"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_hostflow_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let hostflow_dir = temp_dir.path().join(".hostflow");
        fs::create_dir(&hostflow_dir).unwrap();
        fs::write(hostflow_dir.join("config.json"), "{}").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();
        assert!(result.ends_with(".hostflow/config.json"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.json");
        fs::write(&config_path, "{}").unwrap();

        // SAFETY: テスト環境での環境変数設定
        unsafe {
            std::env::set_var("HOSTFLOW_CONFIG_PATH", config_path.to_str().unwrap());
        }

        let result = find_config_file().unwrap();
        assert_eq!(result, config_path);

        // クリーンアップ
        unsafe {
            std::env::remove_var("HOSTFLOW_CONFIG_PATH");
        }
    }

    #[test]
    #[serial]
    fn test_find_config_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        assert!(matches!(result, Err(HostError::ConfigFileNotFound)));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    fn test_load_config_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"name": "app-server", "domain": "example.com", "workers": 2}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.name, "app-server");
        assert_eq!(config.workers, 2);
        assert_eq!(config.is_proxy_server, None);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json at all").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(HostError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("does-not-exist.json");

        let result = load_config(&path);
        assert!(matches!(result, Err(HostError::IoError { .. })));
    }
}
