use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error(
        "設定ファイルが見つかりません\nヒント: config.json を含むディレクトリで実行するか、HOSTFLOW_CONFIG_PATH を設定してください"
    )]
    ConfigFileNotFound,

    #[error("必須の設定項目がありません: {field}\nヒント: config.json に {field} を追加してください")]
    MissingField { field: &'static str },

    #[error("テンプレートエラー: {template}\n理由: {message}")]
    TemplateError { template: String, message: String },
}

pub type Result<T> = std::result::Result<T, HostError>;
