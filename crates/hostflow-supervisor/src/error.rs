use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error(
        "supervisorctl を実行できません: {command}\n理由: {message}\n\nヒント:\n  • supervisor がインストールされているか確認してください\n  • sudo 権限があるか確認してください"
    )]
    Spawn { command: String, message: String },

    #[error("supervisorctl コマンドが失敗しました: {command}\n出力: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("supervisorctl status の出力をパースできません: {0}")]
    StatusParse(String),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
