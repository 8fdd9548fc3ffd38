//! supervisorctl によるプロセス制御
//!
//! 管理対象グループの stop / start と状態問い合わせを、外部コマンド
//! `supervisorctl` の呼び出しとして実装します。コマンドは同期・
//! ブロッキングで、このレイヤーではリトライしません。

use crate::error::{Result, SupervisorError};
use crate::status::{StatusMap, parse_status_output};
use std::process::Command;
use tracing::{debug, info};

/// supervisor 管理下のプロセスグループ
///
/// `NginxReloadManager` はプロキシロールのホストでのみ管理される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedGroup {
    Web,
    Worker,
    Redis,
    NginxReloadManager,
}

impl ManagedGroup {
    /// supervisorctl に渡すプロセス指定子
    pub fn control_target(&self) -> &'static str {
        match self {
            ManagedGroup::Web => "agent:web",
            ManagedGroup::Worker => "agent:worker",
            ManagedGroup::Redis => "agent:redis",
            ManagedGroup::NginxReloadManager => "agent:nginx_reload_manager",
        }
    }

    /// status マップでのキー
    pub fn status_key(&self) -> &'static str {
        match self {
            ManagedGroup::Web => "web",
            ManagedGroup::Worker => "worker",
            ManagedGroup::Redis => "redis",
            ManagedGroup::NginxReloadManager => "nginx_reload_manager",
        }
    }
}

/// プロセス制御の窓口
///
/// オーケストレーターはこのトレイト越しにのみ supervisor を操作する。
/// テストではコマンドを記録するスタブに差し替え、canned な status を
/// 返すことで決定的なユニットテストにする。
pub trait ProcessControl {
    /// グループを停止する
    fn stop(&self, group: ManagedGroup) -> Result<()>;
    /// グループを起動する
    fn start(&self, group: ManagedGroup) -> Result<()>;
    /// 全グループの現在状態を問い合わせる
    fn status(&self) -> Result<StatusMap>;
}

/// supervisorctl を shell out で呼ぶ本番実装
pub struct Supervisorctl {
    /// sudo 経由で実行するか（本番ホストでは常に true）
    use_sudo: bool,
}

impl Supervisorctl {
    pub fn new() -> Self {
        Self { use_sudo: true }
    }

    /// sudo なしで実行する（supervisor を自ユーザーで動かす開発環境向け）
    pub fn without_sudo() -> Self {
        Self { use_sudo: false }
    }

    fn build_command(&self, args: &[&str]) -> (Command, String) {
        let mut command = if self.use_sudo {
            let mut c = Command::new("sudo");
            c.arg("supervisorctl");
            c
        } else {
            Command::new("supervisorctl")
        };
        command.args(args);

        let display = if self.use_sudo {
            format!("sudo supervisorctl {}", args.join(" "))
        } else {
            format!("supervisorctl {}", args.join(" "))
        };

        (command, display)
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let (mut command, display_cmd) = self.build_command(args);
        debug!(command = %display_cmd, "Invoking supervisorctl");

        let output = command.output().map_err(|e| SupervisorError::Spawn {
            command: display_cmd.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SupervisorError::CommandFailed {
                command: display_cmd,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for Supervisorctl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for Supervisorctl {
    fn stop(&self, group: ManagedGroup) -> Result<()> {
        info!(group = group.control_target(), "Stopping process group");
        self.run(&["stop", group.control_target()])?;
        Ok(())
    }

    fn start(&self, group: ManagedGroup) -> Result<()> {
        info!(group = group.control_target(), "Starting process group");
        self.run(&["start", group.control_target()])?;
        Ok(())
    }

    fn status(&self) -> Result<StatusMap> {
        let (mut command, display_cmd) = self.build_command(&["status"]);
        debug!(command = %display_cmd, "Querying supervisor status");

        let output = command.output().map_err(|e| SupervisorError::Spawn {
            command: display_cmd.clone(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        // supervisorctl status は停止中のプロセスがあると exit code 3 を
        // 返す。stdout がパース可能ならそれは失敗ではない。
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SupervisorError::CommandFailed {
                command: display_cmd,
                stderr,
            });
        }

        parse_status_output(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_targets_are_fixed_identifiers() {
        assert_eq!(ManagedGroup::Web.control_target(), "agent:web");
        assert_eq!(ManagedGroup::Worker.control_target(), "agent:worker");
        assert_eq!(ManagedGroup::Redis.control_target(), "agent:redis");
        assert_eq!(
            ManagedGroup::NginxReloadManager.control_target(),
            "agent:nginx_reload_manager"
        );
    }

    #[test]
    fn test_build_command_with_sudo() {
        let ctl = Supervisorctl::new();
        let (_, display) = ctl.build_command(&["stop", "agent:nginx_reload_manager"]);
        assert_eq!(display, "sudo supervisorctl stop agent:nginx_reload_manager");
    }

    #[test]
    fn test_build_command_without_sudo() {
        let ctl = Supervisorctl::without_sudo();
        let (_, display) = ctl.build_command(&["status"]);
        assert_eq!(display, "supervisorctl status");
    }
}
