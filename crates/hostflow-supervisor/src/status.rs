//! supervisorctl status 出力のパース
//!
//! 出力は1プロセス1行で、先頭トークンがプロセス指定子
//! (`agent:web`, `agent:worker-0` など)、2番目が状態トークンです。
//! 出力に現れないグループは「このホストでは未定義」を意味し、
//! STOPPED とは区別されます。

use crate::error::{Result, SupervisorError};
use serde::Serialize;
use std::collections::BTreeMap;

/// supervisor が報告するプロセス状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    Running,
    Stopped,
    /// STARTING / BACKOFF / FATAL など、上記以外の状態トークン
    Other(String),
}

impl ProcessState {
    fn parse(token: &str) -> Self {
        match token {
            "RUNNING" => ProcessState::Running,
            "STOPPED" => ProcessState::Stopped,
            other => ProcessState::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Stopped => write!(f, "STOPPED"),
            ProcessState::Other(token) => write!(f, "{}", token),
        }
    }
}

/// 1グループ分の状態
///
/// worker のような numprocs 付きプログラムはインスタンスごとの
/// サブマッピングになります。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GroupStatus {
    Single(ProcessState),
    Instances(BTreeMap<String, ProcessState>),
}

/// グループ名 → 状態のマッピング
///
/// キーが存在しないことは「未定義」であり、`Stopped` とは別の状態。
pub type StatusMap = BTreeMap<String, GroupStatus>;

/// supervisorctl status の出力をパースする
///
/// `agent:worker-0` のようなインスタンス名は `worker` の下にネストする。
/// 空の出力（管理対象プロセスなし）は空のマップを返す。
pub fn parse_status_output(output: &str) -> Result<StatusMap> {
    let mut status = StatusMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let target = tokens
            .next()
            .ok_or_else(|| SupervisorError::StatusParse(line.to_string()))?;
        let state_token = tokens.next().ok_or_else(|| {
            SupervisorError::StatusParse(format!("状態トークンがありません: {}", line))
        })?;

        let state = ProcessState::parse(state_token);

        // グループ接頭辞 (agent:) を外してグループ内での名前にする
        let name = target.rsplit(':').next().unwrap_or(target);

        // worker-N 形式のインスタンスは worker の下にネストする
        if let Some((base, index)) = name.rsplit_once('-')
            && index.chars().all(|c| c.is_ascii_digit())
            && !index.is_empty()
        {
            let entry = status
                .entry(base.to_string())
                .or_insert_with(|| GroupStatus::Instances(BTreeMap::new()));
            match entry {
                GroupStatus::Instances(instances) => {
                    instances.insert(name.to_string(), state);
                }
                GroupStatus::Single(_) => {
                    return Err(SupervisorError::StatusParse(format!(
                        "グループ '{}' に単一プロセスとインスタンスが混在しています",
                        base
                    )));
                }
            }
        } else {
            status.insert(name.to_string(), GroupStatus::Single(state));
        }
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_output() {
        let output = "\
agent:nginx_reload_manager       RUNNING   pid 1021, uptime 2 days, 1:02:03
agent:redis                      RUNNING   pid 1022, uptime 2 days, 1:02:03
agent:web                        STOPPED   Aug 23 09:15 AM
";
        let status = parse_status_output(output).unwrap();

        assert_eq!(
            status.get("nginx_reload_manager"),
            Some(&GroupStatus::Single(ProcessState::Running))
        );
        assert_eq!(
            status.get("redis"),
            Some(&GroupStatus::Single(ProcessState::Running))
        );
        assert_eq!(
            status.get("web"),
            Some(&GroupStatus::Single(ProcessState::Stopped))
        );
        // 出力に現れないグループはマップに存在しない（STOPPEDではない）
        assert!(!status.contains_key("worker"));
    }

    #[test]
    fn test_parse_worker_instances_nest() {
        let output = "\
agent:worker-0                   RUNNING   pid 1030, uptime 0:10:00
agent:worker-1                   STOPPED   Aug 23 09:15 AM
";
        let status = parse_status_output(output).unwrap();

        let Some(GroupStatus::Instances(instances)) = status.get("worker") else {
            panic!("worker はインスタンスのサブマッピングになるべき");
        };
        assert_eq!(instances.get("worker-0"), Some(&ProcessState::Running));
        assert_eq!(instances.get("worker-1"), Some(&ProcessState::Stopped));
    }

    #[test]
    fn test_parse_other_state_tokens() {
        let output = "agent:web                        FATAL     Exited too quickly\n";
        let status = parse_status_output(output).unwrap();

        assert_eq!(
            status.get("web"),
            Some(&GroupStatus::Single(ProcessState::Other(
                "FATAL".to_string()
            )))
        );
    }

    #[test]
    fn test_parse_empty_output() {
        // 管理対象がまだ定義されていないホスト
        let status = parse_status_output("").unwrap();
        assert!(status.is_empty());
    }

    #[test]
    fn test_parse_line_without_state_token_fails() {
        let result = parse_status_output("agent:web\n");
        assert!(matches!(result, Err(SupervisorError::StatusParse(_))));
    }

    #[test]
    fn test_parse_ungrouped_process_name() {
        // グループ接頭辞なしのプロセスもそのまま扱える
        let output = "redis                            RUNNING   pid 99, uptime 0:00:10\n";
        let status = parse_status_output(output).unwrap();
        assert_eq!(
            status.get("redis"),
            Some(&GroupStatus::Single(ProcessState::Running))
        );
    }
}
