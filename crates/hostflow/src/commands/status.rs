use colored::Colorize;
use hostflow_supervisor::{
    GroupStatus, ManagedGroup, ProcessControl, ProcessState, StatusMap, Supervisorctl,
};

pub fn handle() -> anyhow::Result<()> {
    println!("{}", "プロセス状態を取得中...".blue());

    let supervisor = Supervisorctl::new();
    let status = supervisor.status()?;

    println!();
    print_status_map(&status);

    Ok(())
}

/// グループ → 状態のテーブルを表示する
pub fn print_status_map(status: &StatusMap) {
    println!("{}", format!("{:<28} {:<10}", "GROUP", "STATE").bold());
    println!("{}", "─".repeat(40).dimmed());

    let expected = [
        ManagedGroup::Web,
        ManagedGroup::Worker,
        ManagedGroup::Redis,
        ManagedGroup::NginxReloadManager,
    ];

    for group in expected {
        let key = group.status_key();
        match status.get(key) {
            Some(GroupStatus::Single(state)) => print_row(key, state),
            Some(GroupStatus::Instances(instances)) => {
                for (name, state) in instances {
                    print_row(name, state);
                }
            }
            // 出力に現れないグループは「未定義」— STOPPED とは別の状態
            None => println!("{:<28} {}", key, "(未定義)".dimmed()),
        }
    }

    // 想定外のグループもそのまま表示する
    for (key, group_status) in status {
        if expected.iter().any(|g| g.status_key() == key.as_str()) {
            continue;
        }
        match group_status {
            GroupStatus::Single(state) => print_row(key, state),
            GroupStatus::Instances(instances) => {
                for (name, state) in instances {
                    print_row(name, state);
                }
            }
        }
    }
}

fn print_row(name: &str, state: &ProcessState) {
    let state_colored = match state {
        ProcessState::Running => state.to_string().green(),
        ProcessState::Stopped => state.to_string().red(),
        ProcessState::Other(_) => state.to_string().yellow(),
    };
    println!("{:<28} {}", name, state_colored);
}
