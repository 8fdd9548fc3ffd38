use crate::agent::{Agent, ConfigSource, FileConfigSource};
use crate::repo::GitSource;
use colored::Colorize;
use hostflow_core::TeraRenderer;
use hostflow_supervisor::Supervisorctl;
use std::path::Path;

/// supervisor 設定のみを再生成する（プロセスの停止・起動は行わない）
pub fn handle(config_path: &Path) -> anyhow::Result<()> {
    println!("{}", "supervisor 設定を再生成します...".blue().bold());

    let directory = config_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("設定ファイルの親ディレクトリが取得できません"))?
        .to_path_buf();

    let config_source = FileConfigSource::new(config_path.to_path_buf());
    let supervisor = Supervisorctl::new();
    let renderer = TeraRenderer::new()?;
    let source = GitSource::new(directory.clone());

    let agent = Agent::new(
        &config_source,
        &supervisor,
        &renderer,
        &source,
        directory.join("supervisor.conf"),
    );

    let config = config_source.load()?;
    agent.generate_supervisor_config(&config)?;

    println!();
    println!(
        "{}",
        format!(
            "✓ 設定を書き出しました: {}",
            agent.supervisor_conf_path().display()
        )
        .green()
        .bold()
    );
    println!(
        "{}",
        "ヒント: 反映するには sudo supervisorctl update を実行してください".yellow()
    );

    Ok(())
}
