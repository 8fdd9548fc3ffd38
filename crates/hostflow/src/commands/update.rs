use crate::agent::{Agent, FileConfigSource, UpdateOptions};
use crate::commands::status::print_status_map;
use crate::repo::GitSource;
use colored::Colorize;
use hostflow_core::TeraRenderer;
use hostflow_supervisor::Supervisorctl;
use std::path::Path;

pub fn handle(config_path: &Path, opts: UpdateOptions) -> anyhow::Result<()> {
    println!("{}", "エージェントの更新を開始します...".blue().bold());
    println!("設定ファイル: {}", config_path.display().to_string().cyan());

    // エージェントディレクトリ = config.json のあるディレクトリ
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

    // 途中で失敗した場合、発行済みの stop/start は巻き戻されない。
    // その場合は再実行すれば冪等に復旧できる。
    let report = agent.update(&opts)?;

    println!();
    if report.is_proxy_server {
        println!("ロール: {}", "プロキシサーバー".cyan());
    } else {
        println!("ロール: {}", "アプリケーションサーバー".cyan());
    }

    println!();
    println!("{}", "更新後のプロセス状態:".bold());
    print_status_map(&report.after);

    println!();
    println!("{}", "✓ エージェントの更新が完了しました".green().bold());

    Ok(())
}
