mod agent;
mod commands;
mod repo;

use agent::UpdateOptions;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostflow")]
#[command(about = "ホストのプロセス構成を、宣言されたサーバーロールに同期させる", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// エージェントを更新（リポジトリ同期 → 設定再生成 → 再起動）
    Update {
        /// redis を再起動する
        #[arg(long)]
        restart_redis: bool,
        /// rq ワーカーを再起動する
        #[arg(long)]
        restart_rq_workers: bool,
        /// web ワーカーを再起動する
        #[arg(long)]
        restart_web_workers: bool,
        /// リポジトリ同期をスキップ
        #[arg(long)]
        skip_repo_setup: bool,
        /// パッチ適用をスキップ
        #[arg(long)]
        skip_patches: bool,
    },
    /// 管理対象プロセスの状態を表示
    Status,
    /// supervisor 設定のみを再生成
    Setup,
    /// バージョン情報を表示
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力
    tracing_subscriber::fmt::init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("hostflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // ロール設定はrunごとに読み直す（発見だけ先に行う）
    let config_path = hostflow_core::find_config_file()?;

    match cli.command {
        Commands::Update {
            restart_redis,
            restart_rq_workers,
            restart_web_workers,
            skip_repo_setup,
            skip_patches,
        } => {
            let opts = UpdateOptions {
                restart_redis,
                restart_rq_workers,
                restart_web_workers,
                skip_repo_setup,
                skip_patches,
            };
            commands::update::handle(&config_path, opts)?;
        }
        Commands::Status => {
            commands::status::handle()?;
        }
        Commands::Setup => {
            commands::setup::handle(&config_path)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config discovery");
        }
    }

    Ok(())
}
