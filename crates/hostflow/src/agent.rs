//! 更新オーケストレーター
//!
//! ロール設定と現在のプロセス状態から、どのグループをどの順序で
//! 停止・再設定・再起動するかを決めて実行します。パイプラインは
//! 「状態プローブ → 判定 → コマンド列 → 再プローブ」の固定順で、
//! 各段は狭いインターフェース（トレイト）の背後にあります。
//!
//! コマンド列にトランザクション性はありません。途中で失敗した場合、
//! 発行済みのコマンドは巻き戻されず、runはその場で中断されます。
//! 各ステップは現在状態に対して冪等なので、失敗後の再実行は安全です。

use anyhow::Context;
use hostflow_core::template::{RenderContext, Renderer, SUPERVISOR_TEMPLATE};
use hostflow_core::{ServerConfig, build_context, resolve_proxy_role};
use hostflow_supervisor::{ManagedGroup, ProcessControl, StatusMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::repo::SourceSync;

/// update run の入力フラグ（CLIフラグと1:1対応）
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    pub restart_redis: bool,
    pub restart_rq_workers: bool,
    pub restart_web_workers: bool,
    pub skip_repo_setup: bool,
    pub skip_patches: bool,
}

/// update run の結果報告
#[derive(Debug)]
pub struct UpdateReport {
    /// 変更前のプロセス状態（最初のプローブ）
    pub before: StatusMap,
    /// 更新後の定常状態（2回目のプローブ）
    pub after: StatusMap,
    /// このrunで解決されたプロキシロール
    pub is_proxy_server: bool,
}

/// ロール設定の取得元
///
/// 設定はrunの開始時に毎回読み直す。runの途中で設定が変わっても
/// 次のrunまで反映されない。
pub trait ConfigSource {
    fn load(&self) -> anyhow::Result<ServerConfig>;
}

/// config.json から読み込む本番実装
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> anyhow::Result<ServerConfig> {
        Ok(hostflow_core::load_config(&self.path)?)
    }
}

/// ホスト側エージェント
///
/// 外部コラボレーター（supervisor・レンダラー・リポジトリ同期・
/// 設定ソース）はすべてトレイトオブジェクトとして注入される。
pub struct Agent<'a> {
    config_source: &'a dyn ConfigSource,
    supervisor: &'a dyn ProcessControl,
    renderer: &'a dyn Renderer,
    source: &'a dyn SourceSync,
    /// 生成する supervisor 設定の出力先
    supervisor_conf_path: PathBuf,
}

impl<'a> Agent<'a> {
    pub fn new(
        config_source: &'a dyn ConfigSource,
        supervisor: &'a dyn ProcessControl,
        renderer: &'a dyn Renderer,
        source: &'a dyn SourceSync,
        supervisor_conf_path: PathBuf,
    ) -> Self {
        Self {
            config_source,
            supervisor,
            renderer,
            source,
            supervisor_conf_path,
        }
    }

    /// エージェントの更新を1回実行する
    ///
    /// 順序の不変条件:
    /// - プロキシロールでは reload watcher の stop が設定再生成より
    ///   先、start が再生成より後（どちらも再起動フラグとは無関係）。
    /// - 個別の再起動はすべて設定再生成の後。相互の順序は任意。
    /// - 非プロキシでは watcher へのコマンドは一切発行しない。
    pub fn update(&self, opts: &UpdateOptions) -> anyhow::Result<UpdateReport> {
        // 1. ロール設定の読み込みとロール解決
        let config = self.config_source.load()?;
        let is_proxy_server = resolve_proxy_role(&config);
        info!(
            name = %config.name,
            is_proxy_server,
            "Starting agent update"
        );

        // 2. 現在状態のプローブ
        let before = self.supervisor.status()?;
        debug!(groups = before.len(), "Probed current process status");

        // 3. リポジトリ同期
        if !opts.skip_repo_setup {
            self.source.sync().context("リポジトリ同期に失敗しました")?;
        }

        // 4. パッチ適用
        if !opts.skip_patches {
            self.source
                .apply_patches()
                .context("パッチ適用に失敗しました")?;
        }

        // 5. 設定を書き換える前に reload watcher を止める。
        //    書きかけの設定ファイルを watcher が観測して nginx を
        //    リロードしてしまう競合を塞ぐ。
        if is_proxy_server {
            self.supervisor.stop(ManagedGroup::NginxReloadManager)?;
        }

        // 6. supervisor 設定の再生成。再起動フラグとは無関係に毎回行う
        //    （明示的な再起動がなくてもトポロジーは変わりうる）。
        self.generate_supervisor_config(&config)?;

        // 7. フラグで指定されたグループの再起動（stop → start の対）
        if opts.restart_redis {
            self.restart_group(ManagedGroup::Redis)?;
        }
        if opts.restart_rq_workers {
            self.restart_group(ManagedGroup::Worker)?;
        }
        if opts.restart_web_workers {
            self.restart_group(ManagedGroup::Web)?;
        }

        // 8. watcher のプロセスはロールに紐づくので、再起動フラグに
        //    関係なく必ず起動し直す。
        if is_proxy_server {
            self.supervisor.start(ManagedGroup::NginxReloadManager)?;
        }

        // 9. 更新後の定常状態を確認
        let after = self.supervisor.status()?;
        info!(groups = after.len(), "Agent update completed");

        Ok(UpdateReport {
            before,
            after,
            is_proxy_server,
        })
    }

    /// supervisor 設定を再生成する
    ///
    /// コンテキストの組み立て（必須項目の検証を含む）とレンダーを
    /// 1回だけ行う。書き込みのアトミック性はレンダラー側の責務。
    pub fn generate_supervisor_config(&self, config: &ServerConfig) -> anyhow::Result<()> {
        let context: RenderContext = build_context(config)?;
        self.renderer
            .render(SUPERVISOR_TEMPLATE, &context, &self.supervisor_conf_path)?;
        Ok(())
    }

    /// 設定ファイルのパスを返す（表示用）
    pub fn supervisor_conf_path(&self) -> &Path {
        &self.supervisor_conf_path
    }

    fn restart_group(&self, group: ManagedGroup) -> anyhow::Result<()> {
        // supervisorctl の restart 動詞ではなく stop → start の対で発行する。
        // 他グループの状態に依存させないため。
        self.supervisor.stop(group)?;
        self.supervisor.start(group)?;
        Ok(())
    }
}
