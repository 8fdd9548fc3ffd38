//! supervisor 設定の生成
//!
//! ロール設定からレンダーコンテキストを組み立て、Teraで supervisor の
//! 設定ファイルを書き出します。書き込みは「一時ファイルに書いてから
//! rename」で行い、reload watcher が書きかけのファイルを観測しない
//! ことを保証します。

use crate::error::{HostError, Result};
use crate::model::ServerConfig;
use crate::role::resolve_proxy_role;
use serde::Serialize;
use std::path::Path;
use tera::Tera;
use tracing::{debug, info};

/// supervisor 設定テンプレートの識別子
pub const SUPERVISOR_TEMPLATE: &str = "supervisor.conf";

/// クレートに埋め込まれた supervisor.conf テンプレート
const SUPERVISOR_TEMPLATE_SOURCE: &str = include_str!("../templates/supervisor.conf");

/// テンプレートに渡すレンダーコンテキスト
///
/// [`ServerConfig`] のトポロジー情報に、解決済みのプロキシロールを
/// 加えたビュー。生成のたびに作り直され、レンダー後は破棄される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    pub name: String,
    pub domain: String,
    pub user: Option<String>,
    pub workers: u32,
    pub web_port: Option<u16>,
    pub redis_port: Option<u16>,
    /// 解決済みのプロキシロール（[`resolve_proxy_role`] の結果そのまま）
    pub is_proxy_server: bool,
    /// [group:agent] に列挙するプログラム名（導出値）
    ///
    /// `nginx_reload_manager` が含まれるのは is_proxy_server が真のときのみ。
    pub program_names: Vec<String>,
}

/// ロール設定からレンダーコンテキストを組み立てる
///
/// トポロジー項目はそのままコピーし、`is_proxy_server` には
/// ロール判定の結果を埋め込む。不正な設定ファイルを生成しないよう、
/// 必須項目の欠落はレンダー前にエラーとして返す（黙ってデフォルトに
/// 潰すことはしない）。
pub fn build_context(config: &ServerConfig) -> Result<RenderContext> {
    if config.name.is_empty() {
        return Err(HostError::MissingField { field: "name" });
    }

    // ワーカーを持つホストは web / redis / 実行ユーザーが揃っている必要がある
    if config.workers > 0 {
        if config.web_port.is_none() {
            return Err(HostError::MissingField { field: "web_port" });
        }
        if config.redis_port.is_none() {
            return Err(HostError::MissingField { field: "redis_port" });
        }
        if config.user.is_none() {
            return Err(HostError::MissingField { field: "user" });
        }
    }

    // web スタンザは実行ユーザーのホームを参照する
    if config.web_port.is_some() && config.user.is_none() {
        return Err(HostError::MissingField { field: "user" });
    }

    let is_proxy_server = resolve_proxy_role(config);

    let mut program_names = Vec::new();
    if config.web_port.is_some() {
        program_names.push("web".to_string());
    }
    if config.redis_port.is_some() {
        program_names.push("redis".to_string());
    }
    if config.workers > 0 {
        program_names.push("worker".to_string());
    }
    if is_proxy_server {
        program_names.push("nginx_reload_manager".to_string());
    }

    Ok(RenderContext {
        name: config.name.clone(),
        domain: config.domain.clone(),
        user: config.user.clone(),
        workers: config.workers,
        web_port: config.web_port,
        redis_port: config.redis_port,
        is_proxy_server,
        program_names,
    })
}

/// テンプレートレンダラーの窓口
///
/// オーケストレーターはこのトレイト越しにのみレンダーを呼ぶ。
/// テストでは呼び出しを記録するスタブに差し替える。
pub trait Renderer {
    /// コンテキストを使ってテンプレートを出力先に書き出す
    fn render(
        &self,
        template_id: &str,
        context: &RenderContext,
        output_path: &Path,
    ) -> Result<()>;
}

/// Teraを使った本番用レンダラー
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// 埋め込みテンプレートを登録したレンダラーを作成
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(SUPERVISOR_TEMPLATE, SUPERVISOR_TEMPLATE_SOURCE)
            .map_err(|e| HostError::TemplateError {
                template: SUPERVISOR_TEMPLATE.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { tera })
    }
}

impl Renderer for TeraRenderer {
    fn render(
        &self,
        template_id: &str,
        context: &RenderContext,
        output_path: &Path,
    ) -> Result<()> {
        debug!(template = %template_id, output = %output_path.display(), "Rendering template");

        let tera_context =
            tera::Context::from_serialize(context).map_err(|e| HostError::TemplateError {
                template: template_id.to_string(),
                message: e.to_string(),
            })?;

        let rendered =
            self.tera
                .render(template_id, &tera_context)
                .map_err(|e| HostError::TemplateError {
                    template: template_id.to_string(),
                    message: e.to_string(),
                })?;

        // 同一ディレクトリ内の一時ファイルに書いてから rename（アトミック書き込み）
        let parent = output_path.parent().ok_or_else(|| HostError::IoError {
            path: output_path.to_path_buf(),
            message: "出力先の親ディレクトリが取得できません".to_string(),
        })?;

        let temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| HostError::IoError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;

        std::fs::write(temp_file.path(), &rendered).map_err(|e| HostError::IoError {
            path: temp_file.path().to_path_buf(),
            message: e.to_string(),
        })?;

        temp_file
            .persist(output_path)
            .map_err(|e| HostError::IoError {
                path: output_path.to_path_buf(),
                message: e.to_string(),
            })?;

        info!(output = %output_path.display(), "Supervisor config written");

        Ok(())
    }
}
