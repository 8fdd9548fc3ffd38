//! hostflow のコア機能
//!
//! サーバーロール設定のモデルと読み込み、プロキシロール判定、
//! supervisor 設定のレンダリングを提供します。プロセス制御そのものは
//! hostflow-supervisor クレートが担当します。

pub mod config;
pub mod error;
pub mod model;
pub mod role;
pub mod template;

pub use config::{find_config_file, load_config};
pub use error::{HostError, Result};
pub use model::ServerConfig;
pub use role::{DEFAULT_IS_PROXY_SERVER, resolve_proxy_role};
pub use template::{RenderContext, Renderer, SUPERVISOR_TEMPLATE, TeraRenderer, build_context};
