//! サーバーロール設定のモデル定義
//!
//! ホストごとの役割を宣言する config.json をそのまま表現します。
//! オーケストレーターはこの設定を1回のrunにつき1度だけ読み込み、
//! run中に変更することはありません。

use serde::{Deserialize, Serialize};

/// 1ホスト分のサーバーロール設定
///
/// JSON形式：
/// ```json
/// {
///     "name": "app-server",
///     "domain": "example.com",
///     "is_proxy_server": false,
///     "workers": 4,
///     "web_port": 8000,
///     "redis_port": 11000,
///     "user": "frappe"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// ホストの論理名
    pub name: String,
    /// 公開ドメイン（空文字列の場合あり）
    ///
    /// ロール判定には使用されない。トポロジー情報としてのみ保持する。
    #[serde(default)]
    pub domain: String,
    /// プロキシサーバーかどうかの明示フラグ
    ///
    /// 未指定（None）は `false` と同義ではない。未指定時の扱いは
    /// [`crate::role::resolve_proxy_role`] が決める。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_proxy_server: Option<bool>,
    /// バックグラウンドワーカーのプロセス数
    #[serde(default)]
    pub workers: u32,
    /// webワーカーの待ち受けポート
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_port: Option<u16>,
    /// redisの待ち受けポート
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_port: Option<u16>,
    /// プロセスを実行するOSユーザー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}
