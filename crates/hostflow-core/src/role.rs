//! プロキシロール判定
//!
//! サーバーがリバースプロキシ役（nginx reload watcher を常駐させるホスト）
//! かどうかを設定から判定します。判定はこのモジュールに集約し、
//! 呼び出し側でのインラインのフォールバックは行いません。

use crate::model::ServerConfig;

/// `is_proxy_server` が未指定だった場合のデフォルト値
///
/// 明示フラグが導入される前に書かれたロール設定との後方互換のため、
/// 未指定のホストはプロキシとして扱う。オペレーターが明示的に
/// `is_proxy_server: false` を書いた場合のみプロキシ役から外れる。
// NOTE: domain の有無から推定する案もあったが、観測された挙動を
// そのまま維持している。デフォルトの見直しは設定移行が済んでから。
pub const DEFAULT_IS_PROXY_SERVER: bool = true;

/// 設定からプロキシロールを解決する
///
/// `is_proxy_server` が明示されていればその値を、未指定なら
/// [`DEFAULT_IS_PROXY_SERVER`] を返す。`domain` の有無や内容は
/// 判定に一切影響しない。
pub fn resolve_proxy_role(config: &ServerConfig) -> bool {
    config.is_proxy_server.unwrap_or(DEFAULT_IS_PROXY_SERVER)
}
