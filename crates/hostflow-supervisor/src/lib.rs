//! supervisor プロセス制御
//!
//! 外部の process supervisor を `supervisorctl` 経由で操作します。
//! 契約は exit status と出力テキストのみで、人間向けの文言は
//! 状態トークンの抽出以外ではパースしません。

pub mod control;
pub mod error;
pub mod status;

pub use control::{ManagedGroup, ProcessControl, Supervisorctl};
pub use error::{Result, SupervisorError};
pub use status::{GroupStatus, ProcessState, StatusMap, parse_status_output};
