//! Domain error types
//!
//! 外部コラボレータ（Query Client、配信先、リポジトリ）との境界で発生するエラー。

use thiserror::Error;

use super::value_object::{ChannelId, ServerAddress};

/// Query Client のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// マスターサーバがタイムアウトした、または接続できなかった
    #[error("master server {0} is unreachable")]
    MasterUnreachable(ServerAddress),

    /// ゲームサーバがタイムアウトした、または接続できなかった
    #[error("server {0} is unreachable")]
    ServerUnreachable(ServerAddress),

    /// それ以外のクエリ失敗（不正な応答など）
    #[error("query to {address} failed: {reason}")]
    ServerQueryError {
        address: ServerAddress,
        reason: String,
    },
}

/// 配信先へのプッシュで発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// 設定で参照されているチャンネルが存在しない
    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    /// チャンネルは存在するが送信に失敗した
    #[error("failed to push to channel {channel}: {reason}")]
    PushFailed { channel: ChannelId, reason: String },

    /// 接続がリセットされた
    #[error("connection reset")]
    ConnectionReset,
}

/// 配信先設定リポジトリのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("destination storage unavailable: {0}")]
    Unavailable(String),
}

/// ステータスボードの描画・配信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentError {
    #[error("connection reset while publishing the status board")]
    ConnectionReset,

    #[error("failed to render the status board: {0}")]
    RenderFailed(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 通知エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("connection reset while notifying subscribers")]
    ConnectionReset,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// ステータス表示（プレゼンス）更新のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    #[error("connection reset while updating the status line")]
    ConnectionReset,

    #[error("status line receiver closed")]
    Closed,
}
