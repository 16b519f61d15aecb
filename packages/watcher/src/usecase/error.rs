//! UseCase error types

use thiserror::Error;

use crate::domain::{NotifyError, PresenceError, PresentError, RepositoryError};

/// 1 回のポーリングサイクルを中断させたエラー
///
/// スケジューラがログに記録し、次のサイクルは通常どおり実行される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("could not read destinations: {0}")]
    Destinations(#[from] RepositoryError),

    #[error("could not publish the status board: {0}")]
    Present(#[from] PresentError),

    #[error("could not update the status line: {0}")]
    Presence(#[from] PresenceError),

    #[error("could not notify subscribers: {0}")]
    Notify(#[from] NotifyError),
}

impl CycleError {
    /// Connection resets are expected now and then and logged below `error`.
    pub fn is_connection_reset(&self) -> bool {
        matches!(
            self,
            Self::Present(PresentError::ConnectionReset)
                | Self::Presence(PresenceError::ConnectionReset)
                | Self::Notify(NotifyError::ConnectionReset)
        )
    }
}
