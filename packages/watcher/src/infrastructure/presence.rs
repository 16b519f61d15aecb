//! watch チャンネルを使った PresenceUpdater 実装
//!
//! 最新のステータス文字列だけを保持する。受信側は変更があったときだけ起こされる。

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{PresenceError, PresenceUpdater};

pub struct WatchPresenceUpdater {
    sender: watch::Sender<String>,
}

impl WatchPresenceUpdater {
    /// Updater と、ステータス文字列の受信側を作成
    pub fn new() -> (Self, watch::Receiver<String>) {
        let (sender, receiver) = watch::channel(String::new());
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl PresenceUpdater for WatchPresenceUpdater {
    async fn set_status(&self, text: &str) -> Result<(), PresenceError> {
        if self.sender.is_closed() {
            return Err(PresenceError::Closed);
        }

        // 同じ文字列なら受信側を起こさない
        self.sender.send_if_modified(|current| {
            if current == text {
                return false;
            }
            *current = text.to_string();
            true
        });
        Ok(())
    }
}
