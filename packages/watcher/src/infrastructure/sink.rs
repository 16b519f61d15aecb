//! mpsc チャンネルを使った DestinationSink 実装
//!
//! チャットプラットフォーム側のアダプタが各チャンネル用の `UnboundedSender` を
//! 登録し、この実装はそれを使ってシリアライズ済みのメッセージを送る。
//! 受信側（プラットフォームへの実送信）はこのクレートの外にある。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChannelId, DestinationSink, SinkChannel, SinkError};

/// mpsc チャンネルを使った DestinationSink 実装
pub struct ChannelDestinationSink {
    /// Key: チャンネル ID, Value: そのチャンネルへの sender
    channels: Mutex<HashMap<ChannelId, SinkChannel>>,
}

impl ChannelDestinationSink {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for ChannelDestinationSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationSink for ChannelDestinationSink {
    async fn register_channel(&self, channel: ChannelId, sender: SinkChannel) {
        let mut channels = self.channels.lock().await;
        channels.insert(channel, sender);
        tracing::debug!("Channel {} registered to sink", channel);
    }

    async fn push_to(&self, channel: ChannelId, content: &str) -> Result<(), SinkError> {
        let channels = self.channels.lock().await;

        let sender = channels
            .get(&channel)
            .ok_or(SinkError::ChannelNotFound(channel))?;
        sender
            .send(content.to_string())
            .map_err(|e| SinkError::PushFailed {
                channel,
                reason: e.to_string(),
            })?;
        tracing::debug!("Pushed message to channel {}", channel);
        Ok(())
    }
}
