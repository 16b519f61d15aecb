//! 「誰かが遊び始めた」通知（Notifier 実装）

use std::sync::Arc;

use async_trait::async_trait;

use super::{operator::report_problem, view::OutboundMessage};
use crate::domain::{DestinationRepository, DestinationSink, Notifier, NotifyError, SinkError};

/// 各配信先のステータスチャンネルに通知を送る
pub struct ArrivalNotifier {
    destinations: Arc<dyn DestinationRepository>,
    sink: Arc<dyn DestinationSink>,
    text: String,
    delete_after_secs: Option<u64>,
}

impl ArrivalNotifier {
    pub fn new(
        destinations: Arc<dyn DestinationRepository>,
        sink: Arc<dyn DestinationSink>,
        text: impl Into<String>,
        delete_after_secs: Option<u64>,
    ) -> Self {
        Self {
            destinations,
            sink,
            text: text.into(),
            delete_after_secs,
        }
    }
}

#[async_trait]
impl Notifier for ArrivalNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        let destinations = self.destinations.all_destinations().await?;

        for destination in &destinations {
            let message = OutboundMessage::Alert {
                mention_role: destination.notify_role,
                text: self.text.clone(),
                delete_after_secs: self.delete_after_secs,
            };
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Could not serialize alert: {}", e);
                    continue;
                }
            };

            match self.sink.push_to(destination.status_channel, &json).await {
                Ok(()) => tracing::debug!("Alert sent to guild {}", destination.guild_id.0),
                Err(SinkError::ConnectionReset) => return Err(NotifyError::ConnectionReset),
                Err(e) => {
                    report_problem(
                        self.sink.as_ref(),
                        destination,
                        "could not send the arrival alert",
                        &e,
                    )
                    .await;
                }
            }
        }

        Ok(())
    }
}
