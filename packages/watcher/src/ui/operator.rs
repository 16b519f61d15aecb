//! 配信先ごとの問題をオペレータに報告する

use crate::domain::{DestinationConfig, DestinationSink, SinkError};

use super::view::OutboundMessage;

/// 配信先の問題を報告する
///
/// オペレータ用チャンネルが設定されていればそこへ送り、無ければログに残す。
/// 報告自体の失敗もログに残すだけで、呼び出し元には返さない。
pub async fn report_problem(
    sink: &dyn DestinationSink,
    destination: &DestinationConfig,
    context: &str,
    error: &SinkError,
) {
    let Some(operator_channel) = destination.operator_channel else {
        tracing::error!(
            "{} for guild {}: {}",
            context,
            destination.guild_id.0,
            error
        );
        return;
    };

    let report = OutboundMessage::OperatorReport {
        text: format!("arena-watch error: {}: {}", context, error),
    };
    let pushed = match report.to_json() {
        Ok(json) => sink
            .push_to(operator_channel, &json)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if let Err(reason) = pushed {
        tracing::error!(
            "{} for guild {}: {} (operator channel {} unreachable: {})",
            context,
            destination.guild_id.0,
            error,
            operator_channel,
            reason
        );
    }
}
