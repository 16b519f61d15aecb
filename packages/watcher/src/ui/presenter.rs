//! ステータスボードの配信（StatusPresenter 実装）
//!
//! サイクルごとに 1 回描画し、すべての配信先のステータスメッセージを更新する。
//! 配信先ごとの失敗はオペレータに報告してサイクルを続け、
//! 接続リセットだけはサイクル全体のエラーとして返す。

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    operator::report_problem,
    render::StatusRenderer,
    view::{OutboundMessage, StatusView},
};
use crate::{
    config::{ConfigError, PresentationConfig},
    domain::{
        CycleResult, DestinationRepository, DestinationSink, PresentError, SinkError,
        StatusPresenter,
    },
};

pub struct StatusBoardPresenter {
    renderer: RwLock<StatusRenderer>,
    destinations: Arc<dyn DestinationRepository>,
    sink: Arc<dyn DestinationSink>,
}

impl StatusBoardPresenter {
    pub fn new(
        renderer: StatusRenderer,
        destinations: Arc<dyn DestinationRepository>,
        sink: Arc<dyn DestinationSink>,
    ) -> Self {
        Self {
            renderer: RwLock::new(renderer),
            destinations,
            sink,
        }
    }

    /// 表示設定を差し替える。次のサイクルから反映される。
    pub async fn reload_presentation(&self, presentation: PresentationConfig) {
        let mut renderer = self.renderer.write().await;
        renderer.set_presentation(presentation);
        tracing::info!("Presentation settings reloaded");
    }

    pub async fn reload_presentation_from_file(&self, path: &Path) -> Result<(), ConfigError> {
        let presentation = PresentationConfig::from_file(path)?;
        self.reload_presentation(presentation).await;
        Ok(())
    }

    pub async fn presentation(&self) -> PresentationConfig {
        self.renderer.read().await.presentation().clone()
    }
}

fn render_with_thread_rng(renderer: &StatusRenderer, result: &CycleResult) -> StatusView {
    renderer.render(result, &mut rand::thread_rng())
}

#[async_trait]
impl StatusPresenter for StatusBoardPresenter {
    async fn present(&self, result: &CycleResult) -> Result<(), PresentError> {
        let destinations = self.destinations.all_destinations().await?;

        let view = {
            let renderer = self.renderer.read().await;
            render_with_thread_rng(&renderer, result)
        };
        tracing::debug!(
            "Rendered status board: {:?}, {} servers",
            view.state,
            view.servers.len()
        );

        for destination in &destinations {
            let message = OutboundMessage::StatusBoard {
                message_id: destination.status_message_id,
                view: view.clone(),
            };
            let json = message
                .to_json()
                .map_err(|e| PresentError::RenderFailed(e.to_string()))?;

            match self.sink.push_to(destination.status_channel, &json).await {
                Ok(()) => {}
                Err(SinkError::ConnectionReset) => return Err(PresentError::ConnectionReset),
                Err(e) => {
                    report_problem(
                        self.sink.as_ref(),
                        destination,
                        "could not update the status board",
                        &e,
                    )
                    .await;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChannelId, DestinationConfig, GameType, GuildId, PlayerRecord, RepositoryError,
        ServerAddress, ServerSnapshot,
        query_client::MockGeoLocator,
        repository::{MockDestinationRepository, MockDestinationSink},
    };
    use arena_watch_shared::time::FixedClock;
    use std::sync::Mutex;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - present: 全配信先へのステータスボード送信
    // - 配信先ごとの失敗がサイクルを止めないこと
    // - 接続リセットだけはエラーとして返ること
    // - reload_presentation の反映
    // ========================================

    fn destination(guild: u64, channel: u64, operator: Option<u64>) -> DestinationConfig {
        DestinationConfig {
            guild_id: GuildId(guild),
            status_channel: ChannelId(channel),
            status_message_id: Some(guild * 1000),
            notify_role: None,
            operator_channel: operator.map(ChannelId),
        }
    }

    fn renderer() -> StatusRenderer {
        let mut geo = MockGeoLocator::new();
        geo.expect_country_code().returning(|_| None);
        StatusRenderer::new(
            PresentationConfig {
                idle_meme_one_in: 0,
                thumbnail_meme_one_in: 0,
                ..PresentationConfig::default()
            },
            5,
            true,
            Arc::new(geo),
            Arc::new(FixedClock::new(0)),
        )
    }

    fn cycle_result() -> CycleResult {
        CycleResult {
            relevant_servers: vec![ServerSnapshot {
                address: ServerAddress::new("192.0.2.1", 10666),
                name: "Arena".to_string(),
                map_name: "QCDE01".to_string(),
                player_count: 1,
                players: vec![PlayerRecord::human("alice")],
                game_type: GameType::Duel,
                loaded_packages: vec!["qcdev.pk3".to_string()],
                password_protected: false,
            }],
            total_human_players: 1,
            consecutive_master_failures: 0,
        }
    }

    fn repository(destinations: Vec<DestinationConfig>) -> MockDestinationRepository {
        let mut repository = MockDestinationRepository::new();
        repository
            .expect_all_destinations()
            .returning(move || Ok(destinations.clone()));
        repository
    }

    /// 送信内容を記録するモック sink
    fn recording_sink(
        failing: Option<(ChannelId, SinkError)>,
    ) -> (MockDestinationSink, Arc<Mutex<Vec<(ChannelId, String)>>>) {
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let log = pushed.clone();
        let mut sink = MockDestinationSink::new();
        sink.expect_push_to().returning(move |channel, content| {
            log.lock().unwrap().push((channel, content.to_string()));
            match &failing {
                Some((failing_channel, error)) if *failing_channel == channel => {
                    Err(error.clone())
                }
                _ => Ok(()),
            }
        });
        (sink, pushed)
    }

    #[tokio::test]
    async fn test_present_updates_every_destination() {
        // テスト項目: すべての配信先のステータスメッセージが更新される
        // given (前提条件):
        let (sink, pushed) = recording_sink(None);
        let presenter = StatusBoardPresenter::new(
            renderer(),
            Arc::new(repository(vec![
                destination(1, 10, None),
                destination(2, 20, None),
            ])),
            Arc::new(sink),
        );

        // when (操作):
        let result = presenter.present(&cycle_result()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let pushed = pushed.lock().unwrap();
        assert_eq!(pushed.len(), 2);
        assert_eq!(pushed[0].0, ChannelId(10));
        assert_eq!(pushed[1].0, ChannelId(20));

        let json: serde_json::Value = serde_json::from_str(&pushed[0].1).unwrap();
        assert_eq!(json["type"], "status_board");
        assert_eq!(json["message_id"], 1000);
        assert_eq!(json["view"]["state"], "active");
        assert_eq!(json["view"]["servers"][0]["name"], "Arena");
    }

    #[tokio::test]
    async fn test_missing_channel_is_reported_and_cycle_continues() {
        // テスト項目: 存在しないチャンネルはオペレータに報告され、他の配信先は更新される
        // given (前提条件):
        let (sink, pushed) =
            recording_sink(Some((ChannelId(10), SinkError::ChannelNotFound(ChannelId(10)))));
        let presenter = StatusBoardPresenter::new(
            renderer(),
            Arc::new(repository(vec![
                destination(1, 10, Some(99)),
                destination(2, 20, None),
            ])),
            Arc::new(sink),
        );

        // when (操作):
        let result = presenter.present(&cycle_result()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let channels: Vec<ChannelId> = pushed.lock().unwrap().iter().map(|(c, _)| *c).collect();
        assert_eq!(channels, vec![ChannelId(10), ChannelId(99), ChannelId(20)]);
    }

    #[tokio::test]
    async fn test_connection_reset_aborts_present() {
        // テスト項目: 接続リセットは PresentError::ConnectionReset として返る
        // given (前提条件):
        let (sink, pushed) = recording_sink(Some((ChannelId(10), SinkError::ConnectionReset)));
        let presenter = StatusBoardPresenter::new(
            renderer(),
            Arc::new(repository(vec![
                destination(1, 10, Some(99)),
                destination(2, 20, None),
            ])),
            Arc::new(sink),
        );

        // when (操作):
        let result = presenter.present(&cycle_result()).await;

        // then (期待する結果):
        assert_eq!(result, Err(PresentError::ConnectionReset));
        assert_eq!(pushed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repository_failure_is_returned() {
        // テスト項目: 配信先を読めなければエラーになる
        // given (前提条件):
        let mut repository = MockDestinationRepository::new();
        repository
            .expect_all_destinations()
            .returning(|| Err(RepositoryError::Unavailable("locked".to_string())));
        let mut sink = MockDestinationSink::new();
        sink.expect_push_to().never();
        let presenter =
            StatusBoardPresenter::new(renderer(), Arc::new(repository), Arc::new(sink));

        // when (操作):
        let result = presenter.present(&cycle_result()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(PresentError::Repository(RepositoryError::Unavailable(
                "locked".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_reload_presentation_changes_next_render() {
        // テスト項目: 表示設定の差し替えが次の描画に反映される
        // given (前提条件):
        let (sink, pushed) = recording_sink(None);
        let presenter = StatusBoardPresenter::new(
            renderer(),
            Arc::new(repository(vec![destination(1, 10, None)])),
            Arc::new(sink),
        );
        let mut presentation = presenter.presentation().await;
        presentation.title = "Arena Watch".to_string();

        // when (操作):
        presenter.reload_presentation(presentation).await;
        presenter.present(&cycle_result()).await.unwrap();

        // then (期待する結果):
        let pushed = pushed.lock().unwrap();
        let json: serde_json::Value = serde_json::from_str(&pushed[0].1).unwrap();
        assert_eq!(json["view"]["title"], "Arena Watch");
    }
}
