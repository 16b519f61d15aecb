//! UseCase: 1 回のポーリングサイクル
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PollCycleUseCase::execute() メソッド
//! - Scanner → Tracker → Presenter → Presence → Notifier の順序と呼び出し回数
//!
//! ### なぜこのテストが必要か
//! - 通知は対象サイクルで 1 回だけ呼ばれる必要がある
//! - 配信先が無いときはスキャン自体を行わず、スケジュールを止める判断材料を返す
//!
//! ### どのような状況を想定しているか
//! - 正常系：0 → 1 台で通知、ステータス文言の更新
//! - 異常系：Presenter の失敗でサイクルが中断される
//! - エッジケース：配信先が 0 件

use std::sync::Arc;

use crate::domain::{
    ActivityState, CycleResult, DestinationRepository, Notifier, PresenceUpdater,
    StatusPresenter,
};

use super::{
    error::CycleError,
    scan_directory::{ScanDirectoryUseCase, ScanOutcome},
    track_activity::{ActivityUpdate, TrackActivityUseCase},
};

/// 1 サイクルの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 配信先が 1 件も無いため何もしなかった
    NoConsumers,
    /// サイクルが最後まで実行された
    Completed(CycleReport),
}

/// 完了したサイクルの詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub result: CycleResult,
    pub activity: ActivityUpdate,
    pub master_failed: bool,
    pub notified: bool,
}

/// Poll Cycle Orchestrator のユースケース
pub struct PollCycleUseCase {
    scan: ScanDirectoryUseCase,
    track: TrackActivityUseCase,
    /// 配信先設定（読み取り専用）
    destinations: Arc<dyn DestinationRepository>,
    /// ステータスボードの描画と配信
    presenter: Arc<dyn StatusPresenter>,
    /// オンライン人数の表示
    presence: Arc<dyn PresenceUpdater>,
    /// 通知
    notifier: Arc<dyn Notifier>,
    /// ステータス表示の接頭辞（例: "QC:DE"）
    status_label: String,
}

impl PollCycleUseCase {
    /// 新しい PollCycleUseCase を作成
    pub fn new(
        scan: ScanDirectoryUseCase,
        track: TrackActivityUseCase,
        destinations: Arc<dyn DestinationRepository>,
        presenter: Arc<dyn StatusPresenter>,
        presence: Arc<dyn PresenceUpdater>,
        notifier: Arc<dyn Notifier>,
        status_label: impl Into<String>,
    ) -> Self {
        Self {
            scan,
            track,
            destinations,
            presenter,
            presence,
            notifier,
            status_label: status_label.into(),
        }
    }

    /// サイクルを実行
    ///
    /// # Returns
    ///
    /// * `Ok(CycleOutcome::NoConsumers)` - 配信先が無い（スケジュールを止めるべき）
    /// * `Ok(CycleOutcome::Completed(_))` - サイクル完了
    /// * `Err(CycleError)` - 描画・配信・通知の失敗でサイクルが中断された
    pub async fn execute(&self, state: &mut ActivityState) -> Result<CycleOutcome, CycleError> {
        // 1. 配信先の確認
        let destinations = self.destinations.all_destinations().await?;
        if destinations.is_empty() {
            return Ok(CycleOutcome::NoConsumers);
        }

        // 2. スキャンとアクティビティ更新
        let scan = self.scan.execute(state).await;
        let activity = self.track.execute(state, &scan.relevant_servers);
        let result = CycleResult {
            relevant_servers: scan.relevant_servers,
            total_human_players: activity.total_human_players,
            consecutive_master_failures: state.consecutive_master_failures(),
        };

        // 3. ステータスボードとステータス表示の更新
        self.presenter.present(&result).await?;
        self.presence
            .set_status(&self.status_text(result.total_human_players))
            .await?;

        // 4. 通知（0 台 → 1 台以上になったサイクルだけ）
        let notified = if activity.should_notify {
            self.notifier.notify().await?;
            true
        } else {
            false
        };

        Ok(CycleOutcome::Completed(CycleReport {
            result,
            activity,
            master_failed: scan.master_failed,
            notified,
        }))
    }

    /// スキャンだけを実行（状態のキャッシュと失敗カウンタは更新される）
    pub async fn scan_only(&self, state: &mut ActivityState) -> ScanOutcome {
        self.scan.execute(state).await
    }

    /// ステータス表示の文言
    pub fn status_text(&self, total_human_players: u32) -> String {
        format!("{}: {} online", self.status_label, total_human_players)
    }
}
