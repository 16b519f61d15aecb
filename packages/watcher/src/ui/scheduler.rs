//! ポーリングのスケジューラ
//!
//! 一定間隔で PollCycleUseCase を実行する。サイクルは常に 1 つずつ実行され、
//! 次の待機はサイクルが終わってから始まる。`ActivityState` はスケジューラが
//! 所有し、停止・再開をまたいで保持される。
//!
//! ## 責務
//!
//! - サイクルのエラーをログに残し、スケジュールは継続する
//! - 配信先が無くなったらスケジュールを止める
//! - サイクル内の panic がプロセスを落とさないようにする

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{
    domain::ActivityState,
    usecase::{CycleError, CycleOutcome, PollCycleUseCase, ScanOutcome},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

struct RunningLoop {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// ポーリングのスケジューラ
pub struct PollScheduler {
    cycle: Arc<PollCycleUseCase>,
    state: Arc<Mutex<ActivityState>>,
    interval: watch::Sender<Duration>,
    running: Mutex<Option<RunningLoop>>,
}

impl PollScheduler {
    pub fn new(cycle: PollCycleUseCase, interval: Duration) -> Result<Self, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        let (interval, _) = watch::channel(interval);
        Ok(Self {
            cycle: Arc::new(cycle),
            state: Arc::new(Mutex::new(ActivityState::new())),
            interval,
            running: Mutex::new(None),
        })
    }

    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// ポーリング間隔を変更する。実行中なら次の待機から反映される。
    pub fn set_interval(&self, interval: Duration) -> Result<(), ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        self.interval.send_replace(interval);
        tracing::info!("Poll interval set to {:?}", interval);
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let running = self.running.lock().await;
        running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// スケジュールを開始する。既に実行中なら `false` を返す。
    ///
    /// 最初のサイクルはすぐに実行される。
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
        {
            tracing::warn!("Poll schedule is already running");
            return false;
        }

        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            self.cycle.clone(),
            self.state.clone(),
            self.interval.subscribe(),
            stop_rx,
        ));
        *running = Some(RunningLoop { stop, task });
        tracing::info!("Poll schedule started (every {:?})", self.interval());
        true
    }

    /// スケジュールを止める。実行中のサイクルは最後まで実行される。
    ///
    /// 実行中でなければ `false` を返す。
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            return false;
        };

        let was_running = !running.task.is_finished();
        running.stop.send_replace(true);
        if let Err(e) = running.task.await {
            tracing::error!("Poll schedule task failed: {}", e);
        }
        if was_running {
            tracing::info!("Poll schedule stopped");
        }
        was_running
    }

    /// スケジュールとは別にサイクルを 1 回実行する
    ///
    /// 実行中のサイクルがあれば、その終了を待ってから実行する。
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        let mut state = self.state.lock().await;
        self.cycle.execute(&mut state).await
    }

    /// スキャンだけを実行する（通知や配信はしない）
    pub async fn scan_once(&self) -> ScanOutcome {
        let mut state = self.state.lock().await;
        self.cycle.scan_only(&mut state).await
    }

    /// 現在のアクティビティ状態のコピー
    pub async fn activity(&self) -> ActivityState {
        self.state.lock().await.clone()
    }
}

async fn run_loop(
    cycle: Arc<PollCycleUseCase>,
    state: Arc<Mutex<ActivityState>>,
    interval: watch::Receiver<Duration>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if !run_cycle(&cycle, &state).await {
            break;
        }

        let wait = *interval.borrow();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = stop.changed() => break,
        }
    }
}

/// サイクルを 1 回実行する。スケジュールを続けるなら `true`。
async fn run_cycle(cycle: &Arc<PollCycleUseCase>, state: &Arc<Mutex<ActivityState>>) -> bool {
    let cycle = cycle.clone();
    let mut guard = state.clone().lock_owned().await;

    // panic してもスケジュールは止めない
    let task = tokio::spawn(async move { cycle.execute(&mut guard).await });

    match task.await {
        Ok(Ok(CycleOutcome::NoConsumers)) => {
            tracing::warn!("No destinations configured, stopping the poll schedule");
            false
        }
        Ok(Ok(CycleOutcome::Completed(report))) => {
            tracing::debug!(
                "Cycle complete: {} servers, {} players, master failed: {}, notified: {}",
                report.result.relevant_servers.len(),
                report.result.total_human_players,
                report.master_failed,
                report.notified
            );
            true
        }
        Ok(Err(e)) if e.is_connection_reset() => {
            tracing::warn!("Poll cycle aborted: {}", e);
            true
        }
        Ok(Err(e)) => {
            tracing::error!("Poll cycle failed: {}", e);
            true
        }
        Err(e) => {
            tracing::error!("Poll cycle panicked: {}", e);
            true
        }
    }
}
