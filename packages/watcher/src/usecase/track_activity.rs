//! UseCase: プレイヤーアクティビティの追跡
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TrackActivityUseCase::execute() メソッド
//! - joined / left / leftover の検出と通知判定
//!
//! ### なぜこのテストが必要か
//! - 複数のサーバがほぼ同時に埋まっても通知は 1 回だけにしたい
//! - 同じスナップショットで 2 回更新しても遷移が発生しないこと（冪等性）
//!
//! ### どのような状況を想定しているか
//! - 正常系：0 → 1 台のアクティブ化で通知、1 → 2 台では通知しない
//! - エッジケース：サーバが空になる、サーバが一覧から消える、bot だけのサーバ

use std::collections::BTreeSet;

use crate::domain::{ActivityState, ServerAddress, ServerSnapshot};

/// 1 サイクル分のアクティビティ変化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityUpdate {
    /// 今回プレイヤーが現れたサーバ
    pub joined: Vec<ServerAddress>,
    /// 今回プレイヤーがいなくなったサーバ
    pub left: Vec<ServerAddress>,
    /// 一覧から消えたためアクティブ集合から外したサーバ
    pub leftover: Vec<ServerAddress>,
    /// 全対象サーバの人間プレイヤー数の合計
    pub total_human_players: u32,
    /// アクティブなサーバが 0 台から 1 台以上になった
    pub should_notify: bool,
}

/// Activity Tracker のユースケース
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackActivityUseCase;

impl TrackActivityUseCase {
    pub fn new() -> Self {
        Self
    }

    /// アクティビティ状態を更新
    ///
    /// # Arguments
    ///
    /// * `state` - 前回サイクルまでのアクティブ集合を持つ状態
    /// * `servers` - 今回のサイクルで対象と判定されたサーバ
    pub fn execute(&self, state: &mut ActivityState, servers: &[ServerSnapshot]) -> ActivityUpdate {
        let mut update = ActivityUpdate::default();

        for server in servers {
            let humans = server.human_count();
            let address = &server.address;

            if humans >= 1 && !state.is_active(address) {
                let was_idle = !state.has_active_servers();
                state.activate(address.clone());
                update.joined.push(address.clone());
                tracing::info!("{:<20} {:<25} {}", "Player activity on", address, server.name);

                if was_idle {
                    update.should_notify = true;
                }
            }

            if humans < 1 && state.deactivate(address) {
                update.left.push(address.clone());
                tracing::info!("{:<20} {:<25} {}", "Server empty", address, server.name);
            }

            update.total_human_players += humans;
        }

        // 一覧に出てこなくなったサーバをアクティブ集合から外す
        let reported: BTreeSet<&ServerAddress> = servers.iter().map(|s| &s.address).collect();
        for address in state.drop_unreported(&reported) {
            tracing::info!("{:<20} {}", "Leftover server", address);
            update.leftover.push(address);
        }

        update
    }
}
