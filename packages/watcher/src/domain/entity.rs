//! Domain entities
//!
//! - `ServerSnapshot`: 1 サイクル分のサーバ状態（不変）
//! - `ActivityState`: サイクルをまたいで保持される唯一の可変状態
//! - `CycleResult`: 1 サイクルの集計結果
//! - `DestinationConfig`: 配信先ごとの設定（読み取り専用）

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::value_object::{ChannelId, GameType, GuildId, PlayerRecord, RoleId, ServerAddress};

/// Query Client が返すサーバ 1 台分のスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub address: ServerAddress,
    pub name: String,
    pub map_name: String,
    pub player_count: u32,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    pub game_type: GameType,
    #[serde(default)]
    pub loaded_packages: Vec<String>,
    #[serde(default)]
    pub password_protected: bool,
}

impl ServerSnapshot {
    /// Number of bots in the player list.
    pub fn bot_count(&self) -> u32 {
        self.players.iter().filter(|player| player.is_bot).count() as u32
    }

    /// Reported player count minus bots, clamped at zero.
    pub fn human_count(&self) -> u32 {
        self.player_count.saturating_sub(self.bot_count())
    }
}

/// サイクルをまたいで保持されるアクティビティ状態
///
/// プロセス起動時に空で作られ、ポーリングのたびに Scanner と Tracker から
/// `&mut` で更新される。永続化はしないため、再起動すると初期状態に戻る。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityState {
    active_addresses: BTreeSet<ServerAddress>,
    last_known_good_master_list: Vec<ServerAddress>,
    consecutive_master_failures: u32,
}

impl ActivityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_addresses(&self) -> &BTreeSet<ServerAddress> {
        &self.active_addresses
    }

    pub fn is_active(&self, address: &ServerAddress) -> bool {
        self.active_addresses.contains(address)
    }

    pub fn has_active_servers(&self) -> bool {
        !self.active_addresses.is_empty()
    }

    pub fn last_known_good_master_list(&self) -> &[ServerAddress] {
        &self.last_known_good_master_list
    }

    pub fn consecutive_master_failures(&self) -> u32 {
        self.consecutive_master_failures
    }

    /// マスターサーバの応答を記録し、失敗カウンタをリセットする
    pub fn record_master_success(&mut self, addresses: Vec<ServerAddress>) {
        self.last_known_good_master_list = addresses;
        self.consecutive_master_failures = 0;
    }

    /// マスターサーバの失敗を記録し、キャッシュ済みのリストを返す
    pub fn record_master_failure(&mut self) -> Vec<ServerAddress> {
        self.consecutive_master_failures = self.consecutive_master_failures.saturating_add(1);
        self.last_known_good_master_list.clone()
    }

    /// Returns `true` if the address was not active before.
    pub fn activate(&mut self, address: ServerAddress) -> bool {
        self.active_addresses.insert(address)
    }

    /// Returns `true` if the address was active before.
    pub fn deactivate(&mut self, address: &ServerAddress) -> bool {
        self.active_addresses.remove(address)
    }

    /// Remove every active address not in `reported`, returning the removed ones.
    pub fn drop_unreported(&mut self, reported: &BTreeSet<&ServerAddress>) -> Vec<ServerAddress> {
        let leftovers: Vec<ServerAddress> = self
            .active_addresses
            .iter()
            .filter(|address| !reported.contains(address))
            .cloned()
            .collect();

        for address in &leftovers {
            self.active_addresses.remove(address);
        }

        leftovers
    }
}

/// 1 サイクルの集計結果
///
/// Orchestrator と Presentation 層が消費したあと破棄される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleResult {
    pub relevant_servers: Vec<ServerSnapshot>,
    pub total_human_players: u32,
    pub consecutive_master_failures: u32,
}

/// 配信先（ギルド）ごとの設定
///
/// コアは読み取るだけで、書き込みは外部のコマンド層が行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub guild_id: GuildId,
    /// ステータスボードを掲示するチャンネル
    pub status_channel: ChannelId,
    /// 編集対象のステータスメッセージ
    #[serde(default)]
    pub status_message_id: Option<u64>,
    /// サーバにプレイヤーが現れたときにメンションするロール
    #[serde(default)]
    pub notify_role: Option<RoleId>,
    /// エラーを報告するオペレータ向けチャンネル
    #[serde(default)]
    pub operator_channel: Option<ChannelId>,
}
