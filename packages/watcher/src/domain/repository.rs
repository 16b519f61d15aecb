//! Repository / outbound trait 定義
//!
//! ドメイン層が必要とする外部へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層と UI 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    ChannelId, CycleResult, DestinationConfig, NotifyError, PresenceError, PresentError,
    RepositoryError, SinkError,
};

/// 配信先チャンネルへの送信チャンネル
pub type SinkChannel = mpsc::UnboundedSender<String>;

/// 配信先設定の読み取り
///
/// 書き込みは行わない。ポーリングのコアはサイクルの最初に 1 回読み、
/// 配信先が無ければサイクルを実行しない。StatusPresenter と Notifier の実装は
/// 送信先を選ぶためにそれぞれ自分で読む。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationRepository: Send + Sync {
    /// 有効な配信先をすべて取得
    async fn all_destinations(&self) -> Result<Vec<DestinationConfig>, RepositoryError>;
}

/// チャンネルへのメッセージ送信
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationSink: Send + Sync {
    /// チャンネルを登録
    async fn register_channel(&self, channel: ChannelId, sender: SinkChannel);

    /// チャンネルにシリアライズ済みのメッセージを送信
    async fn push_to(&self, channel: ChannelId, content: &str) -> Result<(), SinkError>;
}

/// ステータスボードの描画と配信（Presentation 層）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusPresenter: Send + Sync {
    /// 1 サイクルに 1 回呼ばれる
    async fn present(&self, result: &CycleResult) -> Result<(), PresentError>;
}

/// 「誰かが遊び始めた」通知
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 通知対象のサイクルで 1 回だけ呼ばれる。配信先の選択は実装側の責務。
    async fn notify(&self) -> Result<(), NotifyError>;
}

/// オンライン人数などのステータス表示
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceUpdater: Send + Sync {
    async fn set_status(&self, text: &str) -> Result<(), PresenceError>;
}
