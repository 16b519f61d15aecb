//! 配信先に送るメッセージの形式
//!
//! チャットプラットフォーム固有の整形はしない。受信側のアダプタが
//! この JSON を受け取り、プラットフォームの表現に変換する。

use serde::Serialize;

use crate::domain::RoleId;

/// ステータスボードの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardState {
    /// プレイヤーのいるサーバがある
    Active,
    /// 表示するサーバが無い
    Idle,
    /// マスターサーバが長く応答していない
    Degraded,
}

impl BoardState {
    /// 表示色（0xRRGGBB）
    pub fn color(self) -> u32 {
        match self {
            BoardState::Active => 0x1fa51d,
            BoardState::Idle => 0xa51d2d,
            BoardState::Degraded => 0x222222,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerLine {
    pub name: String,
    pub is_bot: bool,
}

/// サーバ 1 台分の行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerLine {
    pub address: String,
    /// 小文字の国コード。不明なら None
    pub country: Option<String>,
    pub locked: bool,
    pub name: String,
    pub map: String,
    pub online: bool,
    pub humans: u32,
    /// 人間が先、bot が後。それぞれ名前順
    pub players: Vec<PlayerLine>,
}

/// サーバ一覧の代わりに表示する見出しと本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub title: String,
    pub text: String,
}

/// 描画済みのステータスボード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub title: String,
    pub author: String,
    pub icon_url: Option<String>,
    pub state: BoardState,
    pub color: u32,
    pub thumbnail: Option<String>,
    pub servers: Vec<ServerLine>,
    pub banner: Option<Banner>,
    pub footer: String,
    /// RFC 3339 (UTC)
    pub updated_at: String,
}

/// 配信先チャンネルに送るメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// 既存のステータスメッセージを編集する（ID が無ければ新規投稿）
    StatusBoard {
        message_id: Option<u64>,
        view: StatusView,
    },
    /// 「誰かが遊び始めた」通知
    Alert {
        mention_role: Option<RoleId>,
        text: String,
        delete_after_secs: Option<u64>,
    },
    /// オペレータ向けのエラー報告
    OperatorReport { text: String },
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
