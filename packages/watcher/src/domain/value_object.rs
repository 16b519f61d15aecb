//! Value objects
//!
//! ドメインで使う不変の値。生成時にバリデーションを行い、以降は変更されない。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ServerAddress のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address '{0}' is missing a port")]
    MissingPort(String),

    #[error("address '{0}' has an empty host")]
    EmptyHost(String),

    #[error("address '{0}' has an invalid port")]
    InvalidPort(String),

    #[error("address '{0}' has unbalanced brackets")]
    UnbalancedBrackets(String),
}

/// `host:port` 形式のサーバアドレス
///
/// Map / Set のキーとして使うため `Eq + Hash + Ord` を実装する。
/// IPv6 ホストは `[::1]:10666` のように角括弧で囲む。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// `host:port` 文字列から ServerAddress を作成
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let trimmed = value.trim();
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| AddressError::MissingPort(trimmed.to_string()))?;

        let host = match host.strip_prefix('[') {
            Some(inner) => inner.strip_suffix(']'),
            None if host.ends_with(']') => None,
            None => Some(host),
        }
        .filter(|host| !host.contains(['[', ']']))
        .ok_or_else(|| AddressError::UnbalancedBrackets(trimmed.to_string()))?;
        if host.is_empty() {
            return Err(AddressError::EmptyHost(trimmed.to_string()));
        }

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| AddressError::InvalidPort(trimmed.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        };
        f.pad(&text)
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServerAddress> for String {
    fn from(address: ServerAddress) -> Self {
        address.to_string()
    }
}

/// サーバに接続しているプレイヤー 1 人分の情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    #[serde(default)]
    pub is_bot: bool,
}

impl PlayerRecord {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bot: false,
        }
    }

    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_bot: true,
        }
    }
}

/// サーバが報告するゲームモード
///
/// The numeric codes follow the launcher protocol; unknown codes are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum GameType {
    Cooperative,
    Survival,
    Invasion,
    Deathmatch,
    TeamPlay,
    Duel,
    Terminator,
    LastManStanding,
    TeamLastManStanding,
    Possession,
    TeamPossession,
    TeamGame,
    CaptureTheFlag,
    OneFlagCaptureTheFlag,
    Skulltag,
    Domination,
    Unknown(u8),
}

impl From<u8> for GameType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Cooperative,
            1 => Self::Survival,
            2 => Self::Invasion,
            3 => Self::Deathmatch,
            4 => Self::TeamPlay,
            5 => Self::Duel,
            6 => Self::Terminator,
            7 => Self::LastManStanding,
            8 => Self::TeamLastManStanding,
            9 => Self::Possession,
            10 => Self::TeamPossession,
            11 => Self::TeamGame,
            12 => Self::CaptureTheFlag,
            13 => Self::OneFlagCaptureTheFlag,
            14 => Self::Skulltag,
            15 => Self::Domination,
            other => Self::Unknown(other),
        }
    }
}

impl From<GameType> for u8 {
    fn from(game_type: GameType) -> Self {
        match game_type {
            GameType::Cooperative => 0,
            GameType::Survival => 1,
            GameType::Invasion => 2,
            GameType::Deathmatch => 3,
            GameType::TeamPlay => 4,
            GameType::Duel => 5,
            GameType::Terminator => 6,
            GameType::LastManStanding => 7,
            GameType::TeamLastManStanding => 8,
            GameType::Possession => 9,
            GameType::TeamPossession => 10,
            GameType::TeamGame => 11,
            GameType::CaptureTheFlag => 12,
            GameType::OneFlagCaptureTheFlag => 13,
            GameType::Skulltag => 14,
            GameType::Domination => 15,
            GameType::Unknown(code) => code,
        }
    }
}

/// 配信先ギルドの ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// 配信先チャンネルの ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 通知時にメンションするロールの ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);
