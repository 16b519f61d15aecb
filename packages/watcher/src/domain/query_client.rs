//! Query Client trait 定義
//!
//! マスターサーバとゲームサーバに問い合わせるプロトコル実装への
//! インターフェース。プロトコル自体はこのクレートの外にある。

use async_trait::async_trait;

use super::{QueryError, ServerAddress, ServerSnapshot};

/// サーバに要求するフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    Name,
    MapName,
    PlayerCount,
    PlayerData,
    GameType,
    Packages,
    ForcePassword,
}

impl QueryField {
    /// Fields the scanner needs for one snapshot.
    pub const SNAPSHOT: [QueryField; 7] = [
        QueryField::Name,
        QueryField::MapName,
        QueryField::PlayerCount,
        QueryField::PlayerData,
        QueryField::GameType,
        QueryField::Packages,
        QueryField::ForcePassword,
    ];
}

/// Query Client trait
///
/// タイムアウトは呼び出し側（Scanner）が `tokio::time::timeout` で掛ける。
/// 実装側は接続失敗を `MasterUnreachable` / `ServerUnreachable` として返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// マスターサーバから登録済みサーバのアドレス一覧を取得
    async fn resolve_master(&self, master: &ServerAddress)
    -> Result<Vec<ServerAddress>, QueryError>;

    /// ゲームサーバ 1 台の状態を取得
    async fn query_server(
        &self,
        address: &ServerAddress,
        fields: &[QueryField],
    ) -> Result<ServerSnapshot, QueryError>;
}

/// IP アドレスから国コードを引く
#[cfg_attr(test, mockall::automock)]
pub trait GeoLocator: Send + Sync {
    /// ISO 3166-1 alpha-2 country code, if known.
    fn country_code(&self, ip: &str) -> Option<String>;
}
