//! JSON フィクスチャを使った QueryClient 実装
//!
//! 実際のランチャープロトコルを話す代わりに、JSON ファイルに書かれた
//! サーバ一覧を返す。ローカルでの動作確認と結合テストに使う。
//!
//! ```json
//! {
//!   "master_reachable": true,
//!   "servers": [
//!     { "status": "ok", "address": "192.0.2.10:10666", "name": "Arena", ... },
//!     { "status": "unreachable", "address": "192.0.2.11:10666" }
//!   ]
//! }
//! ```

use std::{collections::BTreeMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::{ConfigError, load_json},
    domain::{QueryClient, QueryError, QueryField, ServerAddress, ServerSnapshot},
};

/// フィクスチャ上のサーバ 1 台分
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FixtureServer {
    /// 正常に応答する
    Ok(ServerSnapshot),
    /// マスターには載っているが応答しない
    Unreachable { address: ServerAddress },
    /// 不正な応答を返す
    Error {
        address: ServerAddress,
        #[serde(default)]
        reason: String,
    },
}

impl FixtureServer {
    pub fn address(&self) -> &ServerAddress {
        match self {
            FixtureServer::Ok(snapshot) => &snapshot.address,
            FixtureServer::Unreachable { address } | FixtureServer::Error { address, .. } => {
                address
            }
        }
    }
}

fn default_master_reachable() -> bool {
    true
}

/// フィクスチャファイルの内容
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fixture {
    #[serde(default = "default_master_reachable")]
    pub master_reachable: bool,
    #[serde(default)]
    pub servers: Vec<FixtureServer>,
}

struct FixtureState {
    master_reachable: bool,
    /// マスターが返す順序を保つため、挿入順のアドレス一覧を別に持つ
    order: Vec<ServerAddress>,
    servers: BTreeMap<ServerAddress, FixtureServer>,
}

/// フィクスチャから応答を返す QueryClient
///
/// 実行中に `set_master_reachable` / `upsert_server` で内容を書き換えられる。
pub struct FixtureQueryClient {
    state: Mutex<FixtureState>,
}

impl FixtureQueryClient {
    pub fn new(fixture: Fixture) -> Self {
        let mut order = Vec::new();
        let mut servers = BTreeMap::new();
        for server in fixture.servers {
            let address = server.address().clone();
            if servers.insert(address.clone(), server).is_none() {
                order.push(address);
            }
        }

        Self {
            state: Mutex::new(FixtureState {
                master_reachable: fixture.master_reachable,
                order,
                servers,
            }),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let fixture: Fixture = load_json(path)?;
        tracing::info!(
            "Loaded {} fixture servers from {}",
            fixture.servers.len(),
            path.display()
        );
        Ok(Self::new(fixture))
    }

    pub async fn set_master_reachable(&self, reachable: bool) {
        let mut state = self.state.lock().await;
        state.master_reachable = reachable;
    }

    /// サーバを追加、または同じアドレスのサーバを置き換える
    pub async fn upsert_server(&self, server: FixtureServer) {
        let mut state = self.state.lock().await;
        let address = server.address().clone();
        if state.servers.insert(address.clone(), server).is_none() {
            state.order.push(address);
        }
    }

    /// サーバをマスターの一覧から外す
    pub async fn remove_server(&self, address: &ServerAddress) {
        let mut state = self.state.lock().await;
        state.servers.remove(address);
        state.order.retain(|a| a != address);
    }
}

#[async_trait]
impl QueryClient for FixtureQueryClient {
    async fn resolve_master(
        &self,
        master: &ServerAddress,
    ) -> Result<Vec<ServerAddress>, QueryError> {
        let state = self.state.lock().await;
        if !state.master_reachable {
            return Err(QueryError::MasterUnreachable(master.clone()));
        }
        Ok(state.order.clone())
    }

    async fn query_server(
        &self,
        address: &ServerAddress,
        _fields: &[QueryField],
    ) -> Result<ServerSnapshot, QueryError> {
        let state = self.state.lock().await;
        match state.servers.get(address) {
            Some(FixtureServer::Ok(snapshot)) => Ok(snapshot.clone()),
            Some(FixtureServer::Error { reason, .. }) => Err(QueryError::ServerQueryError {
                address: address.clone(),
                reason: reason.clone(),
            }),
            Some(FixtureServer::Unreachable { .. }) | None => {
                Err(QueryError::ServerUnreachable(address.clone()))
            }
        }
    }
}
