//! InMemory Destination Repository 実装
//!
//! ドメイン層が定義する DestinationRepository trait の具体的な実装。
//! ギルド ID をキーにした BTreeMap をインメモリ DB として使う。
//! 起動時に JSON ファイルから読み込み、以後は読み取り専用。

use std::{collections::BTreeMap, path::Path};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    config::{ConfigError, load_json},
    domain::{DestinationConfig, DestinationRepository, GuildId, RepositoryError},
};

/// インメモリ Destination Repository 実装
pub struct InMemoryDestinationRepository {
    destinations: Mutex<BTreeMap<GuildId, DestinationConfig>>,
}

impl InMemoryDestinationRepository {
    pub fn new(destinations: Vec<DestinationConfig>) -> Self {
        let destinations = destinations
            .into_iter()
            .map(|destination| (destination.guild_id, destination))
            .collect();
        Self {
            destinations: Mutex::new(destinations),
        }
    }

    /// JSON 配列のファイルから読み込む
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let destinations: Vec<DestinationConfig> = load_json(path)?;
        tracing::info!(
            "Loaded {} destinations from {}",
            destinations.len(),
            path.display()
        );
        Ok(Self::new(destinations))
    }
}

#[async_trait]
impl DestinationRepository for InMemoryDestinationRepository {
    async fn all_destinations(&self) -> Result<Vec<DestinationConfig>, RepositoryError> {
        let destinations = self.destinations.lock().await;
        Ok(destinations.values().cloned().collect())
    }
}
