//! Watcher configuration
//!
//! JSON ファイルから読み込み、キーが無い場合は既定値を使う。
//! コマンドライン引数による上書きはバイナリ側で行う。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{AddressError, RelevanceFilter, ServerAddress},
    usecase::ScanSettings,
};

/// 設定ファイルの読み込み・検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("could not parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid master address: {0}")]
    MasterAddress(#[from] AddressError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Read and deserialize a JSON file.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// ウォッチャー全体の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// マスターサーバのアドレス（`host:port`）
    pub master_address: String,
    /// 対象 MOD を識別するパッケージ名の一部
    pub mod_marker: String,
    /// ステータス表示の接頭辞
    pub status_label: String,
    /// ポーリング間隔（秒）
    pub poll_interval_secs: u64,
    pub master_timeout_ms: u64,
    pub server_timeout_ms: u64,
    /// 同時に問い合わせるサーバ数の上限
    pub query_concurrency: usize,
    /// マスターの連続失敗がこの回数を超えると縮退表示になる
    pub degraded_threshold: u32,
    /// プレイヤーのいないサーバをステータスボードに載せない
    pub hide_empty_servers: bool,
    pub presentation: PresentationConfig,
    /// IP アドレス → 国コード（データベースより優先）
    pub geoip: HashMap<String, String>,
    /// GeoLite2-Country データベースのパス。未指定なら既定の場所を探す
    pub geoip_database: Option<PathBuf>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            master_address: "master.qzandronum.com:15300".to_string(),
            mod_marker: "qcdev".to_string(),
            status_label: "QC:DE".to_string(),
            poll_interval_secs: 240,
            master_timeout_ms: 5_000,
            server_timeout_ms: 3_000,
            query_concurrency: 16,
            degraded_threshold: 5,
            hide_empty_servers: true,
            presentation: PresentationConfig::default(),
            geoip: HashMap::new(),
            geoip_database: None,
        }
    }
}

impl WatcherConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ServerAddress::parse(&self.master_address)?;

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs cannot be 0".to_string(),
            ));
        }
        if self.query_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "query_concurrency cannot be 0".to_string(),
            ));
        }
        if self.mod_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("mod_marker cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::new(&self.mod_marker)
    }

    pub fn scan_settings(&self) -> Result<ScanSettings, ConfigError> {
        Ok(ScanSettings {
            master: ServerAddress::parse(&self.master_address)?,
            master_timeout: Duration::from_millis(self.master_timeout_ms),
            server_timeout: Duration::from_millis(self.server_timeout_ms),
            concurrency: self.query_concurrency,
        })
    }
}

/// サムネイル画像の URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    pub active: Option<String>,
    pub inactive: Option<String>,
    pub dead: Option<String>,
    pub memes: Vec<String>,
}

/// ステータスボードの見た目に関する設定
///
/// 実行中に `StatusBoardPresenter::reload_presentation` で差し替えられる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub title: String,
    pub author: String,
    pub icon_url: Option<String>,
    pub thumbnails: Thumbnails,
    pub idle_title: String,
    /// 誰もいないときにまれに表示されるメッセージ
    pub idle_memes: Vec<String>,
    /// 1/N の確率で idle_memes から選ぶ（0 で無効）
    pub idle_meme_one_in: u32,
    /// 1/N の確率でサムネイルを thumbnails.memes から選ぶ（0 で無効）
    pub thumbnail_meme_one_in: u32,
    pub degraded_title: String,
    pub degraded_text: String,
    pub footer: String,
    pub alert_text: String,
    /// 通知メッセージを消すまでの秒数（None で残す）
    pub alert_delete_after_secs: Option<u64>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            title: "QC:DE Servers".to_string(),
            author: "Arena Watch".to_string(),
            icon_url: None,
            thumbnails: Thumbnails::default(),
            idle_title: "The eternal halls are empty".to_string(),
            idle_memes: Vec::new(),
            idle_meme_one_in: 10,
            thumbnail_meme_one_in: 50,
            degraded_title: "Service currently unavailable".to_string(),
            degraded_text: "We are studying the ancient codex".to_string(),
            footer: "Last updated".to_string(),
            alert_text: "A warrior has entered the arenas".to_string(),
            alert_delete_after_secs: Some(1),
        }
    }
}

impl PresentationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }
}
