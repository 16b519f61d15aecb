//! GeoLocator 実装
//!
//! - `MaxMindGeoLocator`: GeoLite2-Country データベース（`.mmdb`）から国コードを引く
//! - `StaticGeoLocator`: 設定ファイルの `geoip` テーブル。別の GeoLocator への上書きとしても使う

use std::{
    collections::HashMap,
    net::IpAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use maxminddb::{Reader, geoip2};

use crate::domain::GeoLocator;

/// 国別データベースのファイル名
pub const COUNTRY_DATABASE_FILE: &str = "GeoLite2-Country.mmdb";

/// データベースを探すディレクトリ（優先順）
///
/// `$GEOIP_PATH`, `~/.geoip`, `/usr/share/GeoIP`, `/var/lib/GeoIP`
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::var_os("GEOIP_PATH") {
        paths.push(PathBuf::from(dir));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".geoip"));
    }
    paths.push(PathBuf::from("/usr/share/GeoIP"));
    paths.push(PathBuf::from("/var/lib/GeoIP"));
    paths
}

/// 最初に見つかった `GeoLite2-Country.mmdb` のパス
pub fn find_country_database(search_paths: &[PathBuf]) -> Option<PathBuf> {
    search_paths
        .iter()
        .map(|dir| dir.join(COUNTRY_DATABASE_FILE))
        .find(|path| path.is_file())
}

/// GeoLite2-Country データベースを使う GeoLocator
///
/// データベースが見つからない・読めない場合は常に `None` を返す。
#[derive(Default)]
pub struct MaxMindGeoLocator {
    reader: Option<Reader<Vec<u8>>>,
}

impl MaxMindGeoLocator {
    /// 探索パスからデータベースを探して開く
    pub fn discover(search_paths: &[PathBuf]) -> Self {
        match find_country_database(search_paths) {
            Some(path) => Self::open(&path),
            None => {
                tracing::warn!(
                    "{} not found in {:?}, servers are shown without a country",
                    COUNTRY_DATABASE_FILE,
                    search_paths
                );
                Self::default()
            }
        }
    }

    pub fn open(path: &Path) -> Self {
        match Reader::open_readfile(path) {
            Ok(reader) => {
                tracing::info!("Loaded country database from {}", path.display());
                Self {
                    reader: Some(reader),
                }
            }
            Err(e) => {
                tracing::warn!("Could not open {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.reader.is_some()
    }
}

impl GeoLocator for MaxMindGeoLocator {
    fn country_code(&self, ip: &str) -> Option<String> {
        let reader = self.reader.as_ref()?;
        let ip: IpAddr = ip.parse().ok()?;
        let record: geoip2::Country = reader.lookup(ip).ok()?;
        record
            .country
            .and_then(|country| country.iso_code)
            .map(str::to_ascii_lowercase)
    }
}

/// 設定ファイルの `geoip` テーブルから国コードを引く
///
/// テーブルに無い IP は `fallback` に問い合わせる。
#[derive(Clone, Default)]
pub struct StaticGeoLocator {
    table: HashMap<String, String>,
    fallback: Option<Arc<dyn GeoLocator>>,
}

impl StaticGeoLocator {
    pub fn new(table: HashMap<String, String>) -> Self {
        let table = table
            .into_iter()
            .map(|(ip, code)| (ip, code.to_ascii_lowercase()))
            .collect();
        Self {
            table,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn GeoLocator>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl GeoLocator for StaticGeoLocator {
    fn country_code(&self, ip: &str) -> Option<String> {
        if let Some(code) = self.table.get(ip) {
            return Some(code.clone());
        }
        self.fallback.as_ref()?.country_code(ip)
    }
}
