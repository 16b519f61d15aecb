//! Relevance filter: does a server run the tracked mod?

use super::ServerSnapshot;

/// Accepts servers whose loaded packages mention the tracked mod marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceFilter {
    marker: String,
}

impl RelevanceFilter {
    /// The marker is matched case-insensitively as a substring.
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.trim().to_lowercase(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_relevant(&self, snapshot: &ServerSnapshot) -> bool {
        if self.marker.is_empty() {
            return false;
        }

        snapshot
            .loaded_packages
            .iter()
            .any(|package| package.to_lowercase().contains(&self.marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameType, ServerAddress};

    fn snapshot_with_packages(packages: &[&str]) -> ServerSnapshot {
        ServerSnapshot {
            address: ServerAddress::new("192.0.2.1", 10666),
            name: "Arena".to_string(),
            map_name: "QCDE01".to_string(),
            player_count: 0,
            players: vec![],
            game_type: GameType::Deathmatch,
            loaded_packages: packages.iter().map(|p| p.to_string()).collect(),
            password_protected: false,
        }
    }

    #[test]
    fn test_matching_package_is_relevant() {
        // テスト項目: マーカーを含むパッケージがあれば対象と判定される
        // given (前提条件):
        let filter = RelevanceFilter::new("qcdev");
        let snapshot = snapshot_with_packages(&["qcdev3.0.pk3"]);

        // when (操作):
        let result = filter.is_relevant(&snapshot);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        // テスト項目: 大文字小文字を区別せずに判定される
        // given (前提条件):
        let filter = RelevanceFilter::new("QCDEv");
        let snapshot = snapshot_with_packages(&["QCDEV_Maps_v2.PK3"]);

        // when (操作):
        let result = filter.is_relevant(&snapshot);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_marker_in_later_package_is_found() {
        // テスト項目: 先頭以外のパッケージにマーカーがあっても対象と判定される
        // given (前提条件):
        let filter = RelevanceFilter::new("qcdev");
        let snapshot = snapshot_with_packages(&["skins.pk3", "music.pk3", "qcdev-core.pk3"]);

        // when (操作):
        let result = filter.is_relevant(&snapshot);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_server_without_marker_is_not_relevant() {
        // テスト項目: マーカーを含まないサーバは対象外
        // given (前提条件):
        let filter = RelevanceFilter::new("qcdev");
        let no_match = snapshot_with_packages(&["brutal.pk3", "qc.pk3"]);
        let no_packages = snapshot_with_packages(&[]);

        // when (操作) / then (期待する結果):
        assert!(!filter.is_relevant(&no_match));
        assert!(!filter.is_relevant(&no_packages));
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        // テスト項目: 空のマーカーはどのサーバにもマッチしない
        // given (前提条件):
        let filter = RelevanceFilter::new("  ");
        let snapshot = snapshot_with_packages(&["qcdev.pk3"]);

        // when (操作):
        let result = filter.is_relevant(&snapshot);

        // then (期待する結果):
        assert!(!result);
    }
}
