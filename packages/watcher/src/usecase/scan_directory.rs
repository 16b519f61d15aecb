//! UseCase: マスターサーバからのサーバ一覧取得と各サーバへの問い合わせ
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ScanDirectoryUseCase::execute() メソッド
//! - マスター失敗時のキャッシュへのフォールバックと失敗カウンタ
//! - サーバ単位の失敗の分離（1 台の失敗で他のサーバが欠けない）
//!
//! ### なぜこのテストが必要か
//! - 外部の UDP プロトコルは頻繁に失敗するため、部分的な失敗でも結果を返す必要がある
//! - 出力順序が決定的でないと通知と描画が再現できない
//!
//! ### どのような状況を想定しているか
//! - 正常系：マスター応答あり、全サーバ応答あり
//! - 異常系：マスターのタイムアウト・接続失敗、サーバのタイムアウト・不正応答
//! - エッジケース：初回からマスターが失敗（キャッシュが空）

use std::{collections::HashSet, sync::Arc, time::Duration};

use futures_util::{StreamExt, stream};

use crate::domain::{
    ActivityState, QueryClient, QueryError, QueryField, RelevanceFilter, ServerAddress,
    ServerSnapshot,
};

/// Scanner の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// マスターサーバのアドレス
    pub master: ServerAddress,
    /// マスターへの問い合わせのタイムアウト
    pub master_timeout: Duration,
    /// サーバ 1 台あたりのタイムアウト
    pub server_timeout: Duration,
    /// 同時に問い合わせるサーバ数の上限
    pub concurrency: usize,
}

/// 1 回のスキャン結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// 対象 MOD を実行しているサーバ（マスターの一覧順）
    pub relevant_servers: Vec<ServerSnapshot>,
    /// マスターが失敗し、キャッシュを使った場合は true
    pub master_failed: bool,
}

/// Directory Scanner のユースケース
pub struct ScanDirectoryUseCase {
    /// Query Client（プロトコル実装の抽象化）
    client: Arc<dyn QueryClient>,
    /// 対象 MOD の判定
    filter: RelevanceFilter,
    settings: ScanSettings,
}

impl ScanDirectoryUseCase {
    /// 新しい ScanDirectoryUseCase を作成
    pub fn new(client: Arc<dyn QueryClient>, filter: RelevanceFilter, settings: ScanSettings) -> Self {
        Self {
            client,
            filter,
            settings,
        }
    }

    /// スキャンを実行
    ///
    /// `state` の master list キャッシュと失敗カウンタを更新する。
    /// エラーは返さない。失敗はすべてこの中で回復される。
    pub async fn execute(&self, state: &mut ActivityState) -> ScanOutcome {
        // 1. マスターからアドレス一覧を取得（失敗時はキャッシュ）
        let (addresses, master_failed) = self.resolve_addresses(state).await;

        // 2. 各サーバに問い合わせ（失敗したサーバはスキップ）
        let snapshots = self.query_servers(&addresses).await;
        let queried = snapshots.len();

        // 3. 対象 MOD のサーバだけを残す
        let relevant_servers: Vec<ServerSnapshot> = snapshots
            .into_iter()
            .filter(|snapshot| self.filter.is_relevant(snapshot))
            .collect();

        tracing::debug!(
            "Scan finished: {} listed, {} answered, {} relevant",
            addresses.len(),
            queried,
            relevant_servers.len()
        );

        ScanOutcome {
            relevant_servers,
            master_failed,
        }
    }

    async fn resolve_addresses(&self, state: &mut ActivityState) -> (Vec<ServerAddress>, bool) {
        let master = &self.settings.master;
        let result =
            tokio::time::timeout(self.settings.master_timeout, self.client.resolve_master(master))
                .await;

        let failure = match result {
            Ok(Ok(addresses)) => {
                let addresses = dedup_preserving_order(addresses);
                tracing::debug!("Master {} listed {} servers", master, addresses.len());
                state.record_master_success(addresses.clone());
                return (addresses, false);
            }
            Ok(Err(error)) => error.to_string(),
            Err(_) => format!(
                "request to master server {} timed out after {:?}",
                master, self.settings.master_timeout
            ),
        };

        let cached = state.record_master_failure();
        tracing::warn!(
            "{}. Working from cache ({} servers, {} consecutive failures)",
            failure,
            cached.len(),
            state.consecutive_master_failures()
        );
        (cached, true)
    }

    async fn query_servers(&self, addresses: &[ServerAddress]) -> Vec<ServerSnapshot> {
        // buffered() keeps input order regardless of completion order
        stream::iter(addresses.iter().cloned())
            .map(|address| self.query_server(address))
            .buffered(self.settings.concurrency.max(1))
            .collect::<Vec<Option<ServerSnapshot>>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn query_server(&self, address: ServerAddress) -> Option<ServerSnapshot> {
        let result = tokio::time::timeout(
            self.settings.server_timeout,
            self.client.query_server(&address, &QueryField::SNAPSHOT),
        )
        .await;

        match result {
            Ok(Ok(snapshot)) => Some(ServerSnapshot { address, ..snapshot }),
            Ok(Err(QueryError::ServerUnreachable(_))) => {
                tracing::debug!("Server {} unreachable, skipping", address);
                None
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    address = %address,
                    error = ?error,
                    "Unexpected failure after querying server, skipping: {}",
                    error
                );
                None
            }
            Err(_) => {
                tracing::debug!(
                    "Server {} timed out after {:?}, skipping",
                    address,
                    self.settings.server_timeout
                );
                None
            }
        }
    }
}

fn dedup_preserving_order(addresses: Vec<ServerAddress>) -> Vec<ServerAddress> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|address| seen.insert(address.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameType, PlayerRecord, query_client::MockQueryClient};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn addr(last_octet: u8) -> ServerAddress {
        ServerAddress::new(format!("192.0.2.{}", last_octet), 10666)
    }

    fn snapshot(address: &ServerAddress, packages: &[&str]) -> ServerSnapshot {
        ServerSnapshot {
            address: address.clone(),
            name: format!("Server {}", address),
            map_name: "QCDE01".to_string(),
            player_count: 1,
            players: vec![PlayerRecord::human("alice")],
            game_type: GameType::Deathmatch,
            loaded_packages: packages.iter().map(|p| p.to_string()).collect(),
            password_protected: false,
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings {
            master: ServerAddress::new("master.example.org", 15300),
            master_timeout: Duration::from_secs(5),
            server_timeout: Duration::from_secs(3),
            concurrency: 4,
        }
    }

    fn create_usecase(client: MockQueryClient) -> ScanDirectoryUseCase {
        ScanDirectoryUseCase::new(Arc::new(client), RelevanceFilter::new("qcdev"), settings())
    }

    /// Every queried server answers as relevant.
    fn answer_all_relevant(client: &mut MockQueryClient) {
        client
            .expect_query_server()
            .returning(|address, _| Ok(snapshot(address, &["qcdev.pk3"])));
    }

    #[tokio::test]
    async fn test_scan_returns_relevant_servers_in_master_order() {
        // テスト項目: マスターの一覧順に対象サーバが返される
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|_| Ok(vec![addr(3), addr(1), addr(2)]));
        answer_all_relevant(&mut client);
        let usecase = create_usecase(client);
        let mut state = ActivityState::new();

        // when (操作):
        let outcome = usecase.execute(&mut state).await;

        // then (期待する結果):
        let addresses: Vec<ServerAddress> = outcome
            .relevant_servers
            .iter()
            .map(|s| s.address.clone())
            .collect();
        assert_eq!(addresses, vec![addr(3), addr(1), addr(2)]);
        assert!(!outcome.master_failed);
        assert_eq!(state.last_known_good_master_list(), &[addr(3), addr(1), addr(2)]);
        assert_eq!(state.consecutive_master_failures(), 0);
    }

    #[tokio::test]
    async fn test_scan_requests_every_snapshot_field() {
        // テスト項目: サーバへの問い合わせで必要なフィールドがすべて要求される
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client.expect_resolve_master().returning(|_| Ok(vec![addr(1)]));
        client
            .expect_query_server()
            .withf(|_, fields| fields == QueryField::SNAPSHOT.as_slice())
            .times(1)
            .returning(|address, _| Ok(snapshot(address, &["qcdev.pk3"])));
        let usecase = create_usecase(client);

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果):
        assert_eq!(outcome.relevant_servers.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_filters_irrelevant_servers() {
        // テスト項目: 対象 MOD を含まないサーバは除外される
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|_| Ok(vec![addr(1), addr(2)]));
        client.expect_query_server().returning(|address, _| {
            if *address == addr(1) {
                Ok(snapshot(address, &["QCDEv-2.pk3"]))
            } else {
                Ok(snapshot(address, &["other.wad"]))
            }
        });
        let usecase = create_usecase(client);

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果):
        assert_eq!(outcome.relevant_servers.len(), 1);
        assert_eq!(outcome.relevant_servers[0].address, addr(1));
    }

    #[tokio::test]
    async fn test_scan_falls_back_to_cached_master_list() {
        // テスト項目: マスター失敗時に前回成功時の一覧が使われ、カウンタが 1 増える
        // given (前提条件):
        let mut client = MockQueryClient::new();
        let calls = AtomicUsize::new(0);
        client.expect_resolve_master().returning(move |master| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![addr(1), addr(2)])
            } else {
                Err(QueryError::MasterUnreachable(master.clone()))
            }
        });
        answer_all_relevant(&mut client);
        let usecase = create_usecase(client);
        let mut state = ActivityState::new();
        usecase.execute(&mut state).await;

        // when (操作):
        let outcome = usecase.execute(&mut state).await;

        // then (期待する結果):
        assert!(outcome.master_failed);
        assert_eq!(outcome.relevant_servers.len(), 2);
        assert_eq!(state.consecutive_master_failures(), 1);
        assert_eq!(state.last_known_good_master_list(), &[addr(1), addr(2)]);
    }

    #[tokio::test]
    async fn test_consecutive_master_failures_accumulate() {
        // テスト項目: マスターが連続で失敗するとカウンタが 2 になる
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|master| Err(QueryError::MasterUnreachable(master.clone())));
        client.expect_query_server().never();
        let usecase = create_usecase(client);
        let mut state = ActivityState::new();

        // when (操作):
        let first = usecase.execute(&mut state).await;
        let second = usecase.execute(&mut state).await;

        // then (期待する結果): 初回はキャッシュが空なので結果も空
        assert!(first.master_failed && second.master_failed);
        assert!(second.relevant_servers.is_empty());
        assert_eq!(state.consecutive_master_failures(), 2);
    }

    #[tokio::test]
    async fn test_master_success_resets_failure_counter() {
        // テスト項目: マスターが復旧すると失敗カウンタが 0 に戻る
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|_| Ok(vec![addr(1)]));
        answer_all_relevant(&mut client);
        let usecase = create_usecase(client);
        let mut state = ActivityState::new();
        state.record_master_failure();
        state.record_master_failure();

        // when (操作):
        let outcome = usecase.execute(&mut state).await;

        // then (期待する結果):
        assert!(!outcome.master_failed);
        assert_eq!(state.consecutive_master_failures(), 0);
    }

    #[tokio::test]
    async fn test_failing_server_is_isolated() {
        // テスト項目: B の問い合わせが失敗しても A と C は結果に含まれる
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|_| Ok(vec![addr(1), addr(2), addr(3), addr(4)]));
        client.expect_query_server().returning(|address, _| {
            if *address == addr(2) {
                Err(QueryError::ServerUnreachable(address.clone()))
            } else if *address == addr(4) {
                Err(QueryError::ServerQueryError {
                    address: address.clone(),
                    reason: "truncated packet".to_string(),
                })
            } else {
                Ok(snapshot(address, &["qcdev.pk3"]))
            }
        });
        let usecase = create_usecase(client);

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果):
        let addresses: Vec<ServerAddress> = outcome
            .relevant_servers
            .iter()
            .map(|s| s.address.clone())
            .collect();
        assert_eq!(addresses, vec![addr(1), addr(3)]);
    }

    #[tokio::test]
    async fn test_duplicate_master_entries_are_queried_once() {
        // テスト項目: マスターが同じアドレスを重複して返しても 1 回だけ問い合わせる
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client
            .expect_resolve_master()
            .returning(|_| Ok(vec![addr(1), addr(1)]));
        client
            .expect_query_server()
            .times(1)
            .returning(|address, _| Ok(snapshot(address, &["qcdev.pk3"])));
        let usecase = create_usecase(client);

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果):
        assert_eq!(outcome.relevant_servers.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_address_is_the_queried_address() {
        // テスト項目: スナップショットのアドレスは問い合わせ先のアドレスになる
        // given (前提条件):
        let mut client = MockQueryClient::new();
        client.expect_resolve_master().returning(|_| Ok(vec![addr(1)]));
        client
            .expect_query_server()
            .returning(|_, _| Ok(snapshot(&addr(99), &["qcdev.pk3"])));
        let usecase = create_usecase(client);

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果):
        assert_eq!(outcome.relevant_servers[0].address, addr(1));
    }

    /// Query client whose calls take a configurable amount of time.
    struct SlowQueryClient {
        master_delay: Duration,
        slow_server: ServerAddress,
        server_delay: Duration,
    }

    #[async_trait]
    impl QueryClient for SlowQueryClient {
        async fn resolve_master(
            &self,
            _master: &ServerAddress,
        ) -> Result<Vec<ServerAddress>, QueryError> {
            tokio::time::sleep(self.master_delay).await;
            Ok(vec![addr(1), addr(2), addr(3)])
        }

        async fn query_server(
            &self,
            address: &ServerAddress,
            _fields: &[QueryField],
        ) -> Result<ServerSnapshot, QueryError> {
            if *address == self.slow_server {
                tokio::time::sleep(self.server_delay).await;
            }
            Ok(snapshot(address, &["qcdev.pk3"]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_master_timeout_uses_cache() {
        // テスト項目: マスターがタイムアウトするとキャッシュが使われる
        // given (前提条件):
        let client = SlowQueryClient {
            master_delay: Duration::from_secs(60),
            slow_server: addr(200),
            server_delay: Duration::ZERO,
        };
        let usecase =
            ScanDirectoryUseCase::new(Arc::new(client), RelevanceFilter::new("qcdev"), settings());
        let mut state = ActivityState::new();
        state.record_master_success(vec![addr(7)]);

        // when (操作):
        let outcome = usecase.execute(&mut state).await;

        // then (期待する結果):
        assert!(outcome.master_failed);
        assert_eq!(outcome.relevant_servers.len(), 1);
        assert_eq!(outcome.relevant_servers[0].address, addr(7));
        assert_eq!(state.consecutive_master_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_server_is_skipped_without_blocking_others() {
        // テスト項目: タイムアウトしたサーバだけがスキップされ、他のサーバは返される
        // given (前提条件):
        let client = SlowQueryClient {
            master_delay: Duration::ZERO,
            slow_server: addr(2),
            server_delay: Duration::from_secs(30),
        };
        let usecase =
            ScanDirectoryUseCase::new(Arc::new(client), RelevanceFilter::new("qcdev"), settings());
        let started = tokio::time::Instant::now();

        // when (操作):
        let outcome = usecase.execute(&mut ActivityState::new()).await;

        // then (期待する結果): 待ち時間はサーバ 1 台分のタイムアウトで済む
        let addresses: Vec<ServerAddress> = outcome
            .relevant_servers
            .iter()
            .map(|s| s.address.clone())
            .collect();
        assert_eq!(addresses, vec![addr(1), addr(3)]);
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
