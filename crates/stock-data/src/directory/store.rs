//! 종목 디렉토리 저장소.
//!
//! # 동작 흐름
//!
//! ```text
//! snapshot() 요청
//!         │
//!         ▼
//! ┌──────────────────────┐
//! │ 1. 메모리 스냅샷 유효? │── YES ──▶ 반환
//! └─────────┬────────────┘
//!           │ NO
//! ┌─────────▼────────────┐
//! │ 2. 파일 스냅샷 유효?   │── YES ──▶ 로드 후 반환
//! └─────────┬────────────┘
//!           │ NO
//! ┌─────────▼────────────┐
//! │ 3. 갱신 중/재시도 대기? │── YES ──▶ 기존(또는 빈) 스냅샷 반환
//! └─────────┬────────────┘
//!           │ NO
//! ┌─────────▼────────────┐
//! │ 4. 업스트림 갱신       │── 실패 ─▶ 기존(또는 빈) 스냅샷 반환
//! └─────────┬────────────┘
//!           ▼
//!     교체 → 저장 → 반환
//! ```
//!
//! 스냅샷은 `Arc`로 교체되므로 읽는 쪽은 갱신 중에도 이전 스냅샷을
//! 끝까지 일관되게 봅니다. 동시에 들어온 갱신 요청은 진행 중인 갱신의
//! 결과를 공유합니다.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use stock_core::DirectoryConfig;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use super::snapshot::{within_ttl, DirectorySnapshot};
use crate::error::{DataError, Result};
use crate::provider::{with_timeout, DirectorySource};

/// 마지막 갱신 시도 결과.
#[derive(Debug, Default)]
struct RefreshOutcome {
    /// 완료된 갱신 시도 수
    attempt: u64,
    /// 마지막 시도의 오류 메시지
    error: Option<String>,
    /// 마지막 실패 시각
    failed_at: Option<DateTime<Utc>>,
}

/// 종목 디렉토리 저장소.
pub struct DirectoryStore {
    path: PathBuf,
    ttl: Duration,
    retry_backoff: Duration,
    fetch_timeout: StdDuration,
    source: Arc<dyn DirectorySource>,
    current: RwLock<Option<Arc<DirectorySnapshot>>>,
    /// 갱신 직렬화 + 마지막 결과
    refresh_gate: Mutex<RefreshOutcome>,
    /// 잠금 없이 읽는 완료된 갱신 시도 수
    attempts: AtomicU64,
}

impl DirectoryStore {
    /// 새 저장소 생성.
    pub fn new(
        config: &DirectoryConfig,
        source: Arc<dyn DirectorySource>,
        fetch_timeout: StdDuration,
    ) -> Self {
        Self {
            path: config.snapshot_path(),
            ttl: config.ttl(),
            retry_backoff: config.retry_backoff(),
            fetch_timeout,
            source,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(RefreshOutcome::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// 스냅샷 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 스냅샷 TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 메모리 스냅샷 (없으면 `None`).
    pub async fn current(&self) -> Option<Arc<DirectorySnapshot>> {
        self.current.read().await.clone()
    }

    /// 파일 스냅샷의 마지막 기록 시각 (파일 mtime).
    pub async fn persisted_at(&self) -> Option<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    /// 파일 스냅샷이 존재하고 TTL 이내인지 확인합니다.
    pub async fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now()).await
    }

    /// `now` 기준 파일 스냅샷 유효 여부.
    pub async fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.persisted_at()
            .await
            .is_some_and(|written_at| within_ttl(written_at, now, self.ttl))
    }

    /// 유효한 파일 스냅샷을 읽어 메모리에 올립니다.
    ///
    /// 파일이 없거나 만료되었거나 역직렬화에 실패하면 `None`이며, 오류는
    /// 로그로만 남깁니다.
    pub async fn load(&self) -> Option<Arc<DirectorySnapshot>> {
        self.load_at(Utc::now()).await
    }

    /// `now` 기준으로 파일 스냅샷을 로드합니다.
    pub async fn load_at(&self, now: DateTime<Utc>) -> Option<Arc<DirectorySnapshot>> {
        let written_at = self.persisted_at().await?;
        if !within_ttl(written_at, now, self.ttl) {
            debug!(path = %self.path.display(), "스냅샷 파일 만료");
            return None;
        }

        let snapshot = match self.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "스냅샷 파일 로드 실패");
                return None;
            }
        };

        let snapshot = Arc::new(snapshot.with_refreshed_at(written_at));
        self.install(snapshot.clone()).await;

        info!(count = snapshot.len(), "종목 디렉토리 스냅샷 로드 완료");
        Some(snapshot)
    }

    async fn read_snapshot(&self) -> Result<DirectorySnapshot> {
        let bytes = tokio::fs::read(&self.path).await?;
        let snapshot: DirectorySnapshot = serde_json::from_slice(&bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// 업스트림에서 전체 종목 목록을 받아 스냅샷을 교체합니다.
    ///
    /// 이미 진행 중인 갱신이 있으면 그 결과를 공유합니다. 저장 실패는
    /// 로그만 남기고 갱신 자체는 성공으로 처리합니다.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<DirectorySnapshot>> {
        let observed = self.attempts.load(Ordering::Acquire);
        let mut gate = self.refresh_gate.lock().await;

        if gate.attempt != observed {
            debug!("진행 중이던 갱신 결과 공유");
            return match &gate.error {
                Some(message) => Err(DataError::DirectorySource(message.clone())),
                None => self.current().await.ok_or_else(|| {
                    DataError::DirectorySource("갱신된 스냅샷 없음".to_string())
                }),
            };
        }

        let result = self.pull_and_install().await;

        gate.attempt += 1;
        match &result {
            Ok(_) => {
                gate.error = None;
                gate.failed_at = None;
            }
            Err(e) => {
                gate.error = Some(e.to_string());
                gate.failed_at = Some(Utc::now());
            }
        }
        self.attempts.store(gate.attempt, Ordering::Release);

        result
    }

    async fn pull_and_install(&self) -> Result<Arc<DirectorySnapshot>> {
        info!(source = self.source.name(), "종목 디렉토리 갱신 시작");

        let instruments = with_timeout(
            self.fetch_timeout,
            "종목 목록 조회",
            self.source.fetch_full_instrument_list(),
        )
        .await
        .map_err(|e| match e {
            DataError::DirectorySource(_) => e,
            other => DataError::DirectorySource(other.to_string()),
        })?;

        if instruments.is_empty() {
            return Err(DataError::DirectorySource("빈 종목 목록".to_string()));
        }

        let snapshot = Arc::new(DirectorySnapshot::build(instruments, Utc::now()));
        self.install(snapshot.clone()).await;

        if let Err(e) = self.persist(&snapshot).await {
            error!(path = %self.path.display(), error = %e, "스냅샷 저장 실패");
        }

        info!(
            count = snapshot.len(),
            aliases = snapshot.alias_count(),
            "종목 디렉토리 갱신 완료"
        );
        Ok(snapshot)
    }

    /// 스냅샷을 파일에 저장합니다.
    ///
    /// 임시 파일에 쓴 뒤 rename하므로 읽는 쪽은 쓰다 만 파일을 보지 않습니다.
    pub async fn persist(&self, snapshot: &DirectorySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "스냅샷 저장 완료");
        Ok(())
    }

    /// 사용할 스냅샷을 반환합니다.
    ///
    /// 만료되었으면 파일 로드 또는 갱신을 시도합니다. 갱신이 진행 중이거나
    /// 최근 실패 후 재시도 대기 중이면 기다리지 않고 기존 스냅샷을 씁니다.
    /// 쓸 스냅샷이 전혀 없으면 빈 스냅샷을 반환합니다.
    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        let now = Utc::now();
        let current = self.current().await;

        if let Some(snapshot) = &current {
            if !snapshot.is_expired_at(now, self.ttl) {
                return snapshot.clone();
            }
        }

        if let Some(loaded) = self.load_at(now).await {
            return loaded;
        }

        if self.should_defer_refresh(now, current.is_some()) {
            return current.unwrap_or_else(|| Arc::new(DirectorySnapshot::empty()));
        }

        match self.refresh().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "종목 디렉토리 갱신 실패, 기존 스냅샷 사용");
                self.current()
                    .await
                    .unwrap_or_else(|| Arc::new(DirectorySnapshot::empty()))
            }
        }
    }

    /// 갱신을 미룰지 판단합니다.
    fn should_defer_refresh(&self, now: DateTime<Utc>, has_snapshot: bool) -> bool {
        match self.refresh_gate.try_lock() {
            // 갱신 진행 중: 기존 스냅샷이 있으면 기다리지 않음
            Err(_) => has_snapshot,
            Ok(gate) => gate
                .failed_at
                .is_some_and(|failed_at| within_ttl(failed_at, now, self.retry_backoff)),
        }
    }

    /// 메모리 스냅샷을 교체합니다.
    async fn install(&self, snapshot: Arc<DirectorySnapshot>) {
        *self.current.write().await = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use stock_core::{CanonicalCode, Instrument};

    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
        empty: AtomicBool,
    }

    #[async_trait]
    impl DirectorySource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DataError::FetchError("down".to_string()));
            }
            if self.empty.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            Ok(vec![Instrument::new(
                &CanonicalCode::parse("600519.SH").unwrap(),
                "贵州茅台",
            )])
        }
    }

    fn make_store(dir: &Path, fail: bool) -> (DirectoryStore, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(fail),
            empty: AtomicBool::new(false),
        });
        let config = DirectoryConfig {
            cache_dir: dir.to_path_buf(),
            ..Default::default()
        };
        (
            DirectoryStore::new(&config, source.clone(), StdDuration::from_secs(5)),
            source,
        )
    }

    #[tokio::test]
    async fn test_refresh_persists_and_load_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = make_store(dir.path(), false);

        assert!(!store.is_fresh().await);
        assert!(store.load().await.is_none());

        let refreshed = store.refresh().await.unwrap();
        assert_eq!(refreshed.len(), 1);
        assert!(store.is_fresh().await);
        assert!(!dir.path().join("stock_list.json.tmp").exists());

        let (reloaded, source) = make_store(dir.path(), false);
        let loaded = reloaded.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(Some(loaded.refreshed_at()), reloaded.persisted_at().await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = make_store(dir.path(), false);
        std::fs::write(store.path(), b"not json").unwrap();

        assert!(store.is_fresh().await);
        assert!(store.load().await.is_none());
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_empty_and_backs_off() {
        let dir = tempfile::tempdir().unwrap();
        let (store, source) = make_store(dir.path(), true);

        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, DataError::DirectorySource(_)));

        // 재시도 대기 중에는 업스트림을 다시 호출하지 않음
        let snapshot = store.snapshot().await;
        assert!(snapshot.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (store, source) = make_store(dir.path(), false);

        let previous = store.refresh().await.unwrap();
        let bytes = std::fs::read(store.path()).unwrap();
        let written_at = store.persisted_at().await.unwrap();

        // 빈 목록 → 갱신 실패
        source.empty.store(true, Ordering::SeqCst);
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, DataError::DirectorySource(_)));

        // 업스트림 오류 → 갱신 실패
        source.empty.store(false, Ordering::SeqCst);
        source.fail.store(true, Ordering::SeqCst);
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, DataError::DirectorySource(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let current = store.current().await.unwrap();
        assert!(Arc::ptr_eq(&current, &previous));
        assert_eq!(std::fs::read(store.path()).unwrap(), bytes);
        assert_eq!(store.persisted_at().await, Some(written_at));

        let snapshot = store.snapshot().await;
        assert!(Arc::ptr_eq(&snapshot, &previous));
        assert_eq!(
            crate::resolver::resolve_in(&snapshot, "贵州茅台").as_deref(),
            Some("600519.SH")
        );
    }
}
