//! 일봉 시리즈 캐시.
//!
//! `(표준 코드, 조회 일수)` 쌍을 키로 하는 LRU 메모이제이션입니다.
//!
//! # 주요 기능
//!
//! - **동시성 제어**: 같은 키의 동시 미스는 업스트림을 한 번만 호출
//! - **LRU 제거**: 용량 초과 시 가장 오래 쓰지 않은 항목 제거
//! - **불변 항목**: 캐시된 시리즈는 `Arc`로 공유되며 바뀌지 않음
//!
//! TTL은 없습니다. 새 데이터가 필요하면 `invalidate` 또는 `clear`를 호출합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stock_core::DailyBar;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::provider::{with_timeout, KlineSource};

/// 캐시된 일봉 시리즈 (날짜 오름차순).
pub type Series = Arc<Vec<DailyBar>>;

/// 키별 페칭 상태를 추적하는 Lock 맵.
type FetchLockMap = RwLock<HashMap<SeriesKey, Arc<Mutex<()>>>>;

/// 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub canonical_code: String,
    pub lookback_days: u32,
}

impl SeriesKey {
    pub fn new(canonical_code: impl Into<String>, lookback_days: u32) -> Self {
        Self {
            canonical_code: canonical_code.into(),
            lookback_days,
        }
    }
}

/// 캐시 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// 캐시 적중 수
    pub hits: u64,
    /// 캐시 미스 수 (업스트림 호출 수)
    pub misses: u64,
    /// 현재 항목 수
    pub size: usize,
    /// 최대 항목 수
    pub capacity: usize,
    /// LRU 제거 수
    pub evictions: u64,
}

struct CacheEntry {
    series: Series,
    last_used: u64,
}

#[derive(Default)]
struct LruState {
    entries: HashMap<SeriesKey, CacheEntry>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl LruState {
    fn touch(&mut self, key: &SeriesKey) -> Option<Series> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.series.clone())
    }

    /// 항목을 넣고 용량을 넘으면 LRU 항목을 제거해 반환합니다.
    fn insert(&mut self, key: SeriesKey, series: Series, capacity: usize) -> Vec<SeriesKey> {
        self.tick += 1;
        self.entries.insert(
            key,
            CacheEntry {
                series,
                last_used: self.tick,
            },
        );

        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            self.evictions += 1;
            evicted.push(oldest);
        }
        evicted
    }
}

/// 일봉 시리즈 캐시.
pub struct HistoricalSeriesCache {
    source: Arc<dyn KlineSource>,
    capacity: usize,
    fetch_timeout: Duration,
    state: Mutex<LruState>,
    /// 동시성 제어를 위한 Lock 맵
    fetch_locks: FetchLockMap,
}

impl HistoricalSeriesCache {
    /// 새 캐시 생성. 용량은 최소 1입니다.
    pub fn new(source: Arc<dyn KlineSource>, capacity: usize, fetch_timeout: Duration) -> Self {
        Self {
            source,
            capacity: capacity.max(1),
            fetch_timeout,
            state: Mutex::new(LruState::default()),
            fetch_locks: RwLock::new(HashMap::new()),
        }
    }

    /// 일봉 시리즈 조회 (캐시 우선).
    ///
    /// 미스이면 업스트림을 한 번 호출해 정렬·전일 종가 보정 후 캐시합니다.
    /// 업스트림이 실패하거나 빈 결과를 주면 `None`이며 캐시하지 않습니다.
    #[instrument(skip(self))]
    pub async fn get_series(&self, canonical_code: &str, lookback_days: u32) -> Option<Series> {
        let key = SeriesKey::new(canonical_code, lookback_days);

        if let Some(series) = self.lookup(&key, false).await {
            debug!(canonical = canonical_code, lookback_days, "일봉 캐시 적중");
            return Some(series);
        }

        // 1. 동시성 제어: 같은 키는 하나만 페칭
        let lock = self.get_or_create_lock(&key).await;
        let guard = lock.lock().await;

        // 2. 기다리는 동안 다른 요청이 채웠는지 재확인
        if let Some(series) = self.lookup(&key, true).await {
            debug!(canonical = canonical_code, lookback_days, "일봉 캐시 적중 (대기 후)");
            return Some(series);
        }

        debug!(canonical = canonical_code, lookback_days, "일봉 캐시 미스");
        let fetched = with_timeout(
            self.fetch_timeout,
            "일봉 조회",
            self.source.fetch_kline(canonical_code, lookback_days),
        )
        .await;
        let records = match fetched {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                warn!(canonical = canonical_code, lookback_days, "일봉 데이터 없음");
                drop(guard);
                self.release_lock(&key).await;
                return None;
            }
            Err(e) => {
                warn!(canonical = canonical_code, error = %e, "일봉 조회 실패");
                drop(guard);
                self.release_lock(&key).await;
                return None;
            }
        };

        let series: Series = Arc::new(DailyBar::series_from_records(records));

        let evicted = {
            let mut state = self.state.lock().await;
            state.insert(key, series.clone(), self.capacity)
        };
        if !evicted.is_empty() {
            let mut locks = self.fetch_locks.write().await;
            for key in &evicted {
                locks.remove(key);
            }
            debug!(evicted = evicted.len(), "일봉 캐시 LRU 제거");
        }

        Some(series)
    }

    /// 캐시 조회. `count_miss`가 참이면 미스도 집계합니다.
    async fn lookup(&self, key: &SeriesKey, count_miss: bool) -> Option<Series> {
        let mut state = self.state.lock().await;
        match state.touch(key) {
            Some(series) => {
                state.hits += 1;
                Some(series)
            }
            None => {
                if count_miss {
                    state.misses += 1;
                }
                None
            }
        }
    }

    /// Lock 획득 또는 생성.
    async fn get_or_create_lock(&self, key: &SeriesKey) -> Arc<Mutex<()>> {
        let locks = self.fetch_locks.read().await;
        if let Some(lock) = locks.get(key) {
            return lock.clone();
        }
        drop(locks);

        let mut locks = self.fetch_locks.write().await;
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 캐시에 남지 않는 키의 Lock을 제거합니다.
    async fn release_lock(&self, key: &SeriesKey) {
        self.fetch_locks.write().await.remove(key);
    }

    /// 한 종목의 모든 조회 일수 항목을 제거합니다.
    pub async fn invalidate(&self, canonical_code: &str) -> usize {
        let removed = {
            let mut state = self.state.lock().await;
            let before = state.entries.len();
            state
                .entries
                .retain(|key, _| key.canonical_code != canonical_code);
            before - state.entries.len()
        };
        self.fetch_locks
            .write()
            .await
            .retain(|key, _| key.canonical_code != canonical_code);
        removed
    }

    /// 모든 항목을 제거합니다. 통계 카운터는 유지합니다.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
        self.fetch_locks.write().await.clear();
    }

    /// 캐시 통계.
    pub async fn cache_stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            size: state.entries.len(),
            capacity: self.capacity,
            evictions: state.evictions,
        }
    }
}
