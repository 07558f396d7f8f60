//! 통합 테스트용 가짜 업스트림 협력자.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use stock_core::{AppConfig, CanonicalCode, Instrument, KlineRecord};
use stock_data::{
    DataError, DirectorySource, KlineSource, LiveQuoteSource, LiveTick, QuoteService, Result,
    UpstreamSources,
};
use tokio::sync::Notify;

pub fn instrument(code: &str, name: &str) -> Instrument {
    Instrument::new(&CanonicalCode::parse(code).unwrap(), name)
}

/// 2025년 7월 `day`일 상하이 현지 시각을 UTC로 변환.
pub fn shanghai(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    // Asia/Shanghai = UTC+8, 서머타임 없음
    Utc.with_ymd_and_hms(2025, 7, day, hour, minute, 0).unwrap() - chrono::Duration::hours(8)
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

pub fn record(date: NaiveDate, open: Decimal, close: Decimal) -> KlineRecord {
    KlineRecord {
        date,
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: Decimal::from(1_000_000),
    }
}

// ==================== 디렉토리 ====================

pub struct FakeDirectory {
    pub instruments: Mutex<Vec<Instrument>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Duration,
    /// 설정 시 호출 진입을 알리고 해제될 때까지 대기
    pub gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl FakeDirectory {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments: Mutex::new(instruments),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing() -> Self {
        let fake = Self::new(Vec::new());
        fake.fail.store(true, Ordering::SeqCst);
        fake
    }

    pub fn set(&self, instruments: Vec<Instrument>) {
        *self.instruments.lock().unwrap() = instruments;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectorySource for FakeDirectory {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataError::FetchError("directory down".to_string()));
        }
        Ok(self.instruments.lock().unwrap().clone())
    }
}

// ==================== 실시간 ====================

#[derive(Default)]
pub struct FakeLive {
    pub ticks: Mutex<HashMap<String, LiveTick>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeLive {
    pub fn with_tick(self, code: &str, now: Decimal, prior_close: Decimal) -> Self {
        self.ticks.lock().unwrap().insert(
            code.to_string(),
            LiveTick {
                name: String::new(),
                now,
                open: prior_close,
                high: now.max(prior_close),
                low: now.min(prior_close),
                prior_close,
                volume: Decimal::from(500),
                turnover: Decimal::from(50_000),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveQuoteSource for FakeLive {
    async fn fetch_live_snapshot(&self, codes: &[String]) -> Result<HashMap<String, LiveTick>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataError::FetchError("realtime down".to_string()));
        }
        let ticks = self.ticks.lock().unwrap();
        Ok(codes
            .iter()
            .filter_map(|c| ticks.get(c).map(|t| (c.clone(), t.clone())))
            .collect())
    }
}

// ==================== 일봉 ====================

/// 최근 `lookback`개 레코드를 날짜 내림차순으로 돌려주는 가짜 일봉 소스.
#[derive(Default)]
pub struct FakeKline {
    pub series: Mutex<HashMap<String, Vec<KlineRecord>>>,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl FakeKline {
    pub fn with_series(self, code: &str, mut records: Vec<KlineRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        self.series.lock().unwrap().insert(code.to_string(), records);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KlineSource for FakeKline {
    async fn fetch_kline(&self, canonical_code: &str, lookback_days: u32) -> Result<Vec<KlineRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let series = self.series.lock().unwrap();
        let Some(records) = series.get(canonical_code) else {
            return Err(DataError::HistoricalSource(format!("no data: {}", canonical_code)));
        };
        let skip = records.len().saturating_sub(lookback_days as usize);
        Ok(records[skip..].iter().rev().cloned().collect())
    }
}

// ==================== 서비스 ====================

pub struct Harness {
    pub service: QuoteService,
    pub directory: Arc<FakeDirectory>,
    pub live: Arc<FakeLive>,
    pub kline: Arc<FakeKline>,
}

pub fn config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.directory.cache_dir = dir.to_path_buf();
    config
}

pub fn harness(dir: &Path, directory: FakeDirectory, live: FakeLive, kline: FakeKline) -> Harness {
    let directory = Arc::new(directory);
    let live = Arc::new(live);
    let kline = Arc::new(kline);

    let sources = UpstreamSources {
        directory: directory.clone(),
        live: live.clone(),
        kline: kline.clone(),
    };
    let service = QuoteService::new(&config(dir), sources).unwrap();

    Harness {
        service,
        directory,
        live,
        kline,
    }
}
