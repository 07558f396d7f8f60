//! 시세 서비스.
//!
//! 디렉토리 저장소, 심볼 해석, 일봉 캐시, 시세 조립기를 하나로 묶은
//! 진입점입니다. 프로세스 시작 시 한 번 생성해 호출자에게 전달합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! let service = QuoteService::new(&config, UpstreamSources::sina(&config.upstream)?)?;
//! service.initialize().await;
//!
//! if let Some(quote) = service.quote("贵州茅台").await {
//!     println!("{} {}", quote.canonical_code, quote.close);
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use stock_core::{
    percent_change, AppConfig, DailyChart, DecimalExt, Instrument, Provenance, Quote,
    SessionClock, UpstreamConfig,
};
use tracing::{info, instrument, warn};

use crate::cache::{CacheStats, HistoricalSeriesCache};
use crate::directory::{DirectorySnapshot, DirectoryStore};
use crate::error::Result;
use crate::provider::{
    CompositeDirectorySource, DirectorySource, KlineSource, LiveQuoteSource,
    PredefinedDirectorySource, SinaDirectoryClient, SinaKlineClient, SinaQuoteClient,
};
use crate::quote::QuoteAssembler;
use crate::resolver::SymbolResolver;

/// 서비스가 사용하는 업스트림 협력자 묶음.
#[derive(Clone)]
pub struct UpstreamSources {
    pub directory: Arc<dyn DirectorySource>,
    pub live: Arc<dyn LiveQuoteSource>,
    pub kline: Arc<dyn KlineSource>,
}

impl UpstreamSources {
    /// Sina 금융 협력자 구성.
    ///
    /// 종목 목록은 내장 주요 종목 → Sina 전체 목록 순으로 통합합니다.
    pub fn sina(config: &UpstreamConfig) -> Result<Self> {
        let directory = CompositeDirectorySource::new()
            .with_source(Arc::new(PredefinedDirectorySource::new()))
            .with_source(Arc::new(SinaDirectoryClient::new(
                config.timeout(),
                config.page_size,
            )?));

        Ok(Self {
            directory: Arc::new(directory),
            live: Arc::new(SinaQuoteClient::new(config.timeout())?),
            kline: Arc::new(SinaKlineClient::new(config.timeout())?),
        })
    }
}

/// 서비스 상태.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// 현재 스냅샷 종목 수
    pub instrument_count: usize,
    /// 현재 스냅샷 갱신 시각
    pub refreshed_at: Option<DateTime<Utc>>,
    /// 파일 스냅샷 유효 여부
    pub snapshot_fresh: bool,
    /// 장중 여부
    pub market_open: bool,
    /// 일봉 캐시 통계
    pub series_cache: CacheStats,
    /// 확인 시각
    pub checked_at: DateTime<Utc>,
}

/// 시세 서비스.
pub struct QuoteService {
    store: Arc<DirectoryStore>,
    resolver: SymbolResolver,
    series: Arc<HistoricalSeriesCache>,
    assembler: QuoteAssembler,
    clock: SessionClock,
    search_limit: usize,
    default_days: u32,
}

impl QuoteService {
    /// 설정과 업스트림 협력자로 서비스를 생성합니다.
    pub fn new(config: &AppConfig, sources: UpstreamSources) -> Result<Self> {
        let clock = SessionClock::from_config(&config.session)?;

        let store = Arc::new(DirectoryStore::new(
            &config.directory,
            sources.directory,
            config.upstream.directory_timeout(),
        ));
        let series = Arc::new(HistoricalSeriesCache::new(
            sources.kline,
            config.series.capacity,
            config.upstream.timeout(),
        ));
        let assembler = QuoteAssembler::new(
            series.clone(),
            sources.live,
            clock.clone(),
            &config.quote,
            config.upstream.timeout(),
        );

        Ok(Self {
            resolver: SymbolResolver::new(store.clone()),
            store,
            series,
            assembler,
            clock,
            search_limit: config.directory.search_limit,
            default_days: config.series.default_days,
        })
    }

    /// 시작 시 디렉토리를 준비합니다.
    ///
    /// 유효한 파일 스냅샷이 있으면 로드하고, 없으면 업스트림에서 갱신합니다.
    /// 갱신이 실패해도 서비스는 합성 규칙만으로 계속 동작합니다.
    pub async fn initialize(&self) -> usize {
        if let Some(snapshot) = self.store.load().await {
            return snapshot.len();
        }

        match self.store.refresh().await {
            Ok(snapshot) => snapshot.len(),
            Err(e) => {
                warn!(error = %e, "초기 종목 디렉토리 갱신 실패");
                0
            }
        }
    }

    pub fn store(&self) -> &Arc<DirectoryStore> {
        &self.store
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn series_cache(&self) -> &Arc<HistoricalSeriesCache> {
        &self.series
    }

    pub fn assembler(&self) -> &QuoteAssembler {
        &self.assembler
    }

    /// 식별자를 표준 코드로 변환합니다.
    pub async fn resolve(&self, input: &str) -> Option<String> {
        self.resolver.resolve(input).await
    }

    /// 종목 정보 조회.
    pub async fn instrument_info(&self, input: &str) -> Option<Instrument> {
        self.resolver.instrument_info(input).await
    }

    /// 종목 검색. `limit`이 없으면 설정의 기본값을 씁니다.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Vec<Instrument> {
        let snapshot = self.store.snapshot().await;
        snapshot
            .search(query, limit.unwrap_or(self.search_limit))
            .into_iter()
            .cloned()
            .collect()
    }

    /// 별칭 키 → 종목 매핑.
    pub async fn mappings(&self) -> BTreeMap<String, Instrument> {
        let snapshot = self.store.snapshot().await;
        snapshot
            .mappings()
            .into_iter()
            .map(|(key, instrument)| (key.to_string(), instrument.clone()))
            .collect()
    }

    /// 현재 스냅샷.
    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.store.snapshot().await
    }

    /// 시세 조회.
    #[instrument(skip(self))]
    pub async fn quote(&self, input: &str) -> Option<Quote> {
        self.quote_at(input, Utc::now()).await
    }

    /// `now` 기준 시세 조회.
    pub async fn quote_at(&self, input: &str, now: DateTime<Utc>) -> Option<Quote> {
        let code = self.resolve(input).await?;
        self.assembler.get_quote_at(&code, now).await
    }

    /// 일봉 차트 조회. `days`가 없으면 설정의 기본값을 씁니다.
    #[instrument(skip(self))]
    pub async fn daily_chart(&self, input: &str, days: Option<u32>) -> Option<DailyChart> {
        self.daily_chart_at(input, days, Utc::now()).await
    }

    /// `now` 기준 일봉 차트 조회.
    pub async fn daily_chart_at(
        &self,
        input: &str,
        days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Option<DailyChart> {
        let code = self.resolve(input).await?;
        let days = days.unwrap_or(self.default_days).max(1);
        let series = self.series.get_series(&code, days).await?;
        let last = series.last()?;

        let change_pct = percent_change(last.close, last.previous_close)
            .map(|pct| pct.round_display())
            .unwrap_or(Decimal::ZERO);
        let data_type = if self.clock.is_open_at(now) {
            Provenance::Live
        } else {
            Provenance::Historical
        };

        Some(DailyChart {
            canonical_code: code,
            current_price: last.close,
            change_pct,
            volume: last.volume,
            bars: series.as_ref().clone(),
            data_type,
        })
    }

    /// 디렉토리를 즉시 갱신합니다.
    pub async fn refresh_directory(&self) -> Result<usize> {
        let snapshot = self.store.refresh().await?;
        info!(count = snapshot.len(), "종목 디렉토리 수동 갱신 완료");
        Ok(snapshot.len())
    }

    /// 서비스 상태 조회.
    pub async fn health(&self) -> HealthStatus {
        let now = Utc::now();
        let current = self.store.current().await;

        HealthStatus {
            instrument_count: current.as_ref().map_or(0, |s| s.len()),
            refreshed_at: current.as_ref().map(|s| s.refreshed_at()),
            snapshot_fresh: self.store.is_fresh_at(now).await,
            market_open: self.clock.is_open_at(now),
            series_cache: self.series.cache_stats().await,
            checked_at: now,
        }
    }
}
