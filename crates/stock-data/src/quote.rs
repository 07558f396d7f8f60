//! 시세 조립.
//!
//! 현재가(장중이면 실시간 스냅샷, 아니면 마지막 일봉)와 과거 일봉 시리즈를
//! 합쳐 전일 대비 및 기간별 변동률을 계산합니다.
//!
//! # 동작 흐름
//!
//! ```text
//! get_quote(code, now)
//!         │
//!         ▼
//! ┌────────────────────┐
//! │ 1. 기준 일봉 시리즈   │── 없음 ─▶ None
//! └─────────┬──────────┘
//!           │
//!     ┌─────┴─────┐
//!     │  장중인가? │
//!     └─────┬─────┘
//!       YES │ NO
//!           │   └──────────────┐
//! ┌─────────▼──────────┐       │
//! │ 2. 실시간 스냅샷     │─ 실패 ┤
//! └─────────┬──────────┘       │
//!           │        ┌─────────▼──────────┐
//!           │        │ 3. 마지막 일봉       │
//!           │        └─────────┬──────────┘
//!           ▼                  ▼
//! ┌──────────────────────────────────┐
//! │ 4. 전일 대비 / 기간 변동률 계산      │
//! └──────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use stock_core::{
    percent_change, DailyBar, DecimalExt, PeriodChanges, Price, Provenance, Quote, QuoteConfig,
    SessionClock,
};
use tracing::{debug, instrument, warn};

use crate::cache::HistoricalSeriesCache;
use crate::error::{DataError, Result};
use crate::provider::{with_timeout, LiveQuoteSource, LiveTick};

/// 현재가와 그 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PricePoint {
    close: Price,
    previous_close: Price,
    provenance: Provenance,
}

/// 시세 조립기.
pub struct QuoteAssembler {
    series: Arc<HistoricalSeriesCache>,
    live: Arc<dyn LiveQuoteSource>,
    clock: SessionClock,
    periods: Vec<u32>,
    reference_lookback: u32,
    live_timeout: Duration,
}

impl QuoteAssembler {
    /// 새 조립기 생성.
    pub fn new(
        series: Arc<HistoricalSeriesCache>,
        live: Arc<dyn LiveQuoteSource>,
        clock: SessionClock,
        config: &QuoteConfig,
        live_timeout: Duration,
    ) -> Self {
        let mut periods = config.periods.clone();
        periods.sort_unstable();
        periods.dedup();

        Self {
            series,
            live,
            clock,
            periods,
            reference_lookback: config.reference_lookback(),
            live_timeout,
        }
    }

    /// 기준 시리즈 조회 일수.
    pub fn reference_lookback(&self) -> u32 {
        self.reference_lookback
    }

    /// 세션 시계.
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// 현재 시각 기준 시세.
    pub async fn get_quote(&self, canonical_code: &str) -> Option<Quote> {
        self.get_quote_at(canonical_code, Utc::now()).await
    }

    /// `now` 기준 시세를 조립합니다.
    ///
    /// 기준 일봉 시리즈를 얻지 못하면 `None`입니다. 실시간 조회 실패는
    /// 마지막 일봉으로 조용히 대체합니다.
    ///
    /// 실시간 조회는 세션 시각뿐 아니라 거래일 여부에도 달려 있습니다.
    /// `weekdays_only`가 켜져 있으면 주말에는 세션 시각이어도 과거 일봉을 씁니다.
    #[instrument(skip(self))]
    pub async fn get_quote_at(&self, canonical_code: &str, now: DateTime<Utc>) -> Option<Quote> {
        let Some(series) = self
            .series
            .get_series(canonical_code, self.reference_lookback)
            .await
        else {
            warn!(canonical = canonical_code, "기준 일봉 없음, 시세 조립 불가");
            return None;
        };
        let last = series.last()?;

        let live = if self.clock.is_open_at(now) {
            match self.fetch_live(canonical_code).await {
                Ok(tick) => Some(tick),
                Err(e) => {
                    debug!(canonical = canonical_code, error = %e, "실시간 시세 실패, 일봉 사용");
                    None
                }
            }
        } else {
            None
        };

        let point = match &live {
            Some(tick) => PricePoint {
                close: tick.now,
                previous_close: tick.prior_close,
                provenance: Provenance::Live,
            },
            None => PricePoint {
                close: last.close,
                previous_close: last.previous_close,
                provenance: Provenance::Historical,
            },
        };

        let today = self.clock.local_date(now);
        let as_of_date = match point.provenance {
            Provenance::Live => today,
            Provenance::Historical => last.date,
        };

        let change = point.close - point.previous_close;
        let change_pct = match percent_change(point.close, point.previous_close) {
            Some(pct) => pct.round_display(),
            None => {
                warn!(
                    canonical = canonical_code,
                    previous_close = %point.previous_close,
                    "전일 종가가 0 이하, 변동률 0으로 처리"
                );
                Decimal::ZERO
            }
        };

        let preceding = preceding_bars(&series, point.provenance, today);
        let period_changes = period_changes(preceding, point.close, &self.periods);

        Some(Quote {
            canonical_code: canonical_code.to_string(),
            as_of_date,
            close: point.close,
            previous_close: point.previous_close,
            change_abs: change.round_display(),
            change_pct,
            period_changes,
            provenance: point.provenance,
            fetched_at: now,
        })
    }

    /// 실시간 스냅샷 조회 및 검증.
    async fn fetch_live(&self, canonical_code: &str) -> Result<LiveTick> {
        let codes = [canonical_code.to_string()];
        let mut snapshot = with_timeout(
            self.live_timeout,
            "실시간 시세 조회",
            self.live.fetch_live_snapshot(&codes),
        )
        .await
        .map_err(|e| DataError::LiveQuoteUnavailable(e.to_string()))?;

        let tick = snapshot.remove(canonical_code).ok_or_else(|| {
            DataError::LiveQuoteUnavailable(format!("스냅샷에 없음: {}", canonical_code))
        })?;

        if !tick.now.is_strictly_positive() || !tick.prior_close.is_strictly_positive() {
            return Err(DataError::LiveQuoteUnavailable(format!(
                "비정상 실시간 값: now={}, prior_close={}",
                tick.now, tick.prior_close
            )));
        }
        Ok(tick)
    }
}

/// "오늘" 봉을 제외한 과거 봉.
///
/// 과거 일봉 시세면 마지막 봉이 오늘 봉입니다. 실시간 시세면 시리즈의 마지막
/// 봉 날짜가 거래소 현지 날짜와 같을 때만 오늘 봉으로 봅니다.
pub fn preceding_bars(series: &[DailyBar], provenance: Provenance, today: NaiveDate) -> &[DailyBar] {
    let current_included = match provenance {
        Provenance::Historical => true,
        Provenance::Live => series.last().is_some_and(|bar| bar.date == today),
    };

    if current_included {
        &series[..series.len().saturating_sub(1)]
    } else {
        series
    }
}

/// 기간별 변동률.
///
/// 기간 `p`의 기준가는 오늘 직전 봉부터 거슬러 `p`번째 봉의 종가입니다.
/// 과거 봉이 `p`개 미만이면 짧은 구간으로 대체하지 않고 비워 둡니다.
pub fn period_changes(preceding: &[DailyBar], close: Price, periods: &[u32]) -> PeriodChanges {
    let mut changes = PeriodChanges::new();

    for &period in periods {
        let p = period as usize;
        let pct = if p > 0 && preceding.len() >= p {
            let reference = preceding[preceding.len() - p].close;
            percent_change(close, reference).map(|pct| pct.round_display())
        } else {
            None
        };
        changes.insert(period, pct);
    }

    changes
}
