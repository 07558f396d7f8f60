//! 거래 세션 판별.
//!
//! 오전/오후 두 개의 세션 구간으로 "지금"이 장중인지 판별합니다.
//! 경계는 양쪽 모두 포함합니다.
//!
//! ```text
//! 09:30 ──── 11:30        13:00 ──── 15:00   (Asia/Shanghai)
//!   [ 오전 세션 ]            [ 오후 세션 ]
//! ```

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::SessionConfig;
use crate::error::StockError;

/// 닫힌 시간 구간 `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    /// 새 구간을 생성합니다. `start > end`이면 에러.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, StockError> {
        if start > end {
            return Err(StockError::Config(format!(
                "세션 시작({})이 종료({})보다 늦습니다",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 구간 포함 여부 (양 끝 포함).
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.start && t <= self.end
    }
}

/// 거래 세션 시계.
#[derive(Debug, Clone)]
pub struct SessionClock {
    morning: SessionWindow,
    afternoon: SessionWindow,
    timezone: Tz,
    weekdays_only: bool,
}

impl SessionClock {
    /// 세션 구간으로 시계를 생성합니다.
    pub fn new(morning: SessionWindow, afternoon: SessionWindow, timezone: Tz) -> Self {
        Self {
            morning,
            afternoon,
            timezone,
            weekdays_only: true,
        }
    }

    /// 주말 제외 여부를 설정합니다.
    pub fn with_weekdays_only(mut self, weekdays_only: bool) -> Self {
        self.weekdays_only = weekdays_only;
        self
    }

    /// 설정에서 시계를 생성합니다.
    ///
    /// 시각은 `HH:MM` 형식이어야 합니다.
    pub fn from_config(config: &SessionConfig) -> Result<Self, StockError> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| StockError::Config(format!("잘못된 타임존 {}: {}", config.timezone, e)))?;

        let morning = SessionWindow::new(
            parse_hhmm(&config.morning_start)?,
            parse_hhmm(&config.morning_end)?,
        )?;
        let afternoon = SessionWindow::new(
            parse_hhmm(&config.afternoon_start)?,
            parse_hhmm(&config.afternoon_end)?,
        )?;

        Ok(Self::new(morning, afternoon, timezone).with_weekdays_only(config.weekdays_only))
    }

    /// 시각이 세션 구간 안에 있는지 판별합니다.
    pub fn in_session(&self, t: NaiveTime) -> bool {
        self.morning.contains(t) || self.afternoon.contains(t)
    }

    /// 거래일(평일)인지 판별합니다.
    pub fn is_trading_day(&self, now: DateTime<Utc>) -> bool {
        if !self.weekdays_only {
            return true;
        }
        let local = now.with_timezone(&self.timezone);
        !matches!(local.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 주어진 시각에 장이 열려 있는지 판별합니다 (거래소 현지 시각 기준).
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_trading_day(now) && self.in_session(self.local_time(now))
    }

    /// 거래소 현지 시각.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.timezone).time()
    }

    /// 거래소 현지 날짜.
    pub fn local_date(&self, now: DateTime<Utc>) -> chrono::NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default()).expect("기본 세션 설정은 항상 유효")
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, StockError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| StockError::Config(format!("잘못된 시각 {}: {}", s, e)))
}
