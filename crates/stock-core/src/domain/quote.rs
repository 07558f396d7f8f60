//! 시세(Quote) 타입.
//!
//! 요청마다 새로 조립되며 저장되지 않습니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::bar::DailyBar;
use crate::types::{Percentage, Price, Volume};

/// 가격 데이터 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// 장중 실시간 스냅샷
    #[serde(rename = "realtime")]
    Live,
    /// 과거 일봉
    #[serde(rename = "historical")]
    Historical,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "realtime"),
            Provenance::Historical => write!(f, "historical"),
        }
    }
}

/// 기간별 변동률.
///
/// 데이터가 부족한 기간은 `None`으로 남겨 "데이터 없음"과 "0% 변동"을 구분합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodChanges(BTreeMap<u32, Option<Percentage>>);

impl PeriodChanges {
    /// 빈 기간 변동률.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기간 변동률을 기록합니다.
    pub fn insert(&mut self, days: u32, change_pct: Option<Percentage>) {
        self.0.insert(days, change_pct);
    }

    /// 기간 변동률 조회. 기간이 없거나 데이터가 부족하면 `None`.
    pub fn get(&self, days: u32) -> Option<Percentage> {
        self.0.get(&days).copied().flatten()
    }

    /// 해당 기간이 기록되었지만 데이터 부족으로 비어 있는지 확인합니다.
    pub fn is_absent(&self, days: u32) -> bool {
        matches!(self.0.get(&days), Some(None))
    }

    /// 기록된 기간 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 기록된 기간이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (기간, 변동률) 순회.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<Percentage>)> + '_ {
        self.0.iter().map(|(d, p)| (*d, *p))
    }
}

impl Serialize for PeriodChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (days, pct) in &self.0 {
            map.serialize_entry(&format!("{}d", days), pct)?;
        }
        map.end()
    }
}

/// 조립된 시세.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    /// 표준 코드 (예: 600519.SH)
    pub canonical_code: String,
    /// 기준일
    pub as_of_date: NaiveDate,
    /// 현재가
    pub close: Price,
    /// 전일 종가
    pub previous_close: Price,
    /// 전일 대비 (소수점 2자리)
    pub change_abs: Decimal,
    /// 전일 대비 변동률 % (소수점 2자리)
    pub change_pct: Percentage,
    /// 기간별 변동률
    pub period_changes: PeriodChanges,
    /// 가격 출처
    pub provenance: Provenance,
    /// 조립 시각
    pub fetched_at: DateTime<Utc>,
}

/// 일봉 차트 응답.
#[derive(Debug, Clone, Serialize)]
pub struct DailyChart {
    /// 표준 코드
    pub canonical_code: String,
    /// 마지막 봉 종가
    pub current_price: Price,
    /// 마지막 봉 변동률 % (소수점 2자리)
    pub change_pct: Percentage,
    /// 마지막 봉 거래량
    pub volume: Volume,
    /// 일봉 시리즈 (날짜 오름차순)
    pub bars: Vec<DailyBar>,
    /// 장중 여부에 따른 데이터 구분
    pub data_type: Provenance,
}
