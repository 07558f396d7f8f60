//! 일봉 데이터 타입.
//!
//! - `KlineRecord` - 업스트림에서 받은 원본 일봉 (전일 종가 없음)
//! - `DailyBar` - 전일 종가가 채워진 캐시용 일봉

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Price, Volume};

/// 업스트림 K-line 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineRecord {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

/// 전일 종가가 포함된 일봉.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 전일 종가
    pub previous_close: Price,
    /// 거래량
    pub volume: Volume,
}

impl DailyBar {
    /// 업스트림 레코드 목록을 일봉 시리즈로 변환합니다.
    ///
    /// 날짜 오름차순으로 정렬한 뒤 각 봉의 전일 종가를 직전 봉의 종가로 채웁니다.
    /// 첫 봉의 전일 종가는 자신의 시가입니다.
    pub fn series_from_records(mut records: Vec<KlineRecord>) -> Vec<DailyBar> {
        records.sort_by_key(|r| r.date);

        let mut previous: Option<Price> = None;
        records
            .into_iter()
            .map(|r| {
                let previous_close = previous.unwrap_or(r.open);
                previous = Some(r.close);
                DailyBar {
                    date: r.date,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    previous_close,
                    volume: r.volume,
                }
            })
            .collect()
    }
}
