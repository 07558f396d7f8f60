//! Sina 금융 공개 API 클라이언트.
//!
//! # 엔드포인트
//!
//! - 일봉: `money.finance.sina.com.cn` `CN_MarketData.getKLineData` (JSON)
//! - 실시간: `hq.sinajs.cn/list=sh600519,...` (JS 변수 대입문)
//! - 종목 목록: `vip.stock.finance.sina.com.cn` `Market_Center.getHQNodeData` (JSON, 페이지)
//!
//! 응답 파싱은 HTTP와 분리된 순수 함수(`parse_*`)로 두어 단위 테스트합니다.
//! 개별 레코드 파싱 실패는 경고 로그 후 건너뜁니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use stock_core::{CanonicalCode, Instrument, KlineRecord};
use tracing::{debug, info, warn};

use super::{DirectorySource, KlineSource, LiveQuoteSource, LiveTick};
use crate::error::{DataError, Result};

const KLINE_URL: &str =
    "https://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";
const REALTIME_URL: &str = "https://hq.sinajs.cn/list=";
const NODE_URL: &str =
    "https://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQNodeData";

/// 실시간 시세 요청에 필요한 Referer.
const SINA_REFERER: &str = "https://finance.sina.com.cn";

/// 일봉 스케일 (240분 = 일봉).
const DAILY_SCALE: &str = "240";

/// 沪深 A주 노드.
const A_SHARE_NODE: &str = "hs_a";

/// 목록에 남길 Sina 심볼 접두사.
const KEEP_SYMBOL_PREFIXES: &[&str] = &["sh6", "sz0", "sz3", "sz2"];

/// 종목 목록 최대 페이지 수.
const MAX_NODE_PAGES: u32 = 200;

/// 실시간 응답에서 필요한 최소 필드 수.
const MIN_REALTIME_FIELDS: usize = 10;

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Mozilla/5.0")
        .build()
        .map_err(DataError::from)
}

// ==================== K-line ====================

/// Sina 일봉 클라이언트.
#[derive(Clone)]
pub struct SinaKlineClient {
    client: reqwest::Client,
}

impl SinaKlineClient {
    /// 새 클라이언트 생성.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl KlineSource for SinaKlineClient {
    async fn fetch_kline(
        &self,
        canonical_code: &str,
        lookback_days: u32,
    ) -> Result<Vec<KlineRecord>> {
        let code = CanonicalCode::parse(canonical_code)?;
        let symbol = code.to_sina_symbol();
        let datalen = lookback_days.to_string();

        debug!(canonical = canonical_code, symbol = %symbol, lookback_days, "Sina K-line 요청");

        let body = self
            .client
            .get(KLINE_URL)
            .query(&[
                ("symbol", symbol.as_str()),
                ("scale", DAILY_SCALE),
                ("ma", "no"),
                ("datalen", datalen.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_kline_payload(canonical_code, &body)
    }
}

/// K-line JSON 응답을 파싱합니다.
///
/// 응답 형식: `[{"day":"2025-07-08","open":"12.750","high":"12.840",
/// "low":"12.650","close":"12.690","volume":"109098597"}, ...]`.
/// 알 수 없는 종목이면 Sina는 `null`을 반환하며, 이는 빈 목록입니다.
pub fn parse_kline_payload(canonical_code: &str, body: &str) -> Result<Vec<KlineRecord>> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Option<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| DataError::HistoricalSource(format!("K-line 응답 파싱 실패: {}", e)))?;

    let mut records = Vec::new();
    for row in rows.unwrap_or_default() {
        match parse_kline_row(&row) {
            Ok(record) => records.push(record),
            Err(e) => warn!(canonical = canonical_code, error = %e, "K-line 레코드 건너뜀"),
        }
    }
    Ok(records)
}

fn parse_kline_row(row: &Value) -> Result<KlineRecord> {
    let field = |name: &str| -> Result<Decimal> {
        row.get(name)
            .and_then(decimal_from_value)
            .ok_or_else(|| DataError::MalformedRecord(format!("{} 필드 오류: {}", name, row)))
    };

    let day = row
        .get("day")
        .and_then(Value::as_str)
        .ok_or_else(|| DataError::MalformedRecord(format!("day 필드 없음: {}", row)))?;
    let date = NaiveDate::parse_from_str(day.get(..10).unwrap_or(day), "%Y-%m-%d")
        .map_err(|e| DataError::MalformedRecord(format!("날짜 형식 오류 {}: {}", day, e)))?;

    Ok(KlineRecord {
        date,
        open: field("open")?,
        high: field("high")?,
        low: field("low")?,
        close: field("close")?,
        volume: field("volume")?,
    })
}

/// 문자열 또는 숫자 JSON 값을 Decimal로 변환.
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

// ==================== 실시간 ====================

/// Sina 실시간 시세 클라이언트.
#[derive(Clone)]
pub struct SinaQuoteClient {
    client: reqwest::Client,
}

impl SinaQuoteClient {
    /// 새 클라이언트 생성.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl LiveQuoteSource for SinaQuoteClient {
    async fn fetch_live_snapshot(&self, codes: &[String]) -> Result<HashMap<String, LiveTick>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let symbols = codes
            .iter()
            .map(|c| CanonicalCode::parse(c).map(|code| code.to_sina_symbol()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let url = format!("{}{}", REALTIME_URL, symbols.join(","));

        debug!(count = symbols.len(), "Sina 실시간 시세 요청");

        let body = self
            .client
            .get(&url)
            .header("Referer", SINA_REFERER)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_realtime_payload(&body))
    }
}

/// `hq.sinajs.cn` 응답을 파싱합니다.
///
/// 각 줄은 `var hq_str_sh600519="name,open,prev_close,now,high,low,bid,ask,volume,turnover,...";`
/// 형식입니다. 값이 빈 문자열이면 해당 종목은 결과에서 빠집니다.
pub fn parse_realtime_payload(body: &str) -> HashMap<String, LiveTick> {
    let mut ticks = HashMap::new();

    for line in body.lines() {
        let Some(rest) = line.trim().strip_prefix("var hq_str_") else {
            continue;
        };
        let Some((symbol, value)) = rest.split_once('=') else {
            continue;
        };
        let Some(code) = CanonicalCode::from_sina_symbol(symbol) else {
            continue;
        };

        let content = value.trim().trim_end_matches(';').trim_matches('"');
        if content.is_empty() {
            debug!(symbol, "실시간 시세 없음");
            continue;
        }

        match parse_realtime_fields(content) {
            Ok(tick) => {
                ticks.insert(code.to_string(), tick);
            }
            Err(e) => warn!(symbol, error = %e, "실시간 레코드 건너뜀"),
        }
    }

    ticks
}

fn parse_realtime_fields(content: &str) -> Result<LiveTick> {
    let fields: Vec<&str> = content.split(',').collect();
    if fields.len() < MIN_REALTIME_FIELDS {
        return Err(DataError::MalformedRecord(format!(
            "필드 수 부족: {}개",
            fields.len()
        )));
    }

    let num = |idx: usize| -> Result<Decimal> {
        fields[idx].trim().parse().map_err(|_| {
            DataError::MalformedRecord(format!("숫자 아님 [{}]: {}", idx, fields[idx]))
        })
    };

    Ok(LiveTick {
        name: fields[0].trim().to_string(),
        open: num(1)?,
        prior_close: num(2)?,
        now: num(3)?,
        high: num(4)?,
        low: num(5)?,
        volume: num(8)?,
        turnover: num(9)?,
    })
}

// ==================== 종목 목록 ====================

/// Sina 沪深 A주 종목 목록 클라이언트.
#[derive(Clone)]
pub struct SinaDirectoryClient {
    client: reqwest::Client,
    page_size: usize,
}

impl SinaDirectoryClient {
    /// 새 클라이언트 생성.
    ///
    /// `timeout`은 페이지 요청 하나에 적용됩니다.
    pub fn new(timeout: Duration, page_size: usize) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            page_size: page_size.max(1),
        })
    }

    async fn fetch_page(&self, page: u32) -> Result<String> {
        let page = page.to_string();
        let num = self.page_size.to_string();

        let body = self
            .client
            .get(NODE_URL)
            .query(&[
                ("page", page.as_str()),
                ("num", num.as_str()),
                ("sort", "symbol"),
                ("asc", "1"),
                ("node", A_SHARE_NODE),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(body)
    }
}

#[async_trait]
impl DirectorySource for SinaDirectoryClient {
    fn name(&self) -> &str {
        "sina"
    }

    async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>> {
        let mut instruments = Vec::new();

        for page in 1..=MAX_NODE_PAGES {
            let body = self.fetch_page(page).await?;
            let parsed = parse_node_payload(&body)?;
            let rows = parsed.rows;
            instruments.extend(parsed.instruments);

            debug!(page, rows, total = instruments.len(), "Sina 종목 목록 페이지 수신");

            if rows < self.page_size {
                break;
            }
        }

        info!(count = instruments.len(), "Sina 종목 목록 조회 완료");
        Ok(instruments)
    }
}

/// 종목 목록 페이지 파싱 결과.
#[derive(Debug, Default)]
pub struct NodePage {
    /// 응답에 포함된 행 수 (필터 전)
    pub rows: usize,
    /// 필터를 통과한 종목
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
struct SinaNodeRow {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
}

/// `getHQNodeData` 응답 한 페이지를 파싱합니다.
///
/// `sh6`, `sz0`, `sz3`, `sz2`로 시작하는 심볼만 남깁니다.
/// 마지막 페이지 이후에는 `null` 또는 `[]`가 옵니다.
pub fn parse_node_payload(body: &str) -> Result<NodePage> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(NodePage::default());
    }

    let rows: Option<Vec<SinaNodeRow>> = serde_json::from_str(body)
        .map_err(|e| DataError::DirectorySource(format!("종목 목록 파싱 실패: {}", e)))?;
    let rows = rows.unwrap_or_default();

    let instruments = rows
        .iter()
        .filter(|r| KEEP_SYMBOL_PREFIXES.iter().any(|p| r.symbol.starts_with(p)))
        .filter_map(|r| {
            let code = CanonicalCode::from_sina_symbol(&r.symbol)?;
            let name = r.name.trim();
            (!name.is_empty()).then(|| Instrument::new(&code, name))
        })
        .collect();

    Ok(NodePage {
        rows: rows.len(),
        instruments,
    })
}
