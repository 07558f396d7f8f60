//! 종목(Instrument) 정의.
//!
//! 종목 디렉토리에 담기는 레코드와 그 분류 타입을 정의합니다:
//! - `Instrument` - 표준 코드, 단축코드, 종목명, 시장 구분
//! - `MarketSegment` - 沪A / 沪B / 深A / 深B
//! - `Board` - 주판 / 과창판 / 중소판 / 창업판 / B주

use serde::{Deserialize, Serialize};
use std::fmt;

use super::code::{CanonicalCode, Exchange};

/// 시장 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSegment {
    /// 상하이 A주
    #[serde(rename = "沪A")]
    ShA,
    /// 상하이 B주
    #[serde(rename = "沪B")]
    ShB,
    /// 선전 A주
    #[serde(rename = "深A")]
    SzA,
    /// 선전 B주
    #[serde(rename = "深B")]
    SzB,
}

impl MarketSegment {
    /// 거래소와 단축코드로 시장 구분을 결정합니다.
    pub fn classify(exchange: Exchange, short_code: &str) -> Self {
        let b_share = Board::classify(short_code) == Board::BShare;
        match (exchange, b_share) {
            (Exchange::Sh, false) => MarketSegment::ShA,
            (Exchange::Sh, true) => MarketSegment::ShB,
            (Exchange::Sz, false) => MarketSegment::SzA,
            (Exchange::Sz, true) => MarketSegment::SzB,
        }
    }
}

impl fmt::Display for MarketSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSegment::ShA => write!(f, "沪A"),
            MarketSegment::ShB => write!(f, "沪B"),
            MarketSegment::SzA => write!(f, "深A"),
            MarketSegment::SzB => write!(f, "深B"),
        }
    }
}

/// 상장 보드 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    /// 주판 (60xxxx, 00xxxx)
    Main,
    /// 과창판 (688xxx)
    Star,
    /// 중소판 (002xxx)
    Sme,
    /// 창업판 (30xxxx)
    ChiNext,
    /// B주 (900xxx, 200xxx)
    BShare,
    /// 미분류
    Unclassified,
}

impl Board {
    /// 단축코드 접두사로 보드를 분류합니다.
    ///
    /// 더 긴 접두사(`688`, `002`, `900`, `200`)를 먼저 검사합니다.
    pub fn classify(short_code: &str) -> Self {
        if short_code.starts_with("688") {
            Board::Star
        } else if short_code.starts_with("002") {
            Board::Sme
        } else if short_code.starts_with("900") || short_code.starts_with("200") {
            Board::BShare
        } else if short_code.starts_with("60") || short_code.starts_with("00") {
            Board::Main
        } else if short_code.starts_with("30") {
            Board::ChiNext
        } else {
            Board::Unclassified
        }
    }

    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Board::Main => "主板",
            Board::Star => "科创板",
            Board::Sme => "中小板",
            Board::ChiNext => "创业板",
            Board::BShare => "B股",
            Board::Unclassified => "未分类",
        }
    }
}

/// 종목 디렉토리의 단일 종목.
///
/// 디렉토리 갱신 시 통째로 교체되며, 제자리에서 수정되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 표준 코드 (예: 600519.SH)
    pub canonical_code: String,
    /// 6자리 단축코드 (예: 600519)
    pub short_code: String,
    /// 종목명 (예: 贵州茅台)
    pub display_name: String,
    /// 시장 구분
    pub market_segment: MarketSegment,
    /// 상장 보드
    pub board: Board,
    /// 업종 (알려진 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

impl Instrument {
    /// 표준 코드와 종목명으로 종목을 생성합니다.
    ///
    /// 시장 구분과 보드는 코드에서 파생됩니다.
    pub fn new(code: &CanonicalCode, display_name: impl Into<String>) -> Self {
        Self {
            canonical_code: code.to_string(),
            short_code: code.short_code.clone(),
            display_name: display_name.into(),
            market_segment: MarketSegment::classify(code.exchange, &code.short_code),
            board: Board::classify(&code.short_code),
            industry: None,
        }
    }

    /// 업종을 설정합니다.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }
}
