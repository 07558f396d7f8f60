//! 종목 코드 및 거래소 정의.
//!
//! 이 모듈은 A주 종목 코드 관련 타입을 정의합니다:
//! - `Exchange` - 상하이(SH) / 선전(SZ) 거래소
//! - `CanonicalCode` - 거래소 접미사가 붙은 표준 코드 (예: `600519.SH`)
//!
//! 6자리 단축코드에서 거래소를 추론하는 접두사 규칙표도 이곳에 있습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StockError;

/// 상하이 거래소로 분류되는 단축코드 접두사.
const SH_PREFIXES: &[&str] = &["60", "68", "90"];

/// 선전 거래소로 분류되는 단축코드 접두사.
const SZ_PREFIXES: &[&str] = &["00", "30", "20"];

/// 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// 상하이 증권거래소
    Sh,
    /// 선전 증권거래소
    Sz,
}

impl Exchange {
    /// 표준 코드 접미사 (`SH`, `SZ`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Sh => "SH",
            Exchange::Sz => "SZ",
        }
    }

    /// Sina 시세 심볼 접두사 (`sh`, `sz`).
    pub fn sina_prefix(&self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
        }
    }

    /// 단축코드 접두사로 거래소를 추론합니다.
    ///
    /// 규칙표에 없는 접두사는 `None`을 반환합니다.
    pub fn infer(short_code: &str) -> Option<Self> {
        if SH_PREFIXES.iter().any(|p| short_code.starts_with(p)) {
            Some(Exchange::Sh)
        } else if SZ_PREFIXES.iter().any(|p| short_code.starts_with(p)) {
            Some(Exchange::Sz)
        } else {
            None
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Exchange {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SH" => Ok(Exchange::Sh),
            "SZ" => Ok(Exchange::Sz),
            _ => Err(StockError::InvalidInput(format!("알 수 없는 거래소: {}", s))),
        }
    }
}

/// 6자리 ASCII 숫자인지 확인합니다.
pub fn is_short_code(input: &str) -> bool {
    input.len() == 6 && input.bytes().all(|b| b.is_ascii_digit())
}

/// 거래소 접미사가 붙은 표준 종목 코드.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalCode {
    /// 6자리 단축코드
    pub short_code: String,
    /// 거래소
    pub exchange: Exchange,
}

impl CanonicalCode {
    /// 새 표준 코드를 생성합니다.
    pub fn new(short_code: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            short_code: short_code.into(),
            exchange,
        }
    }

    /// 단축코드 접두사 규칙으로 표준 코드를 합성합니다.
    ///
    /// 종목 존재 여부는 확인하지 않습니다.
    pub fn synthesize(short_code: &str) -> Option<Self> {
        if !is_short_code(short_code) {
            return None;
        }
        Exchange::infer(short_code).map(|exchange| Self::new(short_code, exchange))
    }

    /// `600519.SH` 형식 문자열을 파싱합니다.
    pub fn parse(s: &str) -> Result<Self, StockError> {
        let (code, suffix) = s
            .split_once('.')
            .ok_or_else(|| StockError::InvalidInput(format!("거래소 접미사 없음: {}", s)))?;
        if !is_short_code(code) {
            return Err(StockError::InvalidInput(format!("6자리 코드가 아님: {}", s)));
        }
        Ok(Self::new(code, suffix.parse()?))
    }

    /// Sina 심볼(`sh600519`)에서 표준 코드를 만듭니다.
    pub fn from_sina_symbol(symbol: &str) -> Option<Self> {
        let prefix = symbol.get(..2)?;
        let code = symbol.get(2..)?;
        let exchange = match prefix {
            "sh" => Exchange::Sh,
            "sz" => Exchange::Sz,
            _ => return None,
        };
        is_short_code(code).then(|| Self::new(code, exchange))
    }

    /// Sina 심볼 형식(`sh600519`)으로 변환합니다.
    pub fn to_sina_symbol(&self) -> String {
        format!("{}{}", self.exchange.sina_prefix(), self.short_code)
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.short_code, self.exchange.suffix())
    }
}

impl FromStr for CanonicalCode {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
