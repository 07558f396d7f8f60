//! # Stock Core
//!
//! 시세 조회 엔진의 핵심 도메인 모델 및 타입을 제공합니다:
//! - 종목 코드, 거래소, 시장 구분
//! - 일봉 및 시세(Quote) 구조체
//! - 거래 세션 판별
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
