//! 시세 조회 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 종목 해석 및 검색
//! - 시세 및 일봉 차트 조회
//! - 종목 디렉토리 수동 갱신
//! - 상태 점검

pub mod commands;
