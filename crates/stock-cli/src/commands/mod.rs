//! CLI 명령어 구현 모듈.

pub mod directory;
pub mod health;
pub mod quote;

use anyhow::{Context, Result};
use serde::Serialize;

/// 결과를 보기 좋은 JSON 문자열로 변환합니다.
pub fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON 직렬화 실패")
}

/// 결과를 JSON으로 표준 출력에 씁니다.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render(value)?);
    Ok(())
}
