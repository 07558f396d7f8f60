//! 시세 계산을 위한 Decimal 유틸리티.
//!
//! 가격과 변동률은 모두 `Decimal`로 다루며, 표시용 반올림은
//! 소수점 2자리, 0.5는 0에서 먼 쪽으로 올림(MidpointAwayFromZero)으로 통일합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 가격 타입.
pub type Price = Decimal;

/// 거래량 타입.
pub type Volume = Decimal;

/// 퍼센트 타입 (9.09 = 9.09%).
pub type Percentage = Decimal;

/// 표시용 소수점 자릿수.
pub const DISPLAY_DP: u32 = 2;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 양수인지 확인합니다.
    fn is_strictly_positive(&self) -> bool;

    /// 표시용 자릿수로 반올림합니다 (half away from zero).
    fn round_display(&self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn is_strictly_positive(&self) -> bool {
        *self > Decimal::ZERO
    }

    fn round_display(&self) -> Decimal {
        self.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// `base` 대비 `current`의 변동률(%)을 반올림 없이 계산합니다.
///
/// 기준가가 0 이하이면 `None`.
pub fn percent_change(current: Price, base: Price) -> Option<Percentage> {
    if !base.is_strictly_positive() {
        return None;
    }
    Some((current - base) / base * Decimal::ONE_HUNDRED)
}
