//! 시스템 전반에서 사용되는 공통 타입.

mod code;
mod decimal;
mod instrument;

pub use code::*;
pub use decimal::*;
pub use instrument::*;
