//! 시세 조회를 위한 도메인 모델.

mod bar;
mod quote;
mod session;

pub use bar::*;
pub use quote::*;
pub use session::*;
