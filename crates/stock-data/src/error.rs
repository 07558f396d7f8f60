//! 데이터 모듈 오류 타입.

use stock_core::StockError;
use thiserror::Error;

/// 데이터 관련 오류.
///
/// 업스트림 오류는 사용 지점에서 이 타입으로 변환되며, 호출자에게는
/// 결과 없음(`None`) 또는 이 값으로만 전달됩니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 종목 디렉토리 소스가 실패했거나 빈 목록을 반환
    #[error("Directory source error: {0}")]
    DirectorySource(String),

    /// 실시간 시세를 사용할 수 없음 (과거 일봉으로 대체)
    #[error("Live quote unavailable: {0}")]
    LiveQuoteUnavailable(String),

    /// 일봉 소스 오류
    #[error("Historical source error: {0}")]
    HistoricalSource(String),

    /// 잘못된 업스트림 레코드
    #[error("Malformed upstream record: {0}")]
    MalformedRecord(String),

    /// 타임아웃 오류
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// 데이터 가져오기 오류 (HTTP)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(String),

    /// 설정/입력 오류
    #[error(transparent)]
    Core(#[from] StockError),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::DirectorySource("empty list".to_string());
        assert_eq!(err.to_string(), "Directory source error: empty list");

        let err: DataError = StockError::InvalidInput("x".to_string()).into();
        assert!(matches!(err, DataError::Core(_)));
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err: DataError = parse_err.into();
        assert!(matches!(err, DataError::SerializationError(_)));
    }
}
