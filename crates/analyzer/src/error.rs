//! 분석기 에러 타입
//!
//! [`AnalyzerError`]는 검색, 디코딩, 마커 패턴 컴파일 등 분석기 내부에서
//! 발생하는 모든 에러를 표현합니다. `From<AnalyzerError> for HyperlookError`
//! 변환이 구현되어 있어 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.
//!
//! 분류 결과가 없는 윈도우(미인식 시그니처, 중복, 종료 없는 윈도우)는
//! 에러가 아니라 정상 결과이므로 여기에 포함되지 않습니다.

use hyperlook_core::error::{HyperlookError, PipelineError};

/// 분석기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// 마커 패턴 컴파일 실패 (시작 시점에만 발생)
    #[error("marker pattern error: {marker}: {source}")]
    Pattern {
        /// 문제가 된 마커 이름
        marker: String,
        /// 정규식 에러
        #[source]
        source: regex::Error,
    },

    /// 검색 백엔드 응답 실패 (비정상 상태 코드 등)
    #[error("search error: {url}: {reason}")]
    Search {
        /// 요청 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// HTTP 전송 에러
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// 검색 응답 디코딩 실패
    #[error("decode error at line {line}, column {column}: {reason}")]
    Decode {
        /// 실패 위치 (행)
        line: usize,
        /// 실패 위치 (열)
        column: usize,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<AnalyzerError> for HyperlookError {
    fn from(err: AnalyzerError) -> Self {
        HyperlookError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
