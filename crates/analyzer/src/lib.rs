//! Hyperlook 분석기
//!
//! 피어 로그에서 제안(proposal) 처리 윈도우를 재구성하고, 윈도우 안의
//! 시스템 체인코드 마커 조합으로 제안 종류를 분류해 처리 시간을 게이지로 기록합니다.
//!
//! # 모듈 구성
//!
//! - [`analysis`]: 마커 매처, 윈도우 추적기, 시그니처 테이블, 배치 분석기
//! - [`sink`]: 분류 결과를 받는 메트릭 싱크
//! - [`collector`]: 검색 백엔드 쿼리와 HTTP 클라이언트
//! - [`parser`]: 검색 응답 디코딩, 제어 문자 제거
//! - [`pipeline`]: 주기적 폴링 (Pipeline trait 구현)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! SearchClient -> decode_hits -> MarkerMatcher -> WindowTracker -> MetricsSink
//!     |               |               |                |
//!  reqwest       serde_json       RegexSet      SIGNATURE_TABLE
//! ```

pub mod analysis;
pub mod collector;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod sink;

// --- 주요 타입 re-export ---

// 분석
pub use analysis::{
    AnalysisReport, Classification, MarkerMatcher, ProposalAnalyzer, ProposalDuration,
    WindowTracker,
};

// 파이프라인
pub use pipeline::{AnalysisPipeline, AnalysisPipelineBuilder, PollStats, poll_once};

// 수집/파싱
pub use collector::{SearchClient, SearchQuery};
pub use parser::decode_hits;

// 싱크
pub use sink::{GaugeSink, MetricsSink};

// 에러
pub use error::AnalyzerError;
