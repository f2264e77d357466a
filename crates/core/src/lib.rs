//! Hyperlook 공통 크레이트
//!
//! 분석기와 데몬이 공유하는 도메인 타입, 에러, 설정, 메트릭 이름을 제공합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `hyperlook.toml` 파싱 및 환경변수 오버라이드
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: Prometheus 메트릭 이름 및 설명
//! - [`pipeline`]: 데몬이 관리하는 모듈의 생명주기 trait
//! - [`types`]: 로그 레코드

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, HyperlookError, PipelineError};

// 설정
pub use config::HyperlookConfig;

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};

// 도메인 타입
pub use types::LogRecord;
