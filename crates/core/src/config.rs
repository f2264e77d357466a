//! 설정 관리 -- hyperlook.toml 파싱 및 런타임 설정
//!
//! [`HyperlookConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`HYPERLOOK_SEARCH_NAMESPACE=fabric-net` 형식)
//! 3. 설정 파일 (`hyperlook.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), hyperlook_core::error::HyperlookError> {
//! use hyperlook_core::config::HyperlookConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HyperlookConfig::load("hyperlook.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HyperlookConfig::parse("[poller]\ninterval_secs = 30")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HyperlookError};

/// 피어 로그 검색 기본 쿼리
///
/// 제안 경계(Entry/Exit)와 시스템 체인코드 호출, Dockerfile 생성 로그만 가져옵니다.
pub const DEFAULT_SEARCH_QUERY: &str =
    "(\"ProcessProposal -> DEBU \" AND (Entry OR Exit)) OR NewCCCC OR generateDockerfile";

/// Hyperlook 통합 설정
///
/// `hyperlook.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HyperlookConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 검색 백엔드 설정
    #[serde(default)]
    pub search: SearchConfig,
    /// 폴링 설정
    #[serde(default)]
    pub poller: PollerConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl HyperlookConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HyperlookError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    ///
    /// 검증은 하지 않습니다. 오버라이드를 모두 적용한 뒤 [`validate`](Self::validate)를 호출하세요.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HyperlookError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HyperlookError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HyperlookError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HyperlookError> {
        toml::from_str(toml_str).map_err(|e| {
            HyperlookError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HYPERLOOK_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HYPERLOOK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HYPERLOOK_GENERAL_LOG_FORMAT");

        // Search
        override_string(&mut self.search.url, "HYPERLOOK_SEARCH_URL");
        override_string(&mut self.search.namespace, "HYPERLOOK_SEARCH_NAMESPACE");
        override_string(&mut self.search.container, "HYPERLOOK_SEARCH_CONTAINER");
        override_string(&mut self.search.query, "HYPERLOOK_SEARCH_QUERY");
        override_usize(&mut self.search.size, "HYPERLOOK_SEARCH_SIZE");
        override_u64(
            &mut self.search.timeout_secs,
            "HYPERLOOK_SEARCH_TIMEOUT_SECS",
        );

        // Poller
        override_u64(
            &mut self.poller.interval_secs,
            "HYPERLOOK_POLLER_INTERVAL_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "HYPERLOOK_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "HYPERLOOK_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "HYPERLOOK_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "HYPERLOOK_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HyperlookError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if !(self.search.url.starts_with("http://") || self.search.url.starts_with("https://")) {
            return Err(invalid(
                "search.url",
                format!("'{}' must start with http:// or https://", self.search.url),
            ));
        }

        if self.search.namespace.trim().is_empty() {
            return Err(invalid("search.namespace", "must not be empty"));
        }

        if self.search.container.trim().is_empty() {
            return Err(invalid("search.container", "must not be empty"));
        }

        if self.search.query.trim().is_empty() {
            return Err(invalid("search.query", "must not be empty"));
        }

        if self.search.size == 0 {
            return Err(invalid("search.size", "must be greater than 0"));
        }

        if self.search.timeout_secs == 0 {
            return Err(invalid("search.timeout_secs", "must be greater than 0"));
        }

        if self.poller.interval_secs == 0 {
            return Err(invalid("poller.interval_secs", "must be greater than 0"));
        }

        if self.metrics.enabled && !self.metrics.endpoint.starts_with('/') {
            return Err(invalid("metrics.endpoint", "must start with '/'"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> HyperlookError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 검색 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 검색 엔드포인트 URL
    pub url: String,
    /// 피어가 배포된 Kubernetes 네임스페이스
    pub namespace: String,
    /// 로그를 가져올 컨테이너 이름
    pub container: String,
    /// `query_string` 쿼리
    pub query: String,
    /// 한 번에 가져올 최대 히트 수
    pub size: usize,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_owned(),
            namespace: "fabric-net".to_owned(),
            container: "peer0-org1".to_owned(),
            query: DEFAULT_SEARCH_QUERY.to_owned(),
            size: 1000,
            timeout_secs: 10,
        }
    }
}

/// 폴링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// 폴링 주기 (초)
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Prometheus 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "0.0.0.0".to_owned(),
            port: 8080,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
