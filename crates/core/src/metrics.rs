//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 제안 처리 시간 게이지: `peer_<operation>_time_seconds` (스크레이퍼 대시보드 호환)
//! - 자체 관측 메트릭: 접두어 `hyperlook_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::gauge;
//!
//! gauge!(hyperlook_core::metrics::PEER_INVOKE_CHAINCODE_TIME_SECONDS,
//!     hyperlook_core::metrics::LABEL_CONTAINER => "peer0-org1").set(0.06);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 컨테이너 레이블 키
pub const LABEL_CONTAINER: &str = "container";

/// 분류 레이블 키 (join_channel, install_chaincode, ...)
pub const LABEL_CLASSIFICATION: &str = "classification";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 드롭 사유 레이블 키 (unterminated, unrecognized, duplicate)
pub const LABEL_REASON: &str = "reason";

// ─── 제안 처리 시간 게이지 (label: container) ────────────────────────

/// 채널 참여 제안 처리 시간 (gauge, 초)
pub const PEER_JOIN_CHANNEL_TIME_SECONDS: &str = "peer_join_channel_time_seconds";

/// 체인코드 설치 제안 처리 시간 (gauge, 초)
pub const PEER_INSTALL_CHAINCODE_TIME_SECONDS: &str = "peer_install_chaincode_time_seconds";

/// 체인코드 인스턴스화 제안 처리 시간 (gauge, 초)
pub const PEER_INSTANTIATE_CHAINCODE_TIME_SECONDS: &str =
    "peer_instantiate_chaincode_time_seconds";

/// 체인코드 업그레이드 제안 처리 시간 (gauge, 초)
pub const PEER_UPGRADE_CHAINCODE_TIME_SECONDS: &str = "peer_upgrade_chaincode_time_seconds";

/// 체인코드 invoke 제안 처리 시간 (gauge, 초)
pub const PEER_INVOKE_CHAINCODE_TIME_SECONDS: &str = "peer_invoke_chaincode_time_seconds";

/// 체인코드 query 제안 처리 시간 (gauge, 초)
pub const PEER_QUERY_CHAINCODE_TIME_SECONDS: &str = "peer_query_chaincode_time_seconds";

// ─── Analyzer 메트릭 ────────────────────────────────────────────────

/// Analyzer: 폴링 횟수 (counter, label: result)
pub const ANALYZER_POLLS_TOTAL: &str = "hyperlook_polls_total";

/// Analyzer: 분석한 로그 레코드 수 (counter)
pub const ANALYZER_RECORDS_ANALYZED_TOTAL: &str = "hyperlook_records_analyzed_total";

/// Analyzer: 분류된 제안 윈도우 수 (counter, label: classification)
pub const ANALYZER_WINDOWS_CLASSIFIED_TOTAL: &str = "hyperlook_windows_classified_total";

/// Analyzer: 보고 없이 소비된 윈도우 수 (counter, label: reason)
pub const ANALYZER_WINDOWS_DROPPED_TOTAL: &str = "hyperlook_windows_dropped_total";

/// Analyzer: 폴링 1회 소요 시간 (histogram, 초)
pub const ANALYZER_POLL_DURATION_SECONDS: &str = "hyperlook_poll_duration_seconds";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "hyperlook_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "hyperlook_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_gauge!(PEER_JOIN_CHANNEL_TIME_SECONDS, "peer join channel time");
    describe_gauge!(
        PEER_INSTALL_CHAINCODE_TIME_SECONDS,
        "peer install chaincode time"
    );
    describe_gauge!(
        PEER_INSTANTIATE_CHAINCODE_TIME_SECONDS,
        "peer instantiate chaincode time"
    );
    describe_gauge!(
        PEER_UPGRADE_CHAINCODE_TIME_SECONDS,
        "peer upgrade chaincode time"
    );
    describe_gauge!(
        PEER_INVOKE_CHAINCODE_TIME_SECONDS,
        "peer invoke chaincode time"
    );
    describe_gauge!(PEER_QUERY_CHAINCODE_TIME_SECONDS, "peer query chaincode time");

    describe_counter!(
        ANALYZER_POLLS_TOTAL,
        "Total number of search backend polls by result"
    );
    describe_counter!(
        ANALYZER_RECORDS_ANALYZED_TOTAL,
        "Total number of log records folded through the proposal analyzer"
    );
    describe_counter!(
        ANALYZER_WINDOWS_CLASSIFIED_TOTAL,
        "Total number of proposal windows reported per classification"
    );
    describe_counter!(
        ANALYZER_WINDOWS_DROPPED_TOTAL,
        "Total number of proposal windows consumed without a report"
    );
    describe_histogram!(
        ANALYZER_POLL_DURATION_SECONDS,
        "Time to fetch and analyze a single batch in seconds"
    );

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Hyperlook daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
