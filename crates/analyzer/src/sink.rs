//! 메트릭 싱크 -- 분류된 제안 처리 시간을 게이지로 기록합니다.
//!
//! 분석기는 전역 게이지에 직접 쓰지 않고 [`MetricsSink`]를 주입받습니다.
//! 운영 환경에서는 [`GaugeSink`]가 `metrics` 레코더(Prometheus exporter)에 기록합니다.

use hyperlook_core::metrics::LABEL_CONTAINER;

use crate::analysis::Classification;

/// 분류 결과를 받는 싱크
///
/// 여러 분석기가 동시에 기록할 수 있도록 `&self`로 동작해야 합니다.
pub trait MetricsSink: Send + Sync {
    /// `(classification, container)` 게이지를 `seconds`로 설정합니다.
    fn set_gauge(&self, classification: Classification, container: &str, seconds: f64);
}

/// `metrics` 레코더에 기록하는 싱크
#[derive(Debug, Clone, Copy, Default)]
pub struct GaugeSink;

impl MetricsSink for GaugeSink {
    fn set_gauge(&self, classification: Classification, container: &str, seconds: f64) {
        metrics::gauge!(
            classification.metric_name(),
            LABEL_CONTAINER => container.to_owned()
        )
        .set(seconds);
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &S {
    fn set_gauge(&self, classification: Classification, container: &str, seconds: f64) {
        (**self).set_gauge(classification, container, seconds);
    }
}
