//! 검색 응답 봉투 -- `hits.hits[]` 디코딩
//!
//! 각 hit는 `_source.log`(로그 라인), `_source.kubernetes.container_name`(컨테이너),
//! `sort[0]`(epoch 밀리초 시퀀스)을 가집니다. 정렬 값이 없는 hit는 윈도우 시간을
//! 계산할 수 없으므로 건너뜁니다.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use hyperlook_core::types::LogRecord;

use super::strip_control_chars;
use crate::error::AnalyzerError;

/// 검색 응답 최상위
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// hit 목록 래퍼
    #[serde(default)]
    pub hits: Hits,
}

/// `hits` 객체
#[derive(Debug, Default, Deserialize)]
pub struct Hits {
    /// 개별 hit (응답 순서 유지)
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// 개별 hit
#[derive(Debug, Default, Deserialize)]
pub struct Hit {
    /// 원본 문서
    #[serde(rename = "_source", default)]
    pub source: HitSource,
    /// 정렬 키
    #[serde(default)]
    pub sort: Vec<Value>,
}

/// hit 원본 문서
#[derive(Debug, Default, Deserialize)]
pub struct HitSource {
    /// 로그 라인
    #[serde(default)]
    pub log: String,
    /// 쿠버네티스 메타데이터
    #[serde(default)]
    pub kubernetes: KubernetesMeta,
}

/// 쿠버네티스 메타데이터 (필요한 필드만)
#[derive(Debug, Default, Deserialize)]
pub struct KubernetesMeta {
    /// 컨테이너 이름
    #[serde(default)]
    pub container_name: String,
}

impl Hit {
    /// `sort[0]`을 시퀀스로 해석합니다.
    ///
    /// 정수 또는 정수 문자열만 허용합니다.
    pub fn sequence(&self) -> Option<u64> {
        match self.sort.first()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn into_record(self) -> Option<LogRecord> {
        let sequence = self.sequence()?;
        Some(LogRecord::new(
            self.source.kubernetes.container_name,
            self.source.log,
            sequence,
        ))
    }
}

/// 응답 본문을 레코드 배치로 디코딩합니다.
///
/// 제어 문자를 먼저 제거한 뒤 파싱하며, hit 순서(최신 → 과거)를 그대로 유지합니다.
///
/// # Errors
/// 본문이 올바른 JSON이 아니면 [`AnalyzerError::Decode`]를 반환합니다.
pub fn decode_hits(body: &str) -> Result<Vec<LogRecord>, AnalyzerError> {
    let sanitized = strip_control_chars(body);
    let response: SearchResponse =
        serde_json::from_str(&sanitized).map_err(|e| AnalyzerError::Decode {
            line: e.line(),
            column: e.column(),
            reason: e.to_string(),
        })?;

    let total = response.hits.hits.len();
    let records: Vec<LogRecord> = response
        .hits
        .hits
        .into_iter()
        .filter_map(Hit::into_record)
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        debug!(skipped, total, "hits without a sort value skipped");
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(container: &str, log: &str, sort: &str) -> String {
        format!(
            r#"{{"_source":{{"log":"{log}","kubernetes":{{"container_name":"{container}","namespace_name":"fabric-net"}}}},"sort":{sort}}}"#
        )
    }

    fn envelope(hits: &[String]) -> String {
        format!(
            r#"{{"took":3,"hits":{{"total":{{"value":{}}},"hits":[{}]}}}}"#,
            hits.len(),
            hits.join(",")
        )
    }

    #[test]
    fn decodes_hits_in_order() {
        let body = envelope(&[
            hit("peer0-org1", "ProcessProposal -> DEBU Exit", "[1700000000100]"),
            hit("peer0-org1", "ProcessProposal -> DEBU Entry", "[1700000000040]"),
        ]);

        let records = decode_hits(&body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].container, "peer0-org1");
        assert_eq!(records[0].line, "ProcessProposal -> DEBU Exit");
        assert_eq!(records[0].sequence, 1_700_000_000_100);
        assert_eq!(records[1].sequence, 1_700_000_000_040);
    }

    #[test]
    fn skips_hits_without_sort() {
        let body = envelope(&[
            hit("p0", "a", "[]"),
            r#"{"_source":{"log":"b","kubernetes":{"container_name":"p0"}}}"#.to_owned(),
            hit("p0", "c", "[42]"),
        ]);

        let records = decode_hits(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, "c");
    }

    #[test]
    fn accepts_string_sort_values() {
        let body = envelope(&[hit("p0", "x", r#"["1234"]"#)]);
        let records = decode_hits(&body).unwrap();
        assert_eq!(records[0].sequence, 1234);
    }

    #[test]
    fn rejects_non_integer_sort_values() {
        let body = envelope(&[
            hit("p0", "neg", "[-5]"),
            hit("p0", "obj", r#"[{"a":1}]"#),
            hit("p0", "word", r#"["soon"]"#),
        ]);
        assert!(decode_hits(&body).unwrap().is_empty());
    }

    #[test]
    fn control_characters_are_removed_before_parsing() {
        let body = envelope(&[hit("p0", "ProcessProposal\u{1B}[36m Exit\u{1B}[0m", "[7]")]);

        let records = decode_hits(&body).unwrap();

        assert_eq!(records[0].line, "ProcessProposal[36m Exit[0m");
    }

    #[test]
    fn empty_envelope_decodes_to_empty_batch() {
        assert!(decode_hits("{}").unwrap().is_empty());
        assert!(decode_hits(r#"{"hits":{"hits":[]}}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = decode_hits("{\"hits\": [").unwrap_err();
        assert!(matches!(err, AnalyzerError::Decode { line: 1, .. }));
    }
}
