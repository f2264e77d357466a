//! 도메인 타입 -- 수집기와 분석기가 공유하는 로그 레코드
//!
//! 검색 백엔드에서 가져온 로그 한 줄을 [`LogRecord`]로 표현합니다.
//! 분석기는 레코드를 읽기만 하며 소유권은 호출자에게 있습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 로그 레코드
///
/// 배치는 `sequence` 내림차순(최신 → 과거)으로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 로그를 출력한 컨테이너 이름
    pub container: String,
    /// 원본 로그 라인
    pub line: String,
    /// 단조 증가 정렬 키 (밀리초 단위 타임스탬프, 클수록 최신)
    pub sequence: u64,
}

impl LogRecord {
    /// 새 레코드를 생성합니다.
    pub fn new(container: impl Into<String>, line: impl Into<String>, sequence: u64) -> Self {
        Self {
            container: container.into(),
            line: line.into(),
            sequence,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}@{}] {}", self.container, self.sequence, self.line)
    }
}
