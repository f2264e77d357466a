//! 마커 매처 -- 로그 한 줄에서 의미 마커를 인식합니다.
//!
//! [`MarkerMatcher`]는 고정된 패턴 집합을 시작 시 한 번만 컴파일하고,
//! 이후 [`MarkerMatcher::classify_line`]으로 각 라인을 순수 함수처럼 분류합니다.
//!
//! # 마커
//! - 내용 마커 6개: 채널 범위 시스템 체인코드 호출 5종(cscc, escc, lscc, qscc, vscc)과
//!   `generateDockerfile` 키워드
//! - 경계 마커 2개: `ProcessProposal` 태그의 `Entry`(윈도우 시작) / `Exit`(윈도우 끝)
//!
//! 경계 마커는 하나의 정규식 교대(alternation)로 판정하므로 한 라인에서
//! 시작과 끝이 동시에 보고되는 일은 표현할 수 없습니다.

use std::fmt;

use regex::{Regex, RegexSet};

use crate::error::AnalyzerError;

/// 내용 마커 수 (시그니처 비트 수)
pub const CONTENT_MARKERS: usize = 6;

/// 경계 패턴의 시작 캡처 그룹 이름
const ENTRY_GROUP: &str = "entry";

/// 경계 패턴의 끝 캡처 그룹 이름
const EXIT_GROUP: &str = "exit";

/// 기본 내용 마커 패턴 (슬롯 순서: cscc, escc, lscc, qscc, vscc, generateDockerfile)
pub const DEFAULT_CONTENT_PATTERNS: [&str; CONTENT_MARKERS] = [
    r"chain=[^,].*chaincode=cscc",
    r"chain=[^,].*chaincode=escc",
    r"chain=[^,].*chaincode=lscc",
    r"chain=[^,].*chaincode=qscc",
    r"chain=[^,].*chaincode=vscc",
    r"generateDockerfile",
];

/// 기본 경계 마커 패턴
///
/// 탐욕적 `.*` 때문에 한 라인에 두 한정어가 모두 있으면 마지막 것이 선택됩니다.
pub const DEFAULT_BOUNDARY_PATTERN: &str = r"ProcessProposal.*(?:(?P<entry>Entry)|(?P<exit>Exit))";

/// 마커 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// 설정 시스템 체인코드 (channel join)
    Cscc,
    /// 보증 시스템 체인코드
    Escc,
    /// 라이프사이클 시스템 체인코드 (반복 횟수를 셈)
    Lscc,
    /// 조회 시스템 체인코드
    Qscc,
    /// 검증 시스템 체인코드
    Vscc,
    /// 체인코드 컨테이너 이미지 생성
    GenerateDockerfile,
    /// 제안 처리 시작
    Entry,
    /// 제안 처리 끝
    Exit,
}

impl MarkerKind {
    /// 시그니처 슬롯 순서의 내용 마커
    pub const CONTENT: [MarkerKind; CONTENT_MARKERS] = [
        MarkerKind::Cscc,
        MarkerKind::Escc,
        MarkerKind::Lscc,
        MarkerKind::Qscc,
        MarkerKind::Vscc,
        MarkerKind::GenerateDockerfile,
    ];

    /// 시그니처 슬롯 (경계 마커는 `None`)
    pub fn slot(self) -> Option<usize> {
        match self {
            Self::Cscc => Some(0),
            Self::Escc => Some(1),
            Self::Lscc => Some(2),
            Self::Qscc => Some(3),
            Self::Vscc => Some(4),
            Self::GenerateDockerfile => Some(5),
            Self::Entry | Self::Exit => None,
        }
    }

    /// 반복 매칭을 누적하는 마커인지 여부
    ///
    /// 나머지 내용 마커는 0/1 플래그입니다.
    pub fn is_counter(self) -> bool {
        self == Self::Lscc
    }

    /// 마커 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cscc => "cscc",
            Self::Escc => "escc",
            Self::Lscc => "lscc",
            Self::Qscc => "qscc",
            Self::Vscc => "vscc",
            Self::GenerateDockerfile => "generateDockerfile",
            Self::Entry => "Entry",
            Self::Exit => "Exit",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 윈도우 경계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `Entry` -- 윈도우 시작
    Start,
    /// `Exit` -- 윈도우 끝
    End,
}

impl Boundary {
    /// 대응하는 마커 종류
    pub fn marker(self) -> MarkerKind {
        match self {
            Self::Start => MarkerKind::Entry,
            Self::End => MarkerKind::Exit,
        }
    }
}

/// 한 라인의 매칭 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerHits {
    content: [bool; CONTENT_MARKERS],
    boundary: Option<Boundary>,
}

impl MarkerHits {
    /// 경계 마커 (없으면 `None`)
    pub fn boundary(&self) -> Option<Boundary> {
        self.boundary
    }

    /// 지정한 마커가 매칭되었는지 확인합니다.
    pub fn contains(&self, kind: MarkerKind) -> bool {
        match kind.slot() {
            Some(slot) => self.content[slot],
            None => self.boundary.map(Boundary::marker) == Some(kind),
        }
    }

    /// 매칭된 내용 마커를 슬롯 순서로 반환합니다.
    pub fn content(&self) -> impl Iterator<Item = MarkerKind> + '_ {
        MarkerKind::CONTENT
            .into_iter()
            .zip(self.content)
            .filter_map(|(kind, hit)| hit.then_some(kind))
    }

    /// 아무 마커도 매칭되지 않았는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.boundary.is_none() && !self.content.iter().any(|hit| *hit)
    }
}

/// 마커 패턴 집합
///
/// 기본값은 피어 로그 형식에 맞춘 고정 패턴입니다.
#[derive(Debug, Clone)]
pub struct MarkerPatterns {
    /// 내용 마커 패턴 (슬롯 순서)
    pub content: [String; CONTENT_MARKERS],
    /// 경계 패턴 (`entry`, `exit` 이름 그룹 필요)
    pub boundary: String,
}

impl Default for MarkerPatterns {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT_PATTERNS.map(str::to_owned),
            boundary: DEFAULT_BOUNDARY_PATTERN.to_owned(),
        }
    }
}

/// 마커 매처 -- 컴파일된 패턴 캐시
pub struct MarkerMatcher {
    content: RegexSet,
    boundary: Regex,
}

impl MarkerMatcher {
    /// 기본 패턴으로 매처를 생성합니다.
    pub fn new() -> Result<Self, AnalyzerError> {
        Self::with_patterns(&MarkerPatterns::default())
    }

    /// 지정한 패턴으로 매처를 생성합니다.
    ///
    /// 패턴 하나라도 컴파일에 실패하면 어떤 매처도 만들지 않습니다.
    pub fn with_patterns(patterns: &MarkerPatterns) -> Result<Self, AnalyzerError> {
        // 실패한 마커 이름을 보고하기 위해 개별 컴파일로 먼저 검증
        for (kind, pattern) in MarkerKind::CONTENT.iter().zip(&patterns.content) {
            Regex::new(pattern).map_err(|source| AnalyzerError::Pattern {
                marker: kind.as_str().to_owned(),
                source,
            })?;
        }

        let content =
            RegexSet::new(&patterns.content).map_err(|source| AnalyzerError::Pattern {
                marker: "content".to_owned(),
                source,
            })?;

        let boundary = Regex::new(&patterns.boundary).map_err(|source| AnalyzerError::Pattern {
            marker: "ProcessProposal".to_owned(),
            source,
        })?;

        let names: Vec<&str> = boundary.capture_names().flatten().collect();
        if !names.contains(&ENTRY_GROUP) || !names.contains(&EXIT_GROUP) {
            return Err(AnalyzerError::Config {
                field: "boundary pattern".to_owned(),
                reason: format!(
                    "pattern must define named groups '{ENTRY_GROUP}' and '{EXIT_GROUP}'"
                ),
            });
        }

        Ok(Self { content, boundary })
    }

    /// 라인이 포함한 마커를 반환합니다.
    ///
    /// 아무것도 매칭되지 않으면 빈 결과를 반환하며 실패하지 않습니다.
    pub fn classify_line(&self, line: &str) -> MarkerHits {
        let mut hits = MarkerHits::default();

        if let Some(caps) = self.boundary.captures(line) {
            hits.boundary = if caps.name(ENTRY_GROUP).is_some() {
                Some(Boundary::Start)
            } else if caps.name(EXIT_GROUP).is_some() {
                Some(Boundary::End)
            } else {
                None
            };
        }

        for idx in self.content.matches(line).into_iter() {
            hits.content[idx] = true;
        }

        hits
    }
}
