//! 검색 응답 파싱 -- 응답 본문을 [`LogRecord`](hyperlook_core::types::LogRecord) 배치로 변환
//!
//! 검색 백엔드는 로그 라인 안에 제어 문자를 그대로 돌려주는 경우가 있어
//! JSON 디코딩 전에 [`strip_control_chars`]로 제거합니다.
//!
//! # 사용 예시
//! ```ignore
//! use hyperlook_analyzer::parser::decode_hits;
//!
//! let batch = decode_hits(&body)?;
//! ```

pub mod hits;

pub use hits::{Hit, HitSource, Hits, KubernetesMeta, SearchResponse, decode_hits};

use std::borrow::Cow;

/// JSON 문자열 안에서 허용되지 않는 제어 문자인지 확인합니다.
///
/// 탭(`\t`), 개행(`\n`), 캐리지 리턴(`\r`)은 JSON 공백이므로 남겨 둡니다.
fn is_stripped(c: char) -> bool {
    matches!(c, '\u{0}' | '\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}')
}

/// 응답 본문에서 JSON 파싱을 깨뜨리는 제어 문자를 제거합니다.
///
/// 제거할 문자가 없으면 할당 없이 원본을 빌려 반환합니다.
pub fn strip_control_chars(body: &str) -> Cow<'_, str> {
    if body.chars().any(is_stripped) {
        Cow::Owned(body.chars().filter(|c| !is_stripped(*c)).collect())
    } else {
        Cow::Borrowed(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_body_is_borrowed() {
        let body = r#"{"hits":{"hits":[]}}"#;
        assert!(matches!(strip_control_chars(body), Cow::Borrowed(_)));
    }

    #[test]
    fn removes_control_characters() {
        let body = "a\u{0}b\u{8}c\u{B}d\u{C}e\u{1B}f\u{1F}g";
        assert_eq!(strip_control_chars(body), "abcdefg");
    }

    #[test]
    fn keeps_json_whitespace() {
        let body = "{\n\t\"a\": 1\r\n}";
        assert_eq!(strip_control_chars(body), body);
    }

    #[test]
    fn keeps_non_ascii_text() {
        let body = "채널 참여 완료 ✓";
        assert_eq!(strip_control_chars(body), body);
    }
}
