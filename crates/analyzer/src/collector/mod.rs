//! 검색 백엔드 수집기 -- 피어 로그를 한 번에 한 배치씩 가져옵니다.
//!
//! # 구성
//! - [`SearchQuery`]: 네임스페이스/컨테이너로 좁힌 bool 쿼리, 최신순 정렬
//! - [`SearchClient`]: `reqwest` 기반 HTTP 클라이언트 (재시도 없음)
//!
//! 응답 본문은 [`parser::decode_hits`](crate::parser::decode_hits)로 넘깁니다.

pub mod search;

pub use search::{SearchClient, SearchQuery};
