//! 검색 쿼리와 HTTP 클라이언트

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use hyperlook_core::config::SearchConfig;

use crate::error::AnalyzerError;

/// 검색 쿼리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// `query_string` 본문
    pub query: String,
    /// `kubernetes.namespace_name` 필터
    pub namespace: String,
    /// `kubernetes.container_name` 필터
    pub container: String,
    /// 최대 hit 수
    pub size: usize,
}

impl SearchQuery {
    /// 설정에서 쿼리를 만듭니다.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            query: config.query.clone(),
            namespace: config.namespace.clone(),
            container: config.container.clone(),
            size: config.size,
        }
    }

    /// 요청 본문 JSON
    ///
    /// `@timestamp` 내림차순 정렬이라 각 hit의 `sort[0]`이 epoch 밀리초가 됩니다.
    pub fn to_json(&self) -> Value {
        json!({
            "size": self.size,
            "sort": [{ "@timestamp": "desc" }],
            "query": {
                "bool": {
                    "must": [
                        { "query_string": { "query": self.query } },
                        { "match_phrase": { "kubernetes.namespace_name": self.namespace } },
                        { "match_phrase": { "kubernetes.container_name": self.container } }
                    ]
                }
            }
        })
    }
}

/// 검색 백엔드 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    url: String,
    query: SearchQuery,
}

impl SearchClient {
    /// 클라이언트를 생성합니다.
    ///
    /// # Errors
    /// `timeout`이 0이면 [`AnalyzerError::Config`], TLS 백엔드 초기화 실패 시 [`AnalyzerError::Http`].
    pub fn new(
        url: impl Into<String>,
        query: SearchQuery,
        timeout: Duration,
    ) -> Result<Self, AnalyzerError> {
        if timeout.is_zero() {
            return Err(AnalyzerError::Config {
                field: "search.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            query,
        })
    }

    /// `[search]` 설정 섹션에서 클라이언트를 생성합니다.
    pub fn from_config(config: &SearchConfig) -> Result<Self, AnalyzerError> {
        Self::new(
            config.url.clone(),
            SearchQuery::from_config(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// 요청 URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 사용 중인 쿼리
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// 쿼리를 한 번 실행하고 응답 본문을 그대로 반환합니다.
    ///
    /// # Errors
    /// 전송 실패는 [`AnalyzerError::Http`], 2xx가 아닌 상태 코드는 [`AnalyzerError::Search`].
    pub async fn fetch(&self) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.query.to_json())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Search {
                url: self.url.clone(),
                reason: format!("unexpected status {status}"),
            });
        }

        let body = response.text().await?;
        debug!(url = %self.url, bytes = body.len(), "search response received");
        Ok(body)
    }
}
