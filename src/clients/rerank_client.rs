/// Reranker API 客户端
///
/// 调用 `/score` 接口计算两段文本的语义相似度
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::clients::SimilarityBackend;
use crate::config::RemoteSettings;
use crate::error::{AppError, AppResult, RemoteError};

/// 响应中提取分数的方式，按顺序尝试
type ScoreExtractor = fn(&Value) -> Option<f64>;

const SCORE_EXTRACTORS: &[ScoreExtractor] = &[score_from_data_list, score_from_flat_field];

/// 请求体；`text_2` 可以是单个文本或文本列表
#[derive(Debug, Serialize)]
struct ScoreRequest<'a, T: Serialize> {
    model: &'a str,
    encoding_format: &'a str,
    text_1: &'a str,
    text_2: T,
}

/// Reranker 客户端
#[derive(Clone)]
pub struct RerankClient {
    http: Client,
    score_url: String,
    model: String,
    api_key: Option<String>,
}

impl RerankClient {
    /// 创建新的 Reranker 客户端
    pub fn new(settings: &RemoteSettings) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::request_failed(&settings.base_url, e))?;

        Ok(Self {
            http,
            score_url: score_url(&settings.base_url),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn score_url(&self) -> &str {
        &self.score_url
    }

    async fn post<T: Serialize + Send + Sync>(&self, text_1: &str, text_2: T) -> AppResult<Value> {
        let payload = ScoreRequest {
            model: &self.model,
            encoding_format: "float",
            text_1,
            text_2,
        };

        let mut request = self
            .http
            .post(&self.score_url)
            .header("accept", "application/json")
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed(&self.score_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Remote(RemoteError::BadStatus {
                endpoint: self.score_url.clone(),
                status: status.as_u16(),
            }));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::malformed(&self.score_url, e.to_string()))
    }
}

#[async_trait]
impl SimilarityBackend for RerankClient {
    async fn score(&self, text_1: &str, text_2: &str) -> AppResult<f64> {
        let body = self.post(text_1, text_2).await?;
        let score = extract_score(&body)
            .ok_or_else(|| AppError::malformed(&self.score_url, "响应中没有 score"))?;
        debug!("相似度: {:.4}", score);
        Ok(score)
    }

    async fn score_many(&self, query: &str, candidates: &[String]) -> AppResult<Vec<f64>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.post(query, candidates).await?;
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::malformed(&self.score_url, "响应中没有 data 列表"))?;

        // 缺失的条目按 0 分处理
        let mut scores = vec![0.0; candidates.len()];
        for (position, item) in items.iter().enumerate() {
            let index = item
                .get("index")
                .and_then(Value::as_u64)
                .map(|i| i as usize)
                .unwrap_or(position);
            if let (Some(slot), Some(score)) = (
                scores.get_mut(index),
                item.get("score").and_then(Value::as_f64),
            ) {
                *slot = score;
            }
        }
        Ok(scores)
    }
}

/// 由 base_url 得到 `/score` 地址：去掉末尾的 `/v1`
pub fn score_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let root = trimmed.strip_suffix("/v1").unwrap_or(trimmed);
    format!("{}/score", root)
}

/// 依次尝试各种响应格式
pub fn extract_score(body: &Value) -> Option<f64> {
    SCORE_EXTRACTORS.iter().find_map(|extract| extract(body))
}

/// `{"data": [{"score": 0.9}]}`
fn score_from_data_list(body: &Value) -> Option<f64> {
    body.get("data")?
        .as_array()?
        .first()?
        .get("score")?
        .as_f64()
}

/// `{"score": 0.9}`
fn score_from_flat_field(body: &Value) -> Option<f64> {
    body.get("score")?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> RemoteSettings {
        RemoteSettings {
            base_url,
            model: "BAAI/bge-reranker-v2-m3".to_string(),
            api_key: Some("test-key".to_string()),
            temperature: 0.0,
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_score_url_strips_v1() {
        assert_eq!(score_url("http://127.0.0.1:8000"), "http://127.0.0.1:8000/score");
        assert_eq!(score_url("http://host/v1"), "http://host/score");
        assert_eq!(score_url("http://host/v1/"), "http://host/score");
        assert_eq!(score_url("http://host/api/"), "http://host/api/score");
    }

    #[test]
    fn test_extractor_chain() {
        assert_eq!(extract_score(&json!({"data": [{"score": 0.7}]})), Some(0.7));
        assert_eq!(extract_score(&json!({"score": 0.4})), Some(0.4));
        assert_eq!(extract_score(&json!({"data": [], "score": 0.2})), Some(0.2));
        assert_eq!(extract_score(&json!({"result": 1})), None);
    }

    #[tokio::test]
    async fn test_score_sends_payload_and_parses_data_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "BAAI/bge-reranker-v2-m3",
                "encoding_format": "float",
                "text_1": "水",
                "text_2": "вода"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "score": 0.93}]
            })))
            .mount(&server)
            .await;

        let client = RerankClient::new(&settings(format!("{}/v1", server.uri()))).unwrap();
        let score = client.score("水", "вода").await.unwrap();
        assert!((score - 0.93).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_bad_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = RerankClient::new(&settings(server.uri())).unwrap();
        let err = client.score("a", "b").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Remote(RemoteError::BadStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"score": 1.0}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut slow = settings(server.uri());
        slow.timeout = Duration::from_millis(200);
        let client = RerankClient::new(&slow).unwrap();
        assert!(client.score("a", "b").await.unwrap_err().is_remote());
    }

    #[tokio::test]
    async fn test_score_many_maps_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 1, "score": 0.99}, {"index": 0, "score": 0.1}]
            })))
            .mount(&server)
            .await;

        let client = RerankClient::new(&settings(server.uri())).unwrap();
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scores = client.score_many("q", &candidates).await.unwrap();
        assert_eq!(scores, vec![0.1, 0.99, 0.0]);
    }
}
