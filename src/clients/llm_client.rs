/// LLM API 客户端
///
/// 调用 OpenAI 兼容的 `/chat/completions` 接口。
/// 请求体由 `async-openai` 的类型构建；响应按原始 JSON 解析，
/// 以便兼容把答案放在 `reasoning_content` / `reasoning` 里的思考模型。
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::clients::ChatBackend;
use crate::config::RemoteSettings;
use crate::error::{AppError, AppResult, RemoteError};

/// 响应中提取回复文本的方式，按顺序尝试
type ContentExtractor = fn(&Value) -> Option<String>;

const CONTENT_EXTRACTORS: &[ContentExtractor] = &[from_content, from_reasoning_content, from_reasoning];

/// LLM 客户端
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    completions_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(settings: &RemoteSettings) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::request_failed(&settings.base_url, e))?;

        Ok(Self {
            http,
            completions_url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key: settings.api_key.clone(),
        })
    }

    /// 构建只包含一条用户消息的请求
    fn build_request(&self, prompt: &str) -> AppResult<CreateChatCompletionRequest> {
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| RemoteError::BuildRequest(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(self.temperature)
            .build()
            .map_err(|e| RemoteError::BuildRequest(e.to_string()))?;

        Ok(request)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model);
        debug!("用户消息长度: {} 字符", prompt.chars().count());

        let request = self.build_request(prompt)?;

        let mut builder = self.http.post(&self.completions_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::request_failed(&self.completions_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Remote(RemoteError::BadStatus {
                endpoint: self.completions_url.clone(),
                status: status.as_u16(),
            }));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::malformed(&self.completions_url, e.to_string()))?;

        let content = extract_content(&body)
            .ok_or_else(|| AppError::malformed(&self.completions_url, "LLM 返回内容为空"))?;

        debug!("LLM API 调用成功");
        Ok(content.trim().to_string())
    }
}

/// 从 `choices[0].message` 中依次尝试各个字段
pub fn extract_content(body: &Value) -> Option<String> {
    let message = body.get("choices")?.as_array()?.first()?.get("message")?;
    CONTENT_EXTRACTORS.iter().find_map(|extract| extract(message))
}

fn from_content(message: &Value) -> Option<String> {
    message_field(message, "content")
}

fn from_reasoning_content(message: &Value) -> Option<String> {
    message_field(message, "reasoning_content")
}

fn from_reasoning(message: &Value) -> Option<String> {
    message_field(message, "reasoning")
}

fn message_field(message: &Value, field: &str) -> Option<String> {
    message
        .get(field)?
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}
