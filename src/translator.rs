//! 翻译服务模块
//!
//! 定义可替换的翻译接口 [`Translator`]，并提供基于DeepLX兼容JSON接口的HTTP实现。

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, warn};

// 本地模块导入
use crate::api_constants::{api_config, service_config};
use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::translation_error;

/// 翻译接口
///
/// 输入一段原文，返回译文；任何失败都以错误返回
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// HTTP翻译服务
///
/// 向配置的API地址POST `{"text", "source_lang", "target_lang"}`，
/// 支持DeepLX风格的 `{"code": 200, "data": ...}` 响应以及常见的其他字段名和纯文本响应。
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: Client,
    config: TranslatorConfig,
}

impl HttpTranslator {
    /// 创建HTTP翻译服务
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .user_agent(api_config::DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| translation_error!(config, "http_client", format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 发送一次翻译请求
    async fn request_once(&self, text: &str) -> Result<String> {
        let api_url = self.config.api_url();

        let response = self
            .client
            .post(api_url)
            .json(&json!({
                "text": text,
                "source_lang": self.config.source_lang(),
                "target_lang": self.config.target_lang(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "无法读取错误信息".to_string());
            return Err(translation_error!(translation_api, status.as_u16(), error_text, api_url));
        }

        let body = response.text().await?;
        parse_response_body(&body, api_url)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let max_retries = self.config.max_retries();
        let mut delay = service_config::RETRY_INITIAL_DELAY_MS;
        let mut attempt = 0;

        loop {
            match self.request_once(text).await {
                Ok(translated) => {
                    debug!("翻译完成: {} 字符 -> {} 字符", text.len(), translated.len());
                    return Ok(translated);
                }
                Err(e) if attempt >= max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    warn!("第 {} 次翻译请求失败: {}，{}ms后重试", attempt, e, delay);
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(service_config::RETRY_MAX_DELAY_MS);
                }
            }
        }
    }
}

/// 从响应体中提取译文
///
/// 依次尝试：DeepLX信封（`code` 非200视为失败）、`data` / `text` / `result` /
/// `translation` / `translated_text` 字段、纯文本。译文开头的换行会被去掉。
pub fn parse_response_body(body: &str, api_url: &str) -> Result<String> {
    if body.trim().is_empty() {
        return Err(translation_error!(translation_api, 200, "API返回了空的翻译结果", api_url));
    }

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(_) => return Ok(body.trim_start_matches('\n').to_string()),
    };

    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != 200 {
            let status = u16::try_from(code).unwrap_or(500);
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("翻译失败");
            return Err(translation_error!(translation_api, status, message, api_url));
        }
    }

    let translated = ["data", "text", "result", "translation", "translated_text"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .or_else(|| value.as_str());

    match translated {
        Some(text) if !text.trim().is_empty() => Ok(text.trim_start_matches('\n').to_string()),
        Some(_) => Err(translation_error!(translation_api, 200, "API返回了空的翻译结果", api_url)),
        None => Err(translation_error!(
            translation_api,
            200,
            format!("无法从JSON响应中提取翻译结果: {}", body),
            api_url
        )),
    }
}
