//! 基于 reqwest 的生成服务客户端
//!
//! POST {base_url}{generate_path}，JSON 请求体 {"prompt": ...}；客户端级总超时与连接超时来自配置。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::client::{ErrorBody, GenerateRequest, GenerateResponse, GenerationOutcome, SolverBackend};
use crate::config::BackendSection;
use crate::core::SolverError;

/// HTTP 后端：持有复用的 reqwest Client 与解析好的端点
pub struct HttpSolverBackend {
    client: Client,
    base: Url,
    endpoint: Url,
    timeout_secs: u64,
}

impl HttpSolverBackend {
    pub fn new(cfg: &BackendSection) -> Result<Self, SolverError> {
        let base = Url::parse(&cfg.base_url).map_err(|e| {
            SolverError::Config(format!("Invalid backend.base_url {:?}: {}", cfg.base_url, e))
        })?;
        let endpoint = Url::parse(&cfg.endpoint()).map_err(|e| {
            SolverError::Config(format!("Invalid generate endpoint {:?}: {}", cfg.endpoint(), e))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .build()
            .map_err(|e| SolverError::Config(format!("Build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base,
            endpoint,
            timeout_secs: cfg.timeout_secs,
        })
    }

    fn map_err(&self, e: reqwest::Error) -> SolverError {
        if e.is_timeout() {
            SolverError::Timeout(self.timeout_secs)
        } else {
            SolverError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl SolverBackend for HttpSolverBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerationOutcome, SolverError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = resp.status();
        tracing::debug!("Backend answered HTTP {}", status);

        if !status.is_success() {
            // 与成功分支一样按 JSON 解析；解析不了即视为传输错误
            let body: ErrorBody = resp.json().await.map_err(|e| self.map_err(e))?;
            return Err(SolverError::Rejected {
                status: status.as_u16(),
                detail: body.detail_text(),
            });
        }

        let body: GenerateResponse = resp.json().await.map_err(|e| self.map_err(e))?;
        Ok(GenerationOutcome::decode(body, &self.base))
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}
