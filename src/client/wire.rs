//! 生成服务的线上格式
//!
//! 请求体只有 prompt；响应体在边界处解码为 GenerationOutcome，渲染层不再按字段名临时取值。

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::SolverError;

/// POST /generate 的请求体
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

/// 2xx 响应的原始形状；所有字段都可能缺失。
/// 服务端把模型输出的 JSON 原样转发，字段类型不可靠：文本字段接受任意 JSON 值，status 非字符串时视为未知状态
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub solution_steps: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manim_script: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error_detail: Option<String>,
}

/// 任意 JSON 值转为可显示文本：数组逐项换行拼接，null 视为缺失
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(value_to_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

/// 非字符串 status 保留其 JSON 文本（如 "null"），必然落入失败分支
fn lenient_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// 非 2xx 响应体：FastAPI 的 HTTPException 形状；422 校验错误时 detail 是数组
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// 可读的 detail：字符串原样返回，其它 JSON 值序列化后返回
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// 成功（含部分成功）时保留下来的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub solution_steps: String,
    pub manim_script: String,
    pub video_url: Option<Url>,
    /// 服务端附带的说明，如「脚本已生成但视频渲染失败」
    pub message: Option<String>,
    /// 渲染失败时 Manim 的 stderr
    pub error_detail: Option<String>,
    pub partial: bool,
}

/// 按 status 字段解码后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(Solution),
    PartialSuccess(Solution),
    Failed { status: String },
}

impl GenerationOutcome {
    /// 解码 2xx 响应；相对的 video_url 以 base 解析，空串视为没有视频
    pub fn decode(resp: GenerateResponse, base: &Url) -> Self {
        let partial = match resp.status.as_str() {
            "success" => false,
            "partial_success" => true,
            _ => return GenerationOutcome::Failed { status: resp.status },
        };

        let video_url = resp
            .video_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|raw| match base.join(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring unparsable video_url {:?}: {}", raw, e);
                    None
                }
            });

        let solution = Solution {
            solution_steps: resp.solution_steps.unwrap_or_default(),
            manim_script: resp.manim_script.unwrap_or_default(),
            video_url,
            message: resp.message.filter(|m| !m.trim().is_empty()),
            error_detail: resp.error_detail.filter(|m| !m.trim().is_empty()),
            partial,
        };

        if partial {
            GenerationOutcome::PartialSuccess(solution)
        } else {
            GenerationOutcome::Success(solution)
        }
    }

    /// success / partial_success 渲染方式相同；其余 status 记为生成失败
    pub fn into_solution(self) -> Result<Solution, SolverError> {
        match self {
            GenerationOutcome::Success(s) | GenerationOutcome::PartialSuccess(s) => Ok(s),
            GenerationOutcome::Failed { status } => Err(SolverError::GenerationFailed { status }),
        }
    }
}
