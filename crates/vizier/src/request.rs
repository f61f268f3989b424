//! Wire types for the one-shot stdin/stdout boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Endpoint and credentials for the chart-plan generation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
  pub base_url: String,
  pub model: String,
  pub api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
  Png,
  Html,
}

impl OutputType {
  pub fn extension(&self) -> &'static str {
    match self {
      OutputType::Png => "png",
      OutputType::Html => "html",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
  /// Generate a fresh chart from (prompt, dataset).
  Visualization,
  /// Annotate a previously generated chart with stored insights.
  Insight,
}

/// Controls the phrasing of generated insight text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  En,
  Zh,
}

/// The single request object, read once from stdin (or `--input`).
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizationRequest {
  /// Required on the generate path, unused on the update path.
  pub llm_config: Option<LlmConfig>,
  pub width: Option<u32>,
  pub height: Option<u32>,
  #[serde(default)]
  pub dataset: Vec<Map<String, Value>>,
  /// Working directory; artifacts live under `<directory>/visualization/`.
  pub directory: String,
  #[serde(default)]
  pub user_prompt: String,
  #[serde(default = "default_output_type")]
  pub output_type: OutputType,
  /// Logical base name shared by spec, chart and insight summary.
  pub file_name: String,
  pub task_type: TaskType,
  /// 1-based ordinals of stored insights to annotate (update path only).
  #[serde(default)]
  pub insights_id: Vec<u32>,
  #[serde(default)]
  pub language: Language,
}

fn default_output_type() -> OutputType {
  OutputType::Html
}

/// The single response object, written once to stdout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub chart_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub insight_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub insight_md: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl VisualizationResponse {
  pub fn failure(message: impl Into<String>) -> Self {
    Self { error: Some(message.into()), ..Self::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_parses_with_defaults() {
    let raw = r#"{
      "directory": "/tmp/work",
      "file_name": "revenue",
      "task_type": "visualization",
      "user_prompt": "monthly revenue trend"
    }"#;

    let request: VisualizationRequest = serde_json::from_str(raw).unwrap();
    assert_eq!(request.output_type, OutputType::Html);
    assert_eq!(request.language, Language::En);
    assert!(request.dataset.is_empty());
    assert!(request.insights_id.is_empty());
  }

  #[test]
  fn response_omits_empty_fields() {
    let response = VisualizationResponse::failure("boom");
    let encoded = serde_json::to_string(&response).unwrap();
    assert_eq!(encoded, r#"{"error":"boom"}"#);
  }

  #[test]
  fn task_and_output_enums_use_wire_names() {
    assert_eq!(serde_json::to_string(&TaskType::Insight).unwrap(), r#""insight""#);
    assert_eq!(serde_json::to_string(&OutputType::Png).unwrap(), r#""png""#);
    assert_eq!(serde_json::from_str::<Language>(r#""zh""#).unwrap(), Language::Zh);
  }
}
