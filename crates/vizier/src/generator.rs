//! Chart plan generation against an OpenAI-compatible chat endpoint.
//!
//! The model is asked for a small JSON plan (chart kind, field
//! bindings, title); the plan is validated against the dataset and
//! assembled into a full `ChartSpec`. Prompt building and response
//! parsing are free functions so they stay testable without a network.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::request::{Language, LlmConfig};
use crate::spec::{AxisSpec, ChartKind, ChartSpec, Formatter, Theme};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const SAMPLE_ROWS: usize = 8;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
  pub theme: Theme,
  /// When false (the default) the model is told it must chart the rows
  /// as given and may not invent or re-aggregate data.
  pub allow_data_requery: bool,
}

impl Default for GenerateOptions {
  fn default() -> Self {
    Self { theme: Theme::Light, allow_data_requery: false }
  }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
  model: String,
  messages: Vec<ChatMessage>,
  temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
  role: String,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

/// The model's answer: a minimal chart plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPlan {
  pub chart_type: ChartKind,
  pub x_field: String,
  pub y_fields: Vec<String>,
  #[serde(default)]
  pub title: Option<String>,
}

/// Produce a chart spec for (prompt, dataset), or an explicit
/// generation error. No artifact is written on failure.
pub async fn generate_spec(
  config: &LlmConfig,
  user_prompt: &str,
  dataset: &Dataset,
  language: Language,
  options: &GenerateOptions,
) -> Result<ChartSpec> {
  if dataset.is_empty() {
    return Err(Error::Generation("dataset is empty".to_string()));
  }

  let client = Client::builder()
    .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    .build()
    .map_err(|e| Error::Generation(format!("http client: {e}")))?;

  let body = ChatRequest {
    model: config.model.clone(),
    messages: vec![
      ChatMessage { role: "system".to_string(), content: system_prompt(options) },
      ChatMessage {
        role: "user".to_string(),
        content: plan_prompt(user_prompt, dataset, language),
      },
    ],
    temperature: 0.2,
  };

  let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
  let response = client
    .post(&url)
    .bearer_auth(&config.api_key)
    .json(&body)
    .send()
    .await
    .map_err(|e| Error::Generation(format!("request to {url} failed: {e}")))?;

  let status = response.status();
  if !status.is_success() {
    let detail = response.text().await.unwrap_or_default();
    return Err(Error::Generation(format!("endpoint returned {status}: {detail}")));
  }

  let payload: ChatResponse = response
    .json()
    .await
    .map_err(|e| Error::Generation(format!("malformed completion payload: {e}")))?;
  let content = extract_content(payload)?;
  let plan = parse_plan(&content)?;
  plan_to_spec(plan, user_prompt, dataset, options)
}

fn system_prompt(options: &GenerateOptions) -> String {
  let mut prompt = String::from(
    "You are a chart planning assistant. Answer with a single JSON object and \
     nothing else, using exactly these keys: \
     {\"chartType\": one of [\"bar\",\"line\",\"area\",\"scatter\",\"dualAxis\",\"pie\"], \
     \"xField\": column name, \"yFields\": [one column name, or two for dualAxis], \
     \"title\": short chart title}.",
  );
  if !options.allow_data_requery {
    prompt.push_str(
      " Use only the columns that exist in the dataset; never invent, filter or \
       re-aggregate data.",
    );
  }
  prompt
}

/// Schema, a sample of rows, and the user's intent.
pub fn plan_prompt(user_prompt: &str, dataset: &Dataset, language: Language) -> String {
  let columns = dataset
    .columns()
    .iter()
    .map(|name| {
      let kind = match dataset.column_type(name) {
        crate::dataset::ColumnType::Numeric => "numeric",
        crate::dataset::ColumnType::Text => "text",
      };
      format!("{name} ({kind})")
    })
    .collect::<Vec<_>>()
    .join(", ");

  let sample = dataset
    .rows()
    .iter()
    .take(SAMPLE_ROWS)
    .map(|row| serde_json::to_string(row).unwrap_or_default())
    .collect::<Vec<_>>()
    .join("\n");

  let title_language = match language {
    Language::En => "English",
    Language::Zh => "Chinese",
  };

  format!(
    "Intent: {user_prompt}\n\
     Columns: {columns}\n\
     Rows ({total} total, first {shown} shown):\n{sample}\n\
     Write the title in {title_language}.",
    total = dataset.len(),
    shown = dataset.len().min(SAMPLE_ROWS),
  )
}

/// Pull the assistant text out of the completion payload.
fn extract_content(payload: ChatResponse) -> Result<String> {
  let choice = payload
    .choices
    .into_iter()
    .next()
    .ok_or_else(|| Error::Generation("completion contained no choices".to_string()))?;
  let content = choice.message.content.trim().to_string();
  if content.is_empty() {
    return Err(Error::Generation("completion content was empty".to_string()));
  }
  Ok(content)
}

/// Parse the plan JSON, tolerating a markdown code fence around it.
pub fn parse_plan(content: &str) -> Result<ChartPlan> {
  let stripped = strip_code_fence(content);
  serde_json::from_str(stripped)
    .map_err(|e| Error::Generation(format!("unparseable chart plan: {e}; content: {stripped}")))
}

fn strip_code_fence(content: &str) -> &str {
  let trimmed = content.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  // drop an optional language tag on the fence line
  let rest = rest.strip_prefix("json").unwrap_or(rest);
  rest.trim_start_matches(['\r', '\n']).trim_end_matches('`').trim()
}

/// Validate the plan against the dataset and build the final spec.
pub fn plan_to_spec(
  plan: ChartPlan,
  user_prompt: &str,
  dataset: &Dataset,
  options: &GenerateOptions,
) -> Result<ChartSpec> {
  if !dataset.has_column(&plan.x_field) {
    return Err(Error::Generation(format!("plan references unknown x column '{}'", plan.x_field)));
  }
  if plan.y_fields.is_empty() {
    return Err(Error::Generation("plan bound no y columns".to_string()));
  }
  for field in &plan.y_fields {
    if !dataset.has_column(field) {
      return Err(Error::Generation(format!("plan references unknown y column '{field}'")));
    }
  }
  if plan.chart_type == ChartKind::DualAxis && plan.y_fields.len() != 2 {
    return Err(Error::Generation("dual-axis plan needs exactly two y columns".to_string()));
  }

  let title = plan
    .title
    .filter(|t| !t.trim().is_empty())
    .unwrap_or_else(|| user_prompt.to_string());

  Ok(ChartSpec {
    chart_kind: plan.chart_type,
    title,
    theme: options.theme,
    x: AxisSpec::new(plan.x_field),
    y: plan.y_fields.into_iter().take(2).map(AxisSpec::new).collect(),
    series_field: None,
    animation: true,
    tooltip_formatter: Formatter::Raw,
    data: dataset.clone(),
    annotations: Vec::new(),
  })
}
