//! Request dispatch and the generate path.

use std::path::Path;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::generator::{self, GenerateOptions};
use crate::insight;
use crate::render;
use crate::request::{TaskType, VisualizationRequest, VisualizationResponse};
use crate::spec::SpecDocument;
use crate::store::ArtifactStore;
use crate::update;

/// Serve exactly one request. Every failure is converted into the
/// response's `error` field; nothing propagates past this point.
pub async fn run(request: VisualizationRequest) -> VisualizationResponse {
  let outcome = match request.task_type {
    TaskType::Visualization => generate(&request).await,
    TaskType::Insight if !request.insights_id.is_empty() => update::run(&request).await,
    TaskType::Insight => Err(Error::BadRequest(
      "insight task requires a non-empty insights_id selection".to_string(),
    )),
  };

  match outcome {
    Ok(response) => response,
    Err(error) => {
      tracing::error!(%error, "pipeline failed");
      VisualizationResponse::failure(error.to_string())
    }
  }
}

/// The generate path: plan, extract, persist, render, summarize.
async fn generate(request: &VisualizationRequest) -> Result<VisualizationResponse> {
  let config = request
    .llm_config
    .as_ref()
    .ok_or_else(|| Error::BadRequest("visualization task requires llm_config".to_string()))?;

  let dataset = Dataset::new(request.dataset.clone());
  let options = GenerateOptions::default();
  let spec = generator::generate_spec(
    config,
    &request.user_prompt,
    &dataset,
    request.language,
    &options,
  )
  .await?;
  tracing::info!(kind = ?spec.chart_kind, title = %spec.title, "chart plan generated");

  let proposals = insight::extract(&spec, insight::DEFAULT_MAX_INSIGHTS, request.language);
  let records = insight::to_records(proposals);

  let store = ArtifactStore::new(Path::new(&request.directory))?;
  let extension = request.output_type.extension();
  let name = store.resolve_name(&request.file_name, extension, false);

  // the spec document lands before rendering is attempted; a render
  // failure can therefore leave an orphaned .json behind
  store.save_spec(&name, &SpecDocument::new(spec.clone(), records.clone()))?;

  let bytes = render::render(&spec, request.width, request.height, request.output_type).await?;
  let chart_path = store.save_chart(&name, extension, &bytes)?;

  let summary = store.save_insight_summary(&name, &request.user_prompt, &records)?;
  let (insight_path, insight_md) = match summary {
    Some((path, markdown)) => (Some(path.display().to_string()), Some(markdown)),
    None => (None, None),
  };

  Ok(VisualizationResponse {
    chart_path: Some(chart_path.display().to_string()),
    insight_path,
    insight_md,
    error: None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::{Language, OutputType};

  fn insight_request(ids: Vec<u32>) -> VisualizationRequest {
    VisualizationRequest {
      llm_config: None,
      width: None,
      height: None,
      dataset: Vec::new(),
      directory: "/tmp/nonexistent-vizier-test".to_string(),
      user_prompt: String::new(),
      output_type: OutputType::Html,
      file_name: "missing".to_string(),
      task_type: TaskType::Insight,
      insights_id: ids,
      language: Language::En,
    }
  }

  #[tokio::test]
  async fn insight_task_without_ids_is_rejected() {
    let response = run(insight_request(Vec::new())).await;
    assert!(response.error.unwrap().contains("insights_id"));
    assert!(response.chart_path.is_none());
  }

  #[tokio::test]
  async fn generate_without_llm_config_is_rejected() {
    let mut request = insight_request(Vec::new());
    request.task_type = TaskType::Visualization;
    let response = run(request).await;
    assert!(response.error.unwrap().contains("llm_config"));
  }
}
