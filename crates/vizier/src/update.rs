//! Annotate a previously generated chart with a selection of its
//! stored insights, re-render, and overwrite in place.

use std::path::Path;

use crate::error::Result;
use crate::render;
use crate::request::{OutputType, VisualizationRequest, VisualizationResponse};
use crate::spec::{Annotation, ChartSpec, InsightRecord, SpecDocument};
use crate::store::ArtifactStore;

/// Merge selected insights onto the spec as annotations. Ordinals are
/// extraction-time positions; selecting none is valid and leaves the
/// spec unannotated.
pub fn merge_annotations(spec: &mut ChartSpec, selected: &[InsightRecord]) {
  spec.annotations = selected
    .iter()
    .map(|record| Annotation {
      ordinal: record.ordinal,
      kind: record.kind,
      content: record.content.clone(),
    })
    .collect();
}

/// Filter stored insights down to the caller's ordinal selection,
/// preserving stored order. Unknown ordinals simply match nothing.
pub fn select_insights(stored: &[InsightRecord], selection: &[u32]) -> Vec<InsightRecord> {
  stored.iter().filter(|record| selection.contains(&record.ordinal)).cloned().collect()
}

/// The update path: load, filter, merge, re-render, overwrite.
pub async fn run(request: &VisualizationRequest) -> Result<VisualizationResponse> {
  let store = ArtifactStore::new(Path::new(&request.directory))?;
  let document = store.load_spec(&request.file_name)?;

  let selected = select_insights(&document.insights, &request.insights_id);
  tracing::info!(
    name = %request.file_name,
    requested = request.insights_id.len(),
    matched = selected.len(),
    "updating chart with insight annotations"
  );

  let mut spec = document.spec.clone();
  merge_annotations(&mut spec, &selected);

  let bytes = render::render(&spec, request.width, request.height, request.output_type).await?;

  // update flag is forced: same base name, same extensions, overwrite
  let extension = request.output_type.extension();
  let name = store.resolve_name(&request.file_name, extension, true);
  let chart_path = store.save_chart(&name, extension, &bytes)?;
  store.save_spec(&name, &SpecDocument { spec, ..document })?;

  Ok(VisualizationResponse {
    chart_path: Some(chart_path.display().to_string()),
    ..VisualizationResponse::default()
  })
}
