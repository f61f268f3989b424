//! Insight extraction: a gated, capped pass over the closed analyzer set.

pub mod analyzers;
pub mod phrase;

pub use analyzers::AnalysisContext;

use crate::request::Language;
use crate::spec::{ChartSpec, InsightRecord};

pub const DEFAULT_MAX_INSIGHTS: usize = 6;

/// One analyzer finding, before ordinals are assigned.
#[derive(Debug, Clone)]
pub struct Proposal {
  pub kind: crate::spec::InsightKind,
  pub content: String,
  pub value: Option<f64>,
}

/// Run the full analyzer set over an eligible spec.
///
/// Ineligible chart kinds return an empty list without invoking any
/// analyzer. Analyzers run in their fixed order; each contributes its
/// own ordered proposals, the union is truncated to `max_num` with no
/// re-sort. A failing analyzer is logged and skipped.
pub fn extract(spec: &ChartSpec, max_num: usize, language: Language) -> Vec<Proposal> {
  if !spec.chart_kind.supports_insights() {
    return Vec::new();
  }
  let Some(ctx) = AnalysisContext::from_spec(spec) else {
    return Vec::new();
  };

  let mut proposals: Vec<Proposal> = Vec::new();
  for analyzer in analyzers::ALL {
    if proposals.len() >= max_num {
      break;
    }
    match (analyzer.run)(&ctx, language) {
      Ok(found) => proposals.extend(found),
      Err(error) => {
        tracing::warn!(analyzer = analyzer.name, %error, "analyzer failed; contribution omitted");
      }
    }
  }
  proposals.truncate(max_num);
  proposals
}

/// Assign stable 1-based ordinals in list order.
pub fn to_records(proposals: Vec<Proposal>) -> Vec<InsightRecord> {
  proposals
    .into_iter()
    .enumerate()
    .map(|(index, proposal)| InsightRecord {
      ordinal: (index + 1) as u32,
      kind: proposal.kind,
      content: proposal.content,
      value: proposal.value,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::Dataset;
  use crate::spec::{AxisSpec, ChartKind, ChartSpec, Formatter, Theme};
  use serde_json::json;

  fn spec_with(kind: ChartKind, values: &[f64]) -> ChartSpec {
    let rows = values
      .iter()
      .enumerate()
      .map(|(i, v)| json!({"month": format!("m{i}"), "revenue": v}))
      .collect::<Vec<_>>();
    ChartSpec {
      chart_kind: kind,
      title: "test".to_string(),
      theme: Theme::Light,
      x: AxisSpec::new("month"),
      y: vec![AxisSpec::new("revenue")],
      series_field: None,
      animation: true,
      tooltip_formatter: Formatter::Raw,
      data: Dataset::new(serde_json::from_value(json!(rows)).unwrap()),
      annotations: Vec::new(),
    }
  }

  #[test]
  fn ineligible_kind_returns_empty_without_analysis() {
    let spec = spec_with(ChartKind::Pie, &[1.0, 2.0, 3.0, 4.0, 50.0]);
    assert!(extract(&spec, DEFAULT_MAX_INSIGHTS, Language::En).is_empty());
  }

  #[test]
  fn extraction_never_exceeds_the_cap() {
    // wild series: trend, extremes, anomalies and jumps all fire
    let values = [5.0, 8.0, 12.0, 300.0, 18.0, 22.0, 25.0, 30.0, 2.0, 38.0, 45.0, 500.0];
    let spec = spec_with(ChartKind::Line, &values);
    let proposals = extract(&spec, DEFAULT_MAX_INSIGHTS, Language::En);
    assert!(proposals.len() <= DEFAULT_MAX_INSIGHTS);
    assert!(!proposals.is_empty());
  }

  #[test]
  fn smaller_cap_is_honored() {
    let values = [5.0, 8.0, 12.0, 300.0, 18.0, 22.0, 25.0, 30.0, 2.0, 38.0, 45.0, 500.0];
    let spec = spec_with(ChartKind::Bar, &values);
    assert!(extract(&spec, 2, Language::En).len() <= 2);
  }

  #[test]
  fn tiny_datasets_yield_nothing_but_do_not_fail() {
    let spec = spec_with(ChartKind::Line, &[1.0]);
    assert!(extract(&spec, DEFAULT_MAX_INSIGHTS, Language::En).is_empty());
  }

  #[test]
  fn ordinals_are_one_based_and_sequential() {
    let proposals = vec![
      Proposal { kind: crate::spec::InsightKind::ExtremeValue, content: "a".into(), value: None },
      Proposal { kind: crate::spec::InsightKind::Volatility, content: "b".into(), value: Some(1.0) },
    ];
    let records = to_records(proposals);
    assert_eq!(records[0].ordinal, 1);
    assert_eq!(records[1].ordinal, 2);
  }

  #[test]
  fn chinese_phrasing_is_used_for_zh() {
    let values = [10.0, 14.0, 18.0, 22.0, 26.0, 30.0];
    let spec = spec_with(ChartKind::Line, &values);
    let proposals = extract(&spec, DEFAULT_MAX_INSIGHTS, Language::Zh);
    assert!(proposals.iter().any(|p| p.content.contains("趋势")));
  }
}
