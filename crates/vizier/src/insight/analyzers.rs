//! The closed set of statistical analyzers.
//!
//! Each analyzer is a pure function over the analysis context: it
//! proposes zero or more insights, ordered by its own notion of
//! relevance, and may fail without taking the others down. Analyzers
//! that can flag several points cap their own contribution at two
//! proposals so one noisy series cannot fill the whole insight window.

use anyhow::{ensure, Result};
use serde_json::Value;

use super::phrase;
use super::Proposal;
use crate::dataset::display_value;
use crate::request::Language;
use crate::spec::{ChartKind, ChartSpec, InsightKind};

/// Per-analyzer cap on proposals.
const PER_ANALYZER_CAP: usize = 2;

/// Series data shared by every analyzer for one extraction pass.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
  pub measure: String,
  pub labels: Vec<String>,
  pub values: Vec<f64>,
  /// A second numeric variable, when the spec binds one: the right axis
  /// of a dual-axis chart, or the x variable of a numeric scatter.
  pub secondary: Option<(String, Vec<f64>)>,
}

impl AnalysisContext {
  pub fn from_spec(spec: &ChartSpec) -> Option<Self> {
    let primary_axis = spec.primary_y()?;
    let secondary_field = spec
      .secondary_y()
      .map(|axis| axis.field.clone())
      .or_else(|| (spec.chart_kind == ChartKind::Scatter).then(|| spec.x.field.clone()));

    // one pass per row, so the secondary stays aligned with the rows
    // that survive primary-value filtering
    let mut labels = Vec::new();
    let mut values = Vec::new();
    let mut secondary_values = Vec::new();
    for row in spec.data.rows() {
      let Some(value) = row.get(&primary_axis.field).and_then(Value::as_f64) else {
        continue;
      };
      labels.push(row.get(&spec.x.field).map(display_value).unwrap_or_default());
      values.push(value);
      if let Some(field) = &secondary_field {
        if let Some(paired) = row.get(field).and_then(Value::as_f64) {
          secondary_values.push(paired);
        }
      }
    }
    if values.len() < 3 {
      return None;
    }

    // a secondary with holes of its own cannot be paired row-for-row
    let secondary = secondary_field
      .filter(|_| secondary_values.len() == values.len())
      .map(|field| (field, secondary_values));

    Some(Self { measure: primary_axis.field.clone(), labels, values, secondary })
  }
}

pub struct Analyzer {
  pub name: &'static str,
  pub run: fn(&AnalysisContext, Language) -> Result<Vec<Proposal>>,
}

/// Fixed execution order; extraction preserves it and never re-sorts.
pub const ALL: &[Analyzer] = &[
  Analyzer { name: "overall_trend", run: overall_trend },
  Analyzer { name: "abnormal_trend", run: abnormal_trend },
  Analyzer { name: "pearson_correlation", run: pearson_correlation },
  Analyzer { name: "spearman_correlation", run: spearman_correlation },
  Analyzer { name: "extreme_value", run: extreme_value },
  Analyzer { name: "majority_value", run: majority_value },
  Analyzer { name: "statistics_abnormal", run: statistics_abnormal },
  Analyzer { name: "statistics_base", run: statistics_base },
  Analyzer { name: "dbscan_outlier", run: dbscan_outlier },
  Analyzer { name: "lof_outlier", run: lof_outlier },
  Analyzer { name: "turning_point", run: turning_point },
  Analyzer { name: "page_hinkley", run: page_hinkley },
  Analyzer { name: "difference_outlier", run: difference_outlier },
  Analyzer { name: "volatility", run: volatility },
];

// ==== Analyzers ====

fn overall_trend(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  ensure!(ctx.labels.len() == ctx.values.len(), "labels and values out of step");

  let slope = linear_slope(&ctx.values);
  let mean = mean(&ctx.values);
  let span = slope * (ctx.values.len() - 1) as f64;
  // flat series: total drift below 5% of the mean level
  if mean.abs() < f64::EPSILON || span.abs() < 0.05 * mean.abs() {
    return Ok(Vec::new());
  }

  let first = ctx.values[0];
  let last = ctx.values[ctx.values.len() - 1];
  let change_pct = if first.abs() > f64::EPSILON { (last - first) / first.abs() * 100.0 } else { last - first };

  Ok(vec![Proposal {
    kind: InsightKind::OverallTrend,
    content: phrase::overall_trend(lang, &ctx.measure, slope > 0.0, change_pct),
    value: Some(change_pct),
  }])
}

fn abnormal_trend(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let n = ctx.values.len();
  if n < 8 {
    return Ok(Vec::new());
  }

  let overall = linear_slope(&ctx.values);
  let tail_len = (n / 4).max(3);
  let tail = linear_slope(&ctx.values[n - tail_len..]);
  let level = mean(&ctx.values).abs().max(f64::EPSILON);

  let significant = |s: f64| s.abs() * (n - 1) as f64 > 0.05 * level;
  if significant(overall) && significant(tail) && overall.signum() != tail.signum() {
    return Ok(vec![Proposal {
      kind: InsightKind::AbnormalTrend,
      content: phrase::abnormal_trend(lang, &ctx.measure, overall > 0.0),
      value: Some(tail),
    }]);
  }
  Ok(Vec::new())
}

fn pearson_correlation(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let Some((other_name, other)) = &ctx.secondary else {
    return Ok(Vec::new());
  };
  let n = ctx.values.len().min(other.len());
  if n < 3 {
    return Ok(Vec::new());
  }

  let r = pearson(&ctx.values[..n], &other[..n]);
  if r.abs() < 0.7 {
    return Ok(Vec::new());
  }
  Ok(vec![Proposal {
    kind: InsightKind::PearsonCorrelation,
    content: phrase::pearson(lang, &ctx.measure, other_name, r),
    value: Some(r),
  }])
}

fn spearman_correlation(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let Some((other_name, other)) = &ctx.secondary else {
    return Ok(Vec::new());
  };
  let n = ctx.values.len().min(other.len());
  if n < 3 {
    return Ok(Vec::new());
  }

  let rho = pearson(&ranks(&ctx.values[..n]), &ranks(&other[..n]));
  if rho.abs() < 0.7 {
    return Ok(Vec::new());
  }
  Ok(vec![Proposal {
    kind: InsightKind::SpearmanCorrelation,
    content: phrase::spearman(lang, other_name, &ctx.measure, rho),
    value: Some(rho),
  }])
}

fn extreme_value(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  ensure!(ctx.labels.len() == ctx.values.len(), "labels and values out of step");

  let (max_index, max_value) = argmax(&ctx.values);
  let (min_index, min_value) = argmin(&ctx.values);
  if (max_value - min_value).abs() < f64::EPSILON {
    return Ok(Vec::new());
  }

  Ok(vec![
    Proposal {
      kind: InsightKind::ExtremeValue,
      content: phrase::extreme(lang, &ctx.measure, &ctx.labels[max_index], max_value, true),
      value: Some(max_value),
    },
    Proposal {
      kind: InsightKind::ExtremeValue,
      content: phrase::extreme(lang, &ctx.measure, &ctx.labels[min_index], min_value, false),
      value: Some(min_value),
    },
  ])
}

fn majority_value(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  if ctx.values.iter().any(|v| *v < 0.0) {
    return Ok(Vec::new());
  }
  let total: f64 = ctx.values.iter().sum();
  if total <= 0.0 {
    return Ok(Vec::new());
  }

  let (index, top) = argmax(&ctx.values);
  let share = top / total;
  if share <= 0.5 {
    return Ok(Vec::new());
  }
  Ok(vec![Proposal {
    kind: InsightKind::MajorityValue,
    content: phrase::majority(lang, &ctx.measure, &ctx.labels[index], share * 100.0),
    value: Some(share),
  }])
}

fn statistics_abnormal(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let mean = mean(&ctx.values);
  let sd = stddev(&ctx.values);
  if sd < f64::EPSILON {
    return Ok(Vec::new());
  }

  let mut flagged: Vec<(usize, f64)> = ctx
    .values
    .iter()
    .enumerate()
    .map(|(i, v)| (i, (v - mean) / sd))
    .filter(|(_, z)| z.abs() > 2.0)
    .collect();
  flagged.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
  flagged.truncate(PER_ANALYZER_CAP);

  Ok(
    flagged
      .into_iter()
      .map(|(i, z)| Proposal {
        kind: InsightKind::StatisticsAbnormal,
        content: phrase::statistics_abnormal(lang, &ctx.measure, &ctx.labels[i], ctx.values[i], z),
        value: Some(z),
      })
      .collect(),
  )
}

fn statistics_base(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  if ctx.values.len() < 4 {
    return Ok(Vec::new());
  }
  let mean = mean(&ctx.values);
  let median = median(&ctx.values);
  if mean.abs() < f64::EPSILON || (mean - median).abs() <= 0.25 * mean.abs() {
    return Ok(Vec::new());
  }
  Ok(vec![Proposal {
    kind: InsightKind::StatisticsBase,
    content: phrase::statistics_base(lang, &ctx.measure, mean, median),
    value: Some(mean - median),
  }])
}

fn dbscan_outlier(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let sd = stddev(&ctx.values);
  if sd < f64::EPSILON || ctx.values.len() < 4 {
    return Ok(Vec::new());
  }
  let eps = sd;

  // 1-D density scan: a point with no neighbor within eps is isolated
  let mut isolated: Vec<usize> = Vec::new();
  for (i, v) in ctx.values.iter().enumerate() {
    let has_neighbor = ctx
      .values
      .iter()
      .enumerate()
      .any(|(j, w)| i != j && (v - w).abs() <= eps);
    if !has_neighbor {
      isolated.push(i);
    }
  }
  isolated.truncate(PER_ANALYZER_CAP);

  Ok(
    isolated
      .into_iter()
      .map(|i| Proposal {
        kind: InsightKind::DbscanOutlier,
        content: phrase::density_outlier(lang, &ctx.measure, &ctx.labels[i], ctx.values[i]),
        value: Some(ctx.values[i]),
      })
      .collect(),
  )
}

fn lof_outlier(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let n = ctx.values.len();
  if n < 5 {
    return Ok(Vec::new());
  }
  let k = 3.min(n - 1);

  // mean distance to the k nearest neighbors, per point
  let reach: Vec<f64> = (0..n)
    .map(|i| {
      let mut distances: Vec<f64> =
        (0..n).filter(|j| *j != i).map(|j| (ctx.values[i] - ctx.values[j]).abs()).collect();
      distances.sort_by(|a, b| a.total_cmp(b));
      distances.iter().take(k).sum::<f64>() / k as f64
    })
    .collect();

  let typical = median(&reach).max(f64::EPSILON);
  let mut flagged: Vec<(usize, f64)> = reach
    .iter()
    .enumerate()
    .map(|(i, r)| (i, r / typical))
    .filter(|(_, factor)| *factor > 1.8)
    .collect();
  flagged.sort_by(|a, b| b.1.total_cmp(&a.1));
  flagged.truncate(PER_ANALYZER_CAP);

  Ok(
    flagged
      .into_iter()
      .map(|(i, factor)| Proposal {
        kind: InsightKind::LofOutlier,
        content: phrase::local_outlier(lang, &ctx.measure, &ctx.labels[i], ctx.values[i]),
        value: Some(factor),
      })
      .collect(),
  )
}

fn turning_point(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let n = ctx.values.len();
  if n < 5 {
    return Ok(Vec::new());
  }
  let sd = stddev(&ctx.values);
  let mean = mean(&ctx.values);

  let (max_index, max_value) = argmax(&ctx.values);
  if max_index > 0 && max_index < n - 1 && (max_value - mean).abs() > sd {
    return Ok(vec![Proposal {
      kind: InsightKind::TurningPoint,
      content: phrase::turning_point(lang, &ctx.measure, &ctx.labels[max_index], max_value, true),
      value: Some(max_value),
    }]);
  }

  let (min_index, min_value) = argmin(&ctx.values);
  if min_index > 0 && min_index < n - 1 && (min_value - mean).abs() > sd {
    return Ok(vec![Proposal {
      kind: InsightKind::TurningPoint,
      content: phrase::turning_point(lang, &ctx.measure, &ctx.labels[min_index], min_value, false),
      value: Some(min_value),
    }]);
  }
  Ok(Vec::new())
}

fn page_hinkley(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let n = ctx.values.len();
  if n < 6 {
    return Ok(Vec::new());
  }
  let mean = mean(&ctx.values);
  let sd = stddev(&ctx.values);
  if sd < f64::EPSILON {
    return Ok(Vec::new());
  }
  let lambda = 3.0 * sd;

  let mut cumulative = 0.0;
  let mut minimum = 0.0f64;
  for (i, value) in ctx.values.iter().enumerate() {
    cumulative += value - mean;
    minimum = minimum.min(cumulative);
    if cumulative - minimum > lambda {
      return Ok(vec![Proposal {
        kind: InsightKind::PageHinkley,
        content: phrase::level_shift(lang, &ctx.measure, &ctx.labels[i]),
        value: Some(cumulative - minimum),
      }]);
    }
  }
  Ok(Vec::new())
}

fn difference_outlier(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let n = ctx.values.len();
  if n < 5 {
    return Ok(Vec::new());
  }
  let diffs: Vec<f64> = ctx.values.windows(2).map(|w| w[1] - w[0]).collect();
  let mean = mean(&diffs);
  let sd = stddev(&diffs);
  if sd < f64::EPSILON {
    return Ok(Vec::new());
  }

  let mut flagged: Vec<(usize, f64)> = diffs
    .iter()
    .enumerate()
    .map(|(i, d)| (i, (d - mean) / sd))
    .filter(|(_, z)| z.abs() > 2.5)
    .collect();
  flagged.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
  flagged.truncate(PER_ANALYZER_CAP);

  Ok(
    flagged
      .into_iter()
      .map(|(i, _)| Proposal {
        kind: InsightKind::DifferenceOutlier,
        content: phrase::difference_outlier(
          lang,
          &ctx.measure,
          &ctx.labels[i],
          &ctx.labels[i + 1],
          diffs[i],
        ),
        value: Some(diffs[i]),
      })
      .collect(),
  )
}

fn volatility(ctx: &AnalysisContext, lang: Language) -> Result<Vec<Proposal>> {
  let mean = mean(&ctx.values);
  if mean.abs() < f64::EPSILON {
    return Ok(Vec::new());
  }
  let cv = stddev(&ctx.values) / mean.abs();
  if cv <= 0.3 {
    return Ok(Vec::new());
  }
  Ok(vec![Proposal {
    kind: InsightKind::Volatility,
    content: phrase::volatility(lang, &ctx.measure, cv),
    value: Some(cv),
  }])
}

// ==== Numeric helpers ====

pub fn mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub fn stddev(values: &[f64]) -> f64 {
  if values.len() < 2 {
    return 0.0;
  }
  let m = mean(values);
  let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
  variance.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.total_cmp(b));
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    (sorted[mid - 1] + sorted[mid]) / 2.0
  } else {
    sorted[mid]
  }
}

/// Least-squares slope of values against their indices.
pub fn linear_slope(values: &[f64]) -> f64 {
  let n = values.len();
  if n < 2 {
    return 0.0;
  }
  let x_mean = (n - 1) as f64 / 2.0;
  let y_mean = mean(values);
  let mut numerator = 0.0;
  let mut denominator = 0.0;
  for (i, v) in values.iter().enumerate() {
    let dx = i as f64 - x_mean;
    numerator += dx * (v - y_mean);
    denominator += dx * dx;
  }
  if denominator.abs() < f64::EPSILON {
    0.0
  } else {
    numerator / denominator
  }
}

pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
  let n = a.len().min(b.len());
  if n < 2 {
    return 0.0;
  }
  let mean_a = mean(&a[..n]);
  let mean_b = mean(&b[..n]);
  let mut cov = 0.0;
  let mut var_a = 0.0;
  let mut var_b = 0.0;
  for i in 0..n {
    let da = a[i] - mean_a;
    let db = b[i] - mean_b;
    cov += da * db;
    var_a += da * da;
    var_b += db * db;
  }
  if var_a < f64::EPSILON || var_b < f64::EPSILON {
    return 0.0;
  }
  cov / (var_a.sqrt() * var_b.sqrt())
}

/// Average ranks, ties sharing their mean rank.
pub fn ranks(values: &[f64]) -> Vec<f64> {
  let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
  indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

  let mut result = vec![0.0; values.len()];
  let mut i = 0;
  while i < indexed.len() {
    let mut j = i;
    while j + 1 < indexed.len() && indexed[j + 1].1 == indexed[i].1 {
      j += 1;
    }
    let shared = (i + j) as f64 / 2.0 + 1.0;
    for item in &indexed[i..=j] {
      result[item.0] = shared;
    }
    i = j + 1;
  }
  result
}

fn argmax(values: &[f64]) -> (usize, f64) {
  let mut best = (0, f64::NEG_INFINITY);
  for (i, v) in values.iter().enumerate() {
    if *v > best.1 {
      best = (i, *v);
    }
  }
  best
}

fn argmin(values: &[f64]) -> (usize, f64) {
  let mut best = (0, f64::INFINITY);
  for (i, v) in values.iter().enumerate() {
    if *v < best.1 {
      best = (i, *v);
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::Dataset;
  use crate::spec::{AxisSpec, Formatter, Theme};
  use serde_json::json;

  fn ctx(values: Vec<f64>) -> AnalysisContext {
    AnalysisContext {
      measure: "revenue".to_string(),
      labels: (0..values.len()).map(|i| format!("p{i}")).collect(),
      values,
      secondary: None,
    }
  }

  #[test]
  fn slope_of_rising_series_is_positive() {
    assert!(linear_slope(&[1.0, 2.0, 3.0, 4.0]) > 0.0);
    assert_eq!(linear_slope(&[5.0, 5.0, 5.0]), 0.0);
  }

  #[test]
  fn pearson_detects_perfect_correlation() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [2.0, 4.0, 6.0, 8.0];
    assert!((pearson(&a, &b) - 1.0).abs() < 1e-9);
  }

  #[test]
  fn ranks_share_mean_rank_on_ties() {
    assert_eq!(ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
  }

  #[test]
  fn overall_trend_fires_on_steady_growth() {
    let proposals =
      overall_trend(&ctx(vec![10.0, 12.0, 14.0, 16.0, 18.0]), Language::En).unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].kind, InsightKind::OverallTrend);
    assert!(proposals[0].content.contains("rising"));
  }

  #[test]
  fn overall_trend_skips_flat_series() {
    let proposals =
      overall_trend(&ctx(vec![100.0, 100.2, 99.9, 100.1, 100.0]), Language::En).unwrap();
    assert!(proposals.is_empty());
  }

  #[test]
  fn extreme_value_names_the_max_label_first() {
    let proposals =
      extreme_value(&ctx(vec![5.0, 50.0, 7.0, 3.0]), Language::En).unwrap();
    assert_eq!(proposals.len(), 2);
    assert!(proposals[0].content.contains("p1"));
    assert!(proposals[0].content.contains("maximum"));
    assert!(proposals[1].content.contains("minimum"));
  }

  #[test]
  fn majority_requires_more_than_half() {
    let fired = majority_value(&ctx(vec![80.0, 10.0, 10.0]), Language::En).unwrap();
    assert_eq!(fired.len(), 1);
    let silent = majority_value(&ctx(vec![40.0, 30.0, 30.0]), Language::En).unwrap();
    assert!(silent.is_empty());
  }

  #[test]
  fn statistics_abnormal_caps_its_contribution() {
    let mut values = vec![10.0; 30];
    values[4] = 400.0;
    values[9] = -350.0;
    values[14] = 380.0;
    let proposals = statistics_abnormal(&ctx(values), Language::En).unwrap();
    assert_eq!(proposals.len(), 2);
  }

  #[test]
  fn difference_outlier_points_at_the_jump() {
    let values =
      vec![10.0, 10.2, 9.9, 10.1, 10.0, 10.3, 9.8, 10.2, 10.1, 9.9, 10.0, 55.0];
    let proposals = difference_outlier(&ctx(values), Language::En).unwrap();
    assert!(!proposals.is_empty());
    assert!(proposals[0].content.contains("p10"));
    assert!(proposals[0].content.contains("p11"));
  }

  #[test]
  fn secondary_series_stays_row_aligned_past_primary_nulls() {
    // the d2 row must drop from both series, not just the primary
    let rows = json!([
      {"day": "d1", "revenue": 1.0, "cost": 2.0},
      {"day": "d2", "revenue": null, "cost": 999.0},
      {"day": "d3", "revenue": 2.0, "cost": 4.0},
      {"day": "d4", "revenue": 3.0, "cost": 6.0},
      {"day": "d5", "revenue": 4.0, "cost": 8.0},
      {"day": "d6", "revenue": 5.0, "cost": 10.0}
    ]);
    let spec = ChartSpec {
      chart_kind: ChartKind::DualAxis,
      title: "t".to_string(),
      theme: Theme::Light,
      x: AxisSpec::new("day"),
      y: vec![AxisSpec::new("revenue"), AxisSpec::new("cost")],
      series_field: None,
      animation: true,
      tooltip_formatter: Formatter::Raw,
      data: Dataset::new(serde_json::from_value(rows).unwrap()),
      annotations: Vec::new(),
    };

    let ctx = AnalysisContext::from_spec(&spec).unwrap();
    assert_eq!(ctx.values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    let (name, secondary) = ctx.secondary.clone().unwrap();
    assert_eq!(name, "cost");
    assert_eq!(secondary, vec![2.0, 4.0, 6.0, 8.0, 10.0]);

    let fired = pearson_correlation(&ctx, Language::En).unwrap();
    assert_eq!(fired.len(), 1);
    assert!(fired[0].value.unwrap() > 0.99);
  }

  #[test]
  fn secondary_with_its_own_nulls_is_not_paired() {
    let rows = json!([
      {"day": "d1", "revenue": 1.0, "cost": 2.0},
      {"day": "d2", "revenue": 2.0, "cost": null},
      {"day": "d3", "revenue": 3.0, "cost": 6.0},
      {"day": "d4", "revenue": 4.0, "cost": 8.0}
    ]);
    let spec = ChartSpec {
      chart_kind: ChartKind::DualAxis,
      title: "t".to_string(),
      theme: Theme::Light,
      x: AxisSpec::new("day"),
      y: vec![AxisSpec::new("revenue"), AxisSpec::new("cost")],
      series_field: None,
      animation: true,
      tooltip_formatter: Formatter::Raw,
      data: Dataset::new(serde_json::from_value(rows).unwrap()),
      annotations: Vec::new(),
    };

    let ctx = AnalysisContext::from_spec(&spec).unwrap();
    assert!(ctx.secondary.is_none());
  }

  #[test]
  fn correlation_needs_a_second_variable() {
    let no_pair = pearson_correlation(&ctx(vec![1.0, 2.0, 3.0]), Language::En).unwrap();
    assert!(no_pair.is_empty());

    let mut paired = ctx(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    paired.secondary = Some(("cost".to_string(), vec![2.0, 4.0, 6.0, 8.0, 10.0]));
    let fired = pearson_correlation(&paired, Language::En).unwrap();
    assert_eq!(fired.len(), 1);
    assert!(fired[0].value.unwrap() > 0.99);
  }
}
