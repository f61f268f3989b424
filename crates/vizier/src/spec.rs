//! Chart specification tree and the records persisted alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
  Bar,
  Line,
  Area,
  Scatter,
  DualAxis,
  Pie,
}

impl ChartKind {
  /// Statistical insight extraction only runs for cartesian kinds; a pie
  /// chart gets no analyzer pass at all (cost/relevance gate, not an
  /// error).
  pub fn supports_insights(&self) -> bool {
    matches!(
      self,
      ChartKind::Bar | ChartKind::Line | ChartKind::Area | ChartKind::Scatter | ChartKind::DualAxis
    )
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

/// A named formatting template with fixed behavior.
///
/// This is the closed-set replacement for executable formatter leaves:
/// the spec carries a template tag plus parameters, never source code.
/// `Noop` exists as the decode-failure fallback and leaves values
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Formatter {
  #[default]
  Raw,
  Thousands {
    separator: char,
  },
  Percent {
    decimals: u8,
  },
  Prefix {
    text: String,
  },
  Suffix {
    text: String,
  },
  Truncate {
    max_chars: usize,
  },
  Noop,
}

impl Formatter {
  pub fn apply(&self, raw: &str) -> String {
    match self {
      Formatter::Raw | Formatter::Noop => raw.to_string(),
      Formatter::Thousands { separator } => group_thousands(raw, *separator),
      Formatter::Percent { decimals } => match raw.parse::<f64>() {
        Ok(value) => format!("{value:.prec$}%", prec = *decimals as usize),
        Err(_) => raw.to_string(),
      },
      Formatter::Prefix { text } => format!("{text}{raw}"),
      Formatter::Suffix { text } => format!("{raw}{text}"),
      Formatter::Truncate { max_chars } => raw.chars().take(*max_chars).collect(),
    }
  }

  /// Canonical template text, the payload carried behind the sentinel.
  pub fn canonical(&self) -> String {
    match self {
      Formatter::Raw => "raw".to_string(),
      Formatter::Noop => "noop".to_string(),
      Formatter::Thousands { separator } => format!("thousands(separator='{separator}')"),
      Formatter::Percent { decimals } => format!("percent(decimals={decimals})"),
      Formatter::Prefix { text } => format!("prefix(text='{text}')"),
      Formatter::Suffix { text } => format!("suffix(text='{text}')"),
      Formatter::Truncate { max_chars } => format!("truncate(max_chars={max_chars})"),
    }
  }

  /// Parse canonical (already whitespace-normalized) template text.
  pub fn parse(text: &str) -> Option<Formatter> {
    let text = text.trim();
    match text {
      "raw" => return Some(Formatter::Raw),
      "noop" => return Some(Formatter::Noop),
      _ => {}
    }

    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open {
      return None;
    }
    let name = text[..open].trim();
    let args = &text[open + 1..close];

    match name {
      "thousands" => {
        let value = arg_value(args, "separator")?;
        Some(Formatter::Thousands { separator: value.chars().next()? })
      }
      "percent" => {
        let value = arg_value(args, "decimals")?;
        Some(Formatter::Percent { decimals: value.parse().ok()? })
      }
      "prefix" => Some(Formatter::Prefix { text: arg_value(args, "text")? }),
      "suffix" => Some(Formatter::Suffix { text: arg_value(args, "text")? }),
      "truncate" => {
        let value = arg_value(args, "max_chars")?;
        Some(Formatter::Truncate { max_chars: value.parse().ok()? })
      }
      _ => None,
    }
  }
}

fn arg_value(args: &str, expected_key: &str) -> Option<String> {
  let (key, value) = args.split_once('=')?;
  if key.trim() != expected_key {
    return None;
  }
  Some(value.trim().trim_matches('\'').to_string())
}

/// Group the integer digits of a numeric string: `1234567.5` → `1,234,567.5`.
/// Non-numeric input passes through untouched.
fn group_thousands(raw: &str, separator: char) -> String {
  if raw.parse::<f64>().is_err() {
    return raw.to_string();
  }

  let (sign, rest) = match raw.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", raw),
  };
  let (int_part, frac_part) = match rest.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (rest, None),
  };

  let mut grouped = String::new();
  let digits: Vec<char> = int_part.chars().collect();
  for (index, digit) in digits.iter().enumerate() {
    if index > 0 && (digits.len() - index) % 3 == 0 {
      grouped.push(separator);
    }
    grouped.push(*digit);
  }

  match frac_part {
    Some(frac) => format!("{sign}{grouped}.{frac}"),
    None => format!("{sign}{grouped}"),
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSpec {
  pub field: String,
  #[serde(default)]
  pub label_formatter: Formatter,
}

impl AxisSpec {
  pub fn new(field: impl Into<String>) -> Self {
    Self { field: field.into(), label_formatter: Formatter::Raw }
  }
}

/// The ~14 closed categories of statistical findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightKind {
  OverallTrend,
  AbnormalTrend,
  PearsonCorrelation,
  SpearmanCorrelation,
  ExtremeValue,
  MajorityValue,
  StatisticsAbnormal,
  StatisticsBase,
  DbscanOutlier,
  LofOutlier,
  TurningPoint,
  PageHinkley,
  DifferenceOutlier,
  Volatility,
}

/// One extracted insight. The ordinal is the 1-based position assigned
/// at extraction time and is never renumbered by later filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRecord {
  pub ordinal: u32,
  pub kind: InsightKind,
  pub content: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<f64>,
}

/// An insight merged onto the chart by an update operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
  pub ordinal: u32,
  pub kind: InsightKind,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
  pub chart_kind: ChartKind,
  pub title: String,
  #[serde(default)]
  pub theme: Theme,
  pub x: AxisSpec,
  /// One entry, or two for dual-axis (left then right).
  pub y: Vec<AxisSpec>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub series_field: Option<String>,
  #[serde(default = "default_true")]
  pub animation: bool,
  #[serde(default)]
  pub tooltip_formatter: Formatter,
  #[serde(default)]
  pub data: Dataset,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub annotations: Vec<Annotation>,
}

fn default_true() -> bool {
  true
}

impl ChartSpec {
  pub fn primary_y(&self) -> Option<&AxisSpec> {
    self.y.first()
  }

  pub fn secondary_y(&self) -> Option<&AxisSpec> {
    self.y.get(1)
  }
}

/// The persisted `.json` artifact: the spec plus every insight extracted
/// for it, under their extraction-time ordinals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
  pub generated_at: DateTime<Utc>,
  pub spec: ChartSpec,
  #[serde(default)]
  pub insights: Vec<InsightRecord>,
}

impl SpecDocument {
  pub fn new(spec: ChartSpec, insights: Vec<InsightRecord>) -> Self {
    Self { generated_at: Utc::now(), spec, insights }
  }
}
