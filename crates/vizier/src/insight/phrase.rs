//! English/Chinese phrasing of analyzer findings.

use crate::request::Language;

/// Trim a number for prose: integers bare, otherwise two decimals.
pub fn num(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{}", value as i64)
  } else {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
  }
}

pub fn overall_trend(lang: Language, measure: &str, rising: bool, change_pct: f64) -> String {
  match lang {
    Language::En => format!(
      "{measure} shows an overall {} trend, changing by {}% from start to end",
      if rising { "rising" } else { "falling" },
      num(change_pct)
    ),
    Language::Zh => format!(
      "{measure}整体呈{}趋势，从起点到终点变化了{}%",
      if rising { "上升" } else { "下降" },
      num(change_pct)
    ),
  }
}

pub fn abnormal_trend(lang: Language, measure: &str, rising_overall: bool) -> String {
  match lang {
    Language::En => format!(
      "the most recent values of {measure} move against its overall {} trend",
      if rising_overall { "rising" } else { "falling" }
    ),
    Language::Zh => format!(
      "{measure}最近的数据走势与整体{}趋势相反",
      if rising_overall { "上升" } else { "下降" }
    ),
  }
}

pub fn pearson(lang: Language, a: &str, b: &str, r: f64) -> String {
  let direction_en = if r >= 0.0 { "positively" } else { "negatively" };
  let direction_zh = if r >= 0.0 { "正" } else { "负" };
  match lang {
    Language::En => {
      format!("{a} and {b} are strongly {direction_en} correlated (Pearson r = {})", num(r))
    }
    Language::Zh => format!("{a}与{b}呈强{direction_zh}相关（皮尔逊系数 r = {}）", num(r)),
  }
}

pub fn spearman(lang: Language, a: &str, b: &str, rho: f64) -> String {
  let direction_en = if rho >= 0.0 { "increases" } else { "decreases" };
  let direction_zh = if rho >= 0.0 { "上升" } else { "下降" };
  match lang {
    Language::En => format!(
      "the rank order of {b} consistently {direction_en} with {a} (Spearman rho = {})",
      num(rho)
    ),
    Language::Zh => {
      format!("{b}的排序随{a}稳定{direction_zh}（斯皮尔曼系数 rho = {}）", num(rho))
    }
  }
}

pub fn extreme(lang: Language, measure: &str, label: &str, value: f64, is_max: bool) -> String {
  match lang {
    Language::En => format!(
      "{measure} reaches its {} of {} at {label}",
      if is_max { "maximum" } else { "minimum" },
      num(value)
    ),
    Language::Zh => format!(
      "{measure}在{label}达到{}值 {}",
      if is_max { "最大" } else { "最小" },
      num(value)
    ),
  }
}

pub fn majority(lang: Language, measure: &str, label: &str, share_pct: f64) -> String {
  match lang {
    Language::En => {
      format!("{label} accounts for {}% of total {measure}, more than all others combined", num(share_pct))
    }
    Language::Zh => format!("{label}占{measure}总量的{}%，超过其余所有项之和", num(share_pct)),
  }
}

pub fn statistics_abnormal(lang: Language, measure: &str, label: &str, value: f64, z: f64) -> String {
  match lang {
    Language::En => format!(
      "{measure} at {label} ({}) deviates {} standard deviations from the mean",
      num(value),
      num(z.abs())
    ),
    Language::Zh => {
      format!("{label}的{measure}（{}）偏离均值 {} 个标准差", num(value), num(z.abs()))
    }
  }
}

pub fn statistics_base(lang: Language, measure: &str, mean: f64, median: f64) -> String {
  match lang {
    Language::En => format!(
      "the distribution of {measure} is skewed: mean {} vs median {}",
      num(mean),
      num(median)
    ),
    Language::Zh => format!("{measure}的分布有偏：均值 {}，中位数 {}", num(mean), num(median)),
  }
}

pub fn density_outlier(lang: Language, measure: &str, label: &str, value: f64) -> String {
  match lang {
    Language::En => {
      format!("{measure} at {label} ({}) sits isolated from the rest of the data", num(value))
    }
    Language::Zh => format!("{label}的{measure}（{}）与其他数据点明显分离", num(value)),
  }
}

pub fn local_outlier(lang: Language, measure: &str, label: &str, value: f64) -> String {
  match lang {
    Language::En => {
      format!("{measure} at {label} ({}) is an outlier relative to its neighborhood", num(value))
    }
    Language::Zh => format!("{label}的{measure}（{}）相对邻近数据是离群点", num(value)),
  }
}

pub fn turning_point(lang: Language, measure: &str, label: &str, value: f64, peak: bool) -> String {
  match lang {
    Language::En => format!(
      "{measure} turns at {label}, {} at {}",
      if peak { "peaking" } else { "bottoming out" },
      num(value)
    ),
    Language::Zh => format!(
      "{measure}在{label}出现拐点，{}于 {}",
      if peak { "见顶" } else { "触底" },
      num(value)
    ),
  }
}

pub fn level_shift(lang: Language, measure: &str, label: &str) -> String {
  match lang {
    Language::En => format!("the level of {measure} shifts around {label}"),
    Language::Zh => format!("{measure}的水平在{label}附近发生了跳变"),
  }
}

pub fn difference_outlier(
  lang: Language,
  measure: &str,
  from_label: &str,
  to_label: &str,
  delta: f64,
) -> String {
  let jump_en = if delta >= 0.0 { "jumps" } else { "drops" };
  let jump_zh = if delta >= 0.0 { "骤增" } else { "骤减" };
  match lang {
    Language::En => format!(
      "{measure} {jump_en} by {} between {from_label} and {to_label}, far beyond its usual step",
      num(delta.abs())
    ),
    Language::Zh => {
      format!("{measure}从{from_label}到{to_label}{jump_zh} {}，远超平常波动", num(delta.abs()))
    }
  }
}

pub fn volatility(lang: Language, measure: &str, cv: f64) -> String {
  match lang {
    Language::En => format!(
      "{measure} is highly volatile: its standard deviation is {}% of the mean",
      num(cv * 100.0)
    ),
    Language::Zh => format!("{measure}波动剧烈：标准差达到均值的 {}%", num(cv * 100.0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn num_trims_trailing_zeros() {
    assert_eq!(num(12.0), "12");
    assert_eq!(num(12.50), "12.5");
    assert_eq!(num(-3.456), "-3.46");
  }

  #[test]
  fn phrasing_follows_language_tag() {
    let en = overall_trend(Language::En, "revenue", true, 42.0);
    let zh = overall_trend(Language::Zh, "revenue", true, 42.0);
    assert!(en.contains("rising"));
    assert!(zh.contains("上升"));
  }
}
