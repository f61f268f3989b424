//! Headless rendering: raster capture into an in-memory frame buffer,
//! or a self-contained interactive HTML document.
//!
//! The raster session is scoped: the bitmap backend only exists inside
//! one block of `render_png`, so it is released on every exit path,
//! including draw failure.

use anyhow::anyhow;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::insight::phrase::num;
use crate::request::OutputType;
use crate::spec::{ChartKind, ChartSpec, Theme};

pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 1000;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

struct Palette {
  background: RGBColor,
  text: RGBColor,
  grid: RGBColor,
  series: [RGBColor; 4],
}

impl Palette {
  fn for_theme(theme: Theme) -> Self {
    match theme {
      Theme::Light => Palette {
        background: RGBColor(255, 255, 255),
        text: RGBColor(40, 40, 40),
        grid: RGBColor(190, 190, 190),
        series: [
          RGBColor(31, 119, 180),
          RGBColor(255, 127, 14),
          RGBColor(44, 160, 44),
          RGBColor(214, 39, 40),
        ],
      },
      Theme::Dark => Palette {
        background: RGBColor(20, 20, 20),
        text: RGBColor(230, 230, 230),
        grid: RGBColor(70, 70, 70),
        series: [
          RGBColor(0, 191, 255),
          RGBColor(255, 165, 0),
          RGBColor(60, 220, 130),
          RGBColor(240, 80, 90),
        ],
      },
    }
  }
}

/// Render the spec to encoded bytes of the requested output kind.
pub async fn render(
  spec: &ChartSpec,
  width: Option<u32>,
  height: Option<u32>,
  output: OutputType,
) -> Result<Vec<u8>> {
  match output {
    OutputType::Png => {
      let spec = spec.clone();
      let width = width.unwrap_or(DEFAULT_WIDTH).max(64);
      let height = height.unwrap_or(DEFAULT_HEIGHT).max(64);
      tokio::task::spawn_blocking(move || render_png(spec, width, height))
        .await
        .map_err(|e| Error::Render(format!("drawing task did not complete: {e}")))?
    }
    OutputType::Html => Ok(render_html(spec)?.into_bytes()),
  }
}

/// Draw into an owned RGB frame buffer and encode it as PNG.
pub fn render_png(mut spec: ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
  // a raster capture must never show a mid-transition frame
  spec.animation = false;

  let mut frame = vec![0u8; width as usize * height as usize * 3];
  {
    let root = BitMapBackend::with_buffer(&mut frame, (width, height)).into_drawing_area();
    draw_chart(&root, &spec).map_err(|e| Error::Render(e.to_string()))?;
    root.present().map_err(|e| Error::Render(e.to_string()))?;
  }
  encode_png(&frame, width, height)
}

fn encode_png(frame: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
  use image::codecs::png::PngEncoder;
  use image::{ColorType, ImageEncoder};

  let mut bytes = Vec::new();
  PngEncoder::new(&mut bytes)
    .write_image(frame, width, height, ColorType::Rgb8)
    .map_err(|e| Error::Render(format!("png encoding failed: {e}")))?;
  Ok(bytes)
}

fn draw_chart(root: &Area<'_>, spec: &ChartSpec) -> anyhow::Result<()> {
  let palette = Palette::for_theme(spec.theme);
  root.fill(&palette.background).map_err(|e| anyhow!("fill: {e}"))?;

  match spec.chart_kind {
    ChartKind::Pie => draw_pie(root, spec, &palette)?,
    ChartKind::DualAxis => draw_dual_axis(root, spec, &palette)?,
    ChartKind::Scatter => draw_scatter(root, spec, &palette)?,
    _ => draw_cartesian(root, spec, &palette)?,
  }
  draw_annotations(root, spec, &palette)?;
  Ok(())
}

/// Y range with 10% padding; bars and areas are anchored at zero.
fn padded_range(values: &[f64], include_zero: bool) -> (f64, f64) {
  let mut min = f64::INFINITY;
  let mut max = f64::NEG_INFINITY;
  for v in values {
    min = min.min(*v);
    max = max.max(*v);
  }
  if !min.is_finite() || !max.is_finite() {
    return (0.0, 1.0);
  }
  if include_zero {
    min = min.min(0.0);
  }
  let pad = ((max - min) * 0.1).max(1e-6);
  (if include_zero && min == 0.0 { 0.0 } else { min - pad }, max + pad)
}

fn draw_cartesian(root: &Area<'_>, spec: &ChartSpec, palette: &Palette) -> anyhow::Result<()> {
  let y_axis = spec.primary_y().ok_or_else(|| anyhow!("no y column bound"))?;
  let pairs = spec.data.aligned_series(&spec.x.field, &y_axis.field);
  if pairs.is_empty() {
    return Err(anyhow!("no drawable rows for '{}'", y_axis.field));
  }
  let (labels, values): (Vec<String>, Vec<f64>) = pairs.into_iter().unzip();

  let anchored = matches!(spec.chart_kind, ChartKind::Bar | ChartKind::Area);
  let (y_min, y_max) = padded_range(&values, anchored);
  let x_max = values.len() as f64 - 0.5;

  let mut chart = ChartBuilder::on(root)
    .caption(&spec.title, ("sans-serif", 28).into_font().color(&palette.text))
    .margin(24)
    .x_label_area_size(48)
    .y_label_area_size(72)
    .build_cartesian_2d(-0.5f64..x_max, y_min..y_max)
    .map_err(|e| anyhow!("chart layout: {e}"))?;

  let x_formatter = &spec.x.label_formatter;
  let y_formatter = &y_axis.label_formatter;
  let x_fmt = |x: &f64| {
    let index = x.round();
    if index < 0.0 || (index - x).abs() > 1e-6 {
      return String::new();
    }
    labels
      .get(index as usize)
      .map(|label| x_formatter.apply(label))
      .unwrap_or_default()
  };
  let y_fmt = |y: &f64| y_formatter.apply(&num(*y));

  chart
    .configure_mesh()
    .x_labels(labels.len().min(12))
    .y_labels(10)
    .x_desc(spec.x.field.clone())
    .y_desc(y_axis.field.clone())
    .axis_style(&palette.grid)
    .light_line_style(palette.grid.mix(0.25))
    .label_style(("sans-serif", 14).into_font().color(&palette.text))
    .x_label_formatter(&x_fmt)
    .y_label_formatter(&y_fmt)
    .draw()
    .map_err(|e| anyhow!("mesh: {e}"))?;

  let color = palette.series[0];
  match spec.chart_kind {
    ChartKind::Bar => {
      chart
        .draw_series(values.iter().enumerate().map(|(i, v)| {
          Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *v)], color.filled())
        }))
        .map_err(|e| anyhow!("bars: {e}"))?;
    }
    ChartKind::Area => {
      chart
        .draw_series(AreaSeries::new(
          values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
          0.0,
          color.mix(0.35),
        ))
        .map_err(|e| anyhow!("area: {e}"))?;
      chart
        .draw_series(LineSeries::new(
          values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
          ShapeStyle::from(&color).stroke_width(2),
        ))
        .map_err(|e| anyhow!("area border: {e}"))?;
    }
    _ => {
      chart
        .draw_series(LineSeries::new(
          values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
          ShapeStyle::from(&color).stroke_width(3),
        ))
        .map_err(|e| anyhow!("line: {e}"))?;
    }
  }
  Ok(())
}

fn draw_scatter(root: &Area<'_>, spec: &ChartSpec, palette: &Palette) -> anyhow::Result<()> {
  let y_axis = spec.primary_y().ok_or_else(|| anyhow!("no y column bound"))?;
  let x_values = spec.data.numeric_series(&spec.x.field);
  let y_values = spec.data.numeric_series(&y_axis.field);

  // non-numeric x degrades to index positions
  let points: Vec<(f64, f64)> = if x_values.len() == y_values.len() && !x_values.is_empty() {
    x_values.into_iter().zip(y_values).collect()
  } else {
    y_values.into_iter().enumerate().map(|(i, v)| (i as f64, v)).collect()
  };
  if points.is_empty() {
    return Err(anyhow!("no drawable rows for '{}'", y_axis.field));
  }

  let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
  let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
  let (x_min, x_max) = padded_range(&xs, false);
  let (y_min, y_max) = padded_range(&ys, false);

  let mut chart = ChartBuilder::on(root)
    .caption(&spec.title, ("sans-serif", 28).into_font().color(&palette.text))
    .margin(24)
    .x_label_area_size(48)
    .y_label_area_size(72)
    .build_cartesian_2d(x_min..x_max, y_min..y_max)
    .map_err(|e| anyhow!("chart layout: {e}"))?;

  let x_formatter = &spec.x.label_formatter;
  let y_formatter = &y_axis.label_formatter;
  let x_fmt = |x: &f64| x_formatter.apply(&num(*x));
  let y_fmt = |y: &f64| y_formatter.apply(&num(*y));

  chart
    .configure_mesh()
    .x_desc(spec.x.field.clone())
    .y_desc(y_axis.field.clone())
    .axis_style(&palette.grid)
    .light_line_style(palette.grid.mix(0.25))
    .label_style(("sans-serif", 14).into_font().color(&palette.text))
    .x_label_formatter(&x_fmt)
    .y_label_formatter(&y_fmt)
    .draw()
    .map_err(|e| anyhow!("mesh: {e}"))?;

  chart
    .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 4, palette.series[0].filled())))
    .map_err(|e| anyhow!("points: {e}"))?;
  Ok(())
}

fn draw_dual_axis(root: &Area<'_>, spec: &ChartSpec, palette: &Palette) -> anyhow::Result<()> {
  let left_axis = spec.primary_y().ok_or_else(|| anyhow!("no y column bound"))?;
  let right_axis = spec.secondary_y().ok_or_else(|| anyhow!("dual-axis needs two y columns"))?;

  let pairs = spec.data.aligned_series(&spec.x.field, &left_axis.field);
  let right_values = spec.data.numeric_series(&right_axis.field);
  if pairs.is_empty() || right_values.is_empty() {
    return Err(anyhow!("no drawable rows for dual-axis chart"));
  }
  let (labels, left_values): (Vec<String>, Vec<f64>) = pairs.into_iter().unzip();

  let (left_min, left_max) = padded_range(&left_values, true);
  let (right_min, right_max) = padded_range(&right_values, false);
  let x_max = left_values.len() as f64 - 0.5;

  let mut chart = ChartBuilder::on(root)
    .caption(&spec.title, ("sans-serif", 28).into_font().color(&palette.text))
    .margin(24)
    .x_label_area_size(48)
    .y_label_area_size(72)
    .right_y_label_area_size(72)
    .build_cartesian_2d(-0.5f64..x_max, left_min..left_max)
    .map_err(|e| anyhow!("chart layout: {e}"))?
    .set_secondary_coord(-0.5f64..x_max, right_min..right_max);

  let x_formatter = &spec.x.label_formatter;
  let left_formatter = &left_axis.label_formatter;
  let x_fmt = |x: &f64| {
    let index = x.round();
    if index < 0.0 || (index - x).abs() > 1e-6 {
      return String::new();
    }
    labels
      .get(index as usize)
      .map(|label| x_formatter.apply(label))
      .unwrap_or_default()
  };
  let y_fmt = |y: &f64| left_formatter.apply(&num(*y));

  chart
    .configure_mesh()
    .x_labels(labels.len().min(12))
    .y_labels(10)
    .x_desc(spec.x.field.clone())
    .y_desc(left_axis.field.clone())
    .axis_style(&palette.grid)
    .light_line_style(palette.grid.mix(0.25))
    .label_style(("sans-serif", 14).into_font().color(&palette.text))
    .x_label_formatter(&x_fmt)
    .y_label_formatter(&y_fmt)
    .draw()
    .map_err(|e| anyhow!("mesh: {e}"))?;

  chart
    .configure_secondary_axes()
    .y_desc(right_axis.field.clone())
    .label_style(("sans-serif", 14).into_font().color(&palette.text))
    .draw()
    .map_err(|e| anyhow!("secondary axis: {e}"))?;

  let bar_color = palette.series[0];
  chart
    .draw_series(left_values.iter().enumerate().map(|(i, v)| {
      Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *v)], bar_color.mix(0.7).filled())
    }))
    .map_err(|e| anyhow!("bars: {e}"))?;

  chart
    .draw_secondary_series(LineSeries::new(
      right_values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
      ShapeStyle::from(&palette.series[1]).stroke_width(3),
    ))
    .map_err(|e| anyhow!("secondary line: {e}"))?;
  Ok(())
}

fn draw_pie(root: &Area<'_>, spec: &ChartSpec, palette: &Palette) -> anyhow::Result<()> {
  let y_axis = spec.primary_y().ok_or_else(|| anyhow!("no y column bound"))?;
  let pairs = spec.data.aligned_series(&spec.x.field, &y_axis.field);

  let mut labels: Vec<String> = Vec::new();
  let mut sizes: Vec<f64> = Vec::new();
  for (label, value) in pairs {
    if value > 0.0 {
      labels.push(label);
      sizes.push(value);
    }
  }
  if sizes.is_empty() {
    return Err(anyhow!("no positive values to draw as a pie"));
  }

  let colors: Vec<RGBColor> =
    (0..sizes.len()).map(|i| palette.series[i % palette.series.len()]).collect();

  let (width, height) = root.dim_in_pixel();
  let center = (width as i32 / 2, height as i32 / 2 + 12);
  let radius = f64::from(width.min(height)) * 0.32;

  let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
  pie.label_style(("sans-serif", 16).into_font().color(&palette.text));
  root.draw(&pie).map_err(|e| anyhow!("pie: {e}"))?;

  root
    .draw(&Text::new(
      spec.title.clone(),
      (24, 20),
      ("sans-serif", 28).into_font().color(&palette.text),
    ))
    .map_err(|e| anyhow!("title: {e}"))?;
  Ok(())
}

/// Selected insights, stacked as a text block under the title.
fn draw_annotations(root: &Area<'_>, spec: &ChartSpec, palette: &Palette) -> anyhow::Result<()> {
  for (index, annotation) in spec.annotations.iter().enumerate() {
    let y = 56 + index as i32 * 20;
    root
      .draw(&Text::new(
        format!("* {}", annotation.content),
        (28, y),
        ("sans-serif", 14).into_font().color(&palette.series[3]),
      ))
      .map_err(|e| anyhow!("annotation: {e}"))?;
  }
  Ok(())
}

/// A self-contained HTML document: embedded spec JSON plus a small
/// mounting script. No headless drawing session is opened for this
/// path; the chart sizes itself to its container.
pub fn render_html(spec: &ChartSpec) -> Result<String> {
  let encoded = serde_json::to_string_pretty(spec)?.replace("</", "<\\/");

  Ok(format!(
    r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ font-family: sans-serif; margin: 0; padding: 16px; }}
  #chart {{ width: 100%; height: 70vh; }}
  .annotations li {{ margin: 4px 0; }}
</style>
</head>
<body>
<h2>{title}</h2>
<div id="chart"></div>
<ol class="annotations" id="annotations"></ol>
<script type="application/json" id="chart-spec">
{encoded}
</script>
<script>
(function () {{
  var spec = JSON.parse(document.getElementById("chart-spec").textContent);
  var rows = spec.data || [];
  var xField = spec.x.field;
  var yField = spec.y[0].field;
  var mount = document.getElementById("chart");
  var w = mount.clientWidth || 960;
  var h = mount.clientHeight || 480;
  var pad = 48;
  var values = rows.map(function (r) {{ return Number(r[yField]); }});
  var max = Math.max.apply(null, values.concat([0]));
  var min = Math.min.apply(null, values.concat([0]));
  var span = (max - min) || 1;
  var sx = function (i) {{ return pad + (w - 2 * pad) * (rows.length > 1 ? i / (rows.length - 1) : 0.5); }};
  var sy = function (v) {{ return h - pad - (h - 2 * pad) * ((v - min) / span); }};
  var svg = ['<svg xmlns="http://www.w3.org/2000/svg" width="' + w + '" height="' + h + '">'];
  if (spec.chartKind === "bar" || spec.chartKind === "pie") {{
    var bw = (w - 2 * pad) / Math.max(rows.length, 1) * 0.7;
    rows.forEach(function (r, i) {{
      var v = Number(r[yField]);
      svg.push('<rect x="' + (sx(i) - bw / 2) + '" y="' + sy(v) + '" width="' + bw +
        '" height="' + (sy(min) - sy(v)) + '" fill="#1f77b4"><title>' +
        r[xField] + ": " + v + '</title></rect>');
    }});
  }} else if (spec.chartKind === "scatter") {{
    rows.forEach(function (r, i) {{
      var v = Number(r[yField]);
      svg.push('<circle cx="' + sx(i) + '" cy="' + sy(v) + '" r="4" fill="#1f77b4"><title>' +
        r[xField] + ": " + v + '</title></circle>');
    }});
  }} else {{
    var points = rows.map(function (r, i) {{ return sx(i) + "," + sy(Number(r[yField])); }});
    svg.push('<polyline fill="none" stroke="#1f77b4" stroke-width="2" points="' +
      points.join(" ") + '"/>');
  }}
  svg.push('<line x1="' + pad + '" y1="' + sy(min) + '" x2="' + (w - pad) + '" y2="' + sy(min) +
    '" stroke="#888"/>');
  svg.push("</svg>");
  mount.innerHTML = svg.join("");
  var list = document.getElementById("annotations");
  (spec.annotations || []).forEach(function (a) {{
    var item = document.createElement("li");
    item.textContent = a.content;
    list.appendChild(item);
  }});
}})();
</script>
</body>
</html>
"##,
    title = html_escape(&spec.title),
    encoded = encoded,
  ))
}

fn html_escape(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::Dataset;
  use crate::spec::{Annotation, AxisSpec, Formatter, InsightKind};
  use serde_json::json;

  fn line_spec() -> ChartSpec {
    ChartSpec {
      chart_kind: ChartKind::Line,
      title: "Revenue <by> month".to_string(),
      theme: Theme::Light,
      x: AxisSpec::new("month"),
      y: vec![AxisSpec::new("revenue")],
      series_field: None,
      animation: true,
      tooltip_formatter: Formatter::Raw,
      data: Dataset::new(
        serde_json::from_value(json!([
          {"month": "Jan", "revenue": 10},
          {"month": "Feb", "revenue": 20},
          {"month": "Mar", "revenue": 15}
        ]))
        .unwrap(),
      ),
      annotations: vec![Annotation {
        ordinal: 2,
        kind: InsightKind::ExtremeValue,
        content: "revenue peaks in Feb".to_string(),
      }],
    }
  }

  #[test]
  fn html_document_is_self_contained() {
    let html = render_html(&line_spec()).unwrap();
    assert!(html.contains("chart-spec"));
    assert!(html.contains("__formatter__:raw"));
    assert!(html.contains("revenue peaks in Feb"));
    // embedded title is escaped
    assert!(html.contains("Revenue &lt;by&gt; month"));
    // no external script or stylesheet references
    assert!(!html.contains("src=\"http"));
  }

  #[test]
  fn html_embeds_the_bound_rows() {
    let html = render_html(&line_spec()).unwrap();
    assert!(html.contains("\"Feb\""));
  }

  #[test]
  fn png_encoding_produces_a_png_header() {
    let frame = vec![255u8; 16 * 16 * 3];
    let bytes = encode_png(&frame, 16, 16).unwrap();
    assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
  }

  #[test]
  fn padded_range_handles_bars_and_lines() {
    let (low, high) = padded_range(&[10.0, 20.0], true);
    assert_eq!(low, 0.0);
    assert!(high > 20.0);

    let (low, high) = padded_range(&[10.0, 20.0], false);
    assert!(low < 10.0);
    assert!(high > 20.0);
  }
}
