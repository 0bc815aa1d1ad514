use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::GdmError;

const HEIGHT: f64 = 520.0;
const SLOT_WIDTH: f64 = 110.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 130.0;
const DENSITY_POINTS: usize = 64;
const PALETTE: [&str; 6] = [
    "#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860",
];

/// Values of one metric for one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub graph: String,
    pub values: Vec<f64>,
}

pub fn axis_label(metric: &str) -> String {
    match metric {
        "gpu_time_ms" => "GPU Time (ms)".to_string(),
        "edge_throughput" => "Edge Throughput (MTEPS)".to_string(),
        other => other.to_string(),
    }
}

/// Reads `metric` per graph from a results CSV, keeping the order in which
/// graphs first appear. Empty cells are skipped.
pub fn load_samples(path: &Path, metric: &str) -> Result<Vec<Sample>, GdmError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|err| GdmError::Csv(err.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|err| GdmError::Csv(err.to_string()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| GdmError::Plot(format!("column `{name}` not found in {}", path.display())))
    };
    let graph_col = column("graph")?;
    let metric_col = column(metric)?;

    let mut samples: Vec<Sample> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| GdmError::Csv(err.to_string()))?;
        let graph = record.get(graph_col).unwrap_or_default();
        let cell = record.get(metric_col).unwrap_or_default().trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
            continue;
        }
        let value: f64 = cell
            .parse()
            .map_err(|_| GdmError::Csv(format!("not a number in `{metric}`: {cell}")))?;
        match samples.iter_mut().find(|sample| sample.graph == graph) {
            Some(sample) => sample.values.push(value),
            None => samples.push(Sample {
                graph: graph.to_string(),
                values: vec![value],
            }),
        }
    }

    if samples.is_empty() {
        return Err(GdmError::Plot(format!(
            "no `{metric}` values in {}",
            path.display()
        )));
    }
    Ok(samples)
}

pub fn plot_csv(input: &Path, output: &Path, metric: &str) -> Result<(), GdmError> {
    let is_svg = output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if !is_svg {
        return Err(GdmError::UnsupportedPlotFormat(output.to_path_buf()));
    }
    let samples = load_samples(input, metric)?;
    let svg = render_violin_svg(&samples, &axis_label(metric));
    fs::write(output, svg)
        .map_err(|err| GdmError::Filesystem(format!("{}: {err}", output.display())))?;
    info!(output = %output.display(), graphs = samples.len(), "plot written");
    Ok(())
}

/// Scott's rule, widened to a fraction of `span` so constant samples still
/// get a visible shape.
fn bandwidth(values: &[f64], span: f64) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let scott = 1.06 * std * n.powf(-0.2);
    scott.max(span * 0.02)
}

fn density(values: &[f64], bw: f64, at: f64) -> f64 {
    let norm = 1.0 / (values.len() as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    values
        .iter()
        .map(|v| (-0.5 * ((at - v) / bw).powi(2)).exp())
        .sum::<f64>()
        * norm
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One violin per sample on a shared y axis, graphs along x.
pub fn render_violin_svg(samples: &[Sample], y_label: &str) -> String {
    let width = MARGIN_LEFT + MARGIN_RIGHT + SLOT_WIDTH * samples.len().max(1) as f64;
    let plot_bottom = HEIGHT - MARGIN_BOTTOM;
    let plot_height = plot_bottom - MARGIN_TOP;

    let all = samples.iter().flat_map(|s| s.values.iter().copied());
    let (lo, hi) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = if (hi - lo).abs() > f64::EPSILON {
        hi - lo
    } else {
        lo.abs().max(1.0)
    };
    let bandwidths: Vec<f64> = samples.iter().map(|s| bandwidth(&s.values, span)).collect();
    let max_bw = bandwidths.iter().copied().fold(0.0, f64::max);
    let y_min = lo - 2.0 * max_bw;
    let y_max = hi + 2.0 * max_bw;
    let to_y = |v: f64| plot_bottom - (v - y_min) / (y_max - y_min) * plot_height;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{HEIGHT:.0}" viewBox="0 0 {width:.0} {HEIGHT:.0}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(
        svg,
        r##"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{:.1}" height="{plot_height:.1}" fill="#eaeaf2"/>"##,
        width - MARGIN_LEFT - MARGIN_RIGHT
    );

    for tick in 0..=5 {
        let value = y_min + (y_max - y_min) * tick as f64 / 5.0;
        let y = to_y(value);
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#ffffff"/>"##,
            width - MARGIN_RIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{value:.2}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0
        );
    }

    for (i, (sample, bw)) in samples.iter().zip(&bandwidths).enumerate() {
        let center = MARGIN_LEFT + SLOT_WIDTH * (i as f64 + 0.5);
        let (s_lo, s_hi) = sample
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        let start = s_lo - 2.0 * bw;
        let step = (s_hi - s_lo + 4.0 * bw) / (DENSITY_POINTS - 1) as f64;
        let curve: Vec<(f64, f64)> = (0..DENSITY_POINTS)
            .map(|k| {
                let at = start + step * k as f64;
                (at, density(&sample.values, *bw, at))
            })
            .collect();
        let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);
        let half = SLOT_WIDTH * 0.4;

        let mut points: Vec<String> = curve
            .iter()
            .map(|(at, d)| format!("{:.1},{:.1}", center + d / peak * half, to_y(*at)))
            .collect();
        points.extend(
            curve
                .iter()
                .rev()
                .map(|(at, d)| format!("{:.1},{:.1}", center - d / peak * half, to_y(*at))),
        );
        let _ = writeln!(
            svg,
            r##"<polygon class="violin" points="{}" fill="{}" stroke="#3a3a3a" stroke-width="1"/>"##,
            points.join(" "),
            PALETTE[i % PALETTE.len()]
        );

        let m = to_y(median(&sample.values));
        let _ = writeln!(
            svg,
            r##"<line x1="{:.1}" y1="{m:.1}" x2="{:.1}" y2="{m:.1}" stroke="#ffffff" stroke-width="2"/>"##,
            center - half * 0.3,
            center + half * 0.3
        );

        let label_y = plot_bottom + 14.0;
        let _ = writeln!(
            svg,
            r#"<text x="{center:.1}" y="{label_y:.1}" text-anchor="end" transform="rotate(-45 {center:.1} {label_y:.1})">{}</text>"#,
            escape(&sample.graph)
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Graph</text>"#,
        MARGIN_LEFT + (width - MARGIN_LEFT - MARGIN_RIGHT) / 2.0,
        HEIGHT - 12.0
    );
    let y_center = MARGIN_TOP + plot_height / 2.0;
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{y_center:.1}" text-anchor="middle" transform="rotate(-90 18 {y_center:.1})">{}</text>"#,
        escape(y_label)
    );
    svg.push_str("</svg>\n");
    svg
}
