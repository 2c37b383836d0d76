// ============================================================
// Layer 6 - Terminal Charts
// ============================================================
// Fixed-size text line plots of training curves.
//
//   Loss
//   0.70 ┤ o
//        │  *
//        │     o
//        │        *
//   0.30 ┤           *
//        └────────────────
//          1       epoch       3
//   * training   o testing
//
// Each series gets its own marker; where two series share a cell
// the later one wins.

use std::fmt::Write as _;

use crate::domain::history::TrainingHistory;

pub const PLOT_WIDTH: usize  = 48;
pub const PLOT_HEIGHT: usize = 12;

const MARKERS: [char; 4] = ['*', 'o', '+', 'x'];

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label:  String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self { label: label.into(), values }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title:  String,
    pub series: Vec<Series>,
}

impl LineChart {
    pub fn new(title: impl Into<String>, series: Vec<Series>) -> Self {
        Self { title: title.into(), series }
    }

    pub fn render(&self) -> String {
        render(self, PLOT_WIDTH, PLOT_HEIGHT)
    }
}

/// The two illustrative charts shown before any real history exists
pub fn placeholder_charts() -> Vec<LineChart> {
    vec![
        LineChart::new(
            "Training and Testing Loss",
            vec![
                Series::new("training", vec![0.6, 0.4, 0.3]),
                Series::new("testing", vec![0.7, 0.5, 0.35]),
            ],
        ),
        LineChart::new(
            "Training and Testing Accuracy",
            vec![
                Series::new("training", vec![0.75, 0.80, 0.85]),
                Series::new("testing", vec![0.72, 0.78, 0.83]),
            ],
        ),
    ]
}

/// Accuracy and loss charts of a real run
pub fn history_charts(history: &TrainingHistory) -> Vec<LineChart> {
    vec![
        LineChart::new(
            "Model Accuracy",
            vec![
                Series::new("training", history.accuracies()),
                Series::new("validation", history.val_accuracies()),
            ],
        ),
        LineChart::new(
            "Model Loss",
            vec![
                Series::new("training", history.losses()),
                Series::new("validation", history.val_losses()),
            ],
        ),
    ]
}

fn render(chart: &LineChart, width: usize, height: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", chart.title);

    let points = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite());
    let (lo, hi) = points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let n = chart.series.iter().map(|s| s.values.len()).max().unwrap_or(0);

    if n == 0 || !lo.is_finite() {
        let _ = writeln!(out, "  (no data)");
        return out;
    }

    // Flat data still needs a non-zero span
    let span = if hi > lo { hi - lo } else { 1.0 };
    let mut grid = vec![vec![' '; width]; height];

    for (si, series) in chart.series.iter().enumerate() {
        let marker = MARKERS[si % MARKERS.len()];
        for (i, v) in series.values.iter().enumerate().filter(|(_, v)| v.is_finite()) {
            let col = if n == 1 { 0 } else { i * (width - 1) / (n - 1) };
            let row = ((hi - v) / span * (height - 1) as f64).round() as usize;
            grid[row.min(height - 1)][col] = marker;
        }
    }

    let top    = format!("{hi:.2}");
    let bottom = format!("{lo:.2}");
    let gutter = top.len().max(bottom.len());

    for (r, line) in grid.iter().enumerate() {
        let (label, tick) = match r {
            0 => (top.as_str(), '┤'),
            r if r == height - 1 => (bottom.as_str(), '┤'),
            _ => ("", '│'),
        };
        let cells: String = line.iter().collect();
        let _ = writeln!(out, "{label:>gutter$} {tick}{}", cells.trim_end());
    }
    let _ = writeln!(out, "{:>gutter$} └{}", "", "─".repeat(width));

    let first = "1";
    let last  = n.to_string();
    let axis  = "epoch";
    let pad   = width.saturating_sub(first.len() + last.len() + axis.len()) / 2;
    let _ = writeln!(
        out,
        "{:>gutter$}  {first}{:pad$}{axis}{:pad$}{last}",
        "", "", "",
    );

    let legend: Vec<String> = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", MARKERS[i % MARKERS.len()], s.label))
        .collect();
    let _ = writeln!(out, "{:>gutter$}  {}", "", legend.join("   "));
    out
}
