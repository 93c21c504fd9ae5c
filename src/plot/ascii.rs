//! ASCII plotting for terminal output.
//!
//! Fixed-size grid with deterministic output (golden tests rely on it).
//!
//! Plot elements:
//! - single series: `o` markers joined by a `-` line
//! - datasets: markers `1`, `2`, ... per dataset, each joined by `.`

use crate::domain::{ChartData, ChartSeries, Dataset, Tab};

/// Render whatever a tab holds.
pub fn render_tab_plot(tab: &Tab, width: usize, height: usize) -> String {
    match &tab.chart_data {
        ChartData::Series(series) => render_series_plot(series, width, height),
        ChartData::Datasets(datasets) => render_datasets_plot(datasets, width, height),
    }
}

/// Plot one series: x is the point index, y the value.
pub fn render_series_plot(series: &ChartSeries, width: usize, height: usize) -> String {
    let lines = [Line {
        values: &series.values,
        mark: 'o',
        stroke: '-',
    }];
    let header = axis_header(&series.labels);
    render_plot(&header, &lines, width, height)
}

/// Plot several datasets on one axis, with a legend below the grid.
pub fn render_datasets_plot(datasets: &[Dataset], width: usize, height: usize) -> String {
    let lines: Vec<Line<'_>> = datasets
        .iter()
        .enumerate()
        .map(|(i, d)| Line {
            values: &d.values,
            mark: marker(i),
            stroke: '.',
        })
        .collect();
    let labels = datasets.first().map(|d| d.labels.as_slice()).unwrap_or(&[]);

    let mut out = render_plot(&axis_header(labels), &lines, width, height);
    for (i, d) in datasets.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", marker(i), d.name));
    }
    out
}

struct Line<'a> {
    values: &'a [f64],
    mark: char,
    stroke: char,
}

fn marker(i: usize) -> char {
    char::from_digit((i % 9 + 1) as u32, 10).unwrap_or('*')
}

fn axis_header(labels: &[String]) -> String {
    match (labels.first(), labels.last()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "(sin datos)".to_string(),
    }
}

fn render_plot(header: &str, lines: &[Line<'_>], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(lines).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Strokes first so markers overlay them.
    for line in lines {
        draw_series(&mut grid, line, y_min, y_max);
    }
    for line in lines {
        let n = line.values.len();
        for (i, &v) in line.values.iter().enumerate() {
            let x = map_x(i, n, width);
            let y = map_y(v, y_min, y_max, height);
            grid[y][x] = line.mark;
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: {header} | y=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn y_range(lines: &[Line<'_>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &v in lines.iter().flat_map(|l| l.values.iter()) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        None
    } else if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: center it.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (max).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], line: &Line<'_>, y_min: f64, y_max: f64) {
    let n = line.values.len();
    if n < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev: Option<(usize, usize)> = None;
    for (i, &v) in line.values.iter().enumerate() {
        let point = (map_x(i, n, width), map_y(v, y_min, y_max, height));
        if let Some(from) = prev {
            draw_line(grid, from, point, line.stroke);
        }
        prev = Some(point);
    }
}

/// Integer line drawing (Bresenham). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
