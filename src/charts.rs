use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{FinanzasError, Result};
use crate::fmt::pesos_tick;
use crate::models::{CategorySummary, FoodHistory, MonthlySummary};

pub const MONTHLY_CHART: &str = "ingresos_vs_egresos_por_mes.png";
pub const CATEGORY_CHART: &str = "gastos_por_categoria.png";
pub const HISTORY_CHART: &str = "historico_restaurant_food.png";
pub const TEMPORAL_CHART: &str = "evolucion_temporal.png";

const WIDE: (u32, u32) = (1200, 600);
const SQUARE: (u32, u32) = (1000, 800);
const HISTOGRAM_BINS: usize = 10;
const MAX_BARS: usize = 30;
const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

// tab10
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for FinanzasError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        FinanzasError::Render(e.to_string())
    }
}

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Registers the bundled font under `FONT`, once per process. Text drawn
/// before this succeeds has no glyph source.
fn ensure_font() -> Result<()> {
    let ready = *FONT_READY.get_or_init(|| {
        register_font(FONT, FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if ready {
        Ok(())
    } else {
        Err(FinanzasError::Render(format!("bundled font for '{FONT}' could not be loaded")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
    Histogram,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub file_name: String,
    pub path: PathBuf,
}

/// Writes PNG charts into one images folder, at `<dir>/<file name>`.
pub struct ChartWriter {
    dir: PathBuf,
}

impl ChartWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        ensure_font()?;
        std::fs::create_dir_all(&self.dir)?;
        Ok(self.path_for(file_name))
    }

    fn done(kind: ChartKind, file_name: &str, path: PathBuf) -> RenderedChart {
        tracing::debug!(path = %path.display(), ?kind, "chart written");
        RenderedChart {
            kind,
            file_name: file_name.to_string(),
            path,
        }
    }

    /// Grouped bars of income and expense per month.
    pub fn monthly_bars(&self, summary: &MonthlySummary) -> Result<RenderedChart> {
        let path = self.prepare(MONTHLY_CHART)?;
        let labels: Vec<String> = summary.months().into_iter().map(String::from).collect();
        let series = [
            ("Ingresos", summary.rows.iter().map(|r| r.income).collect::<Vec<_>>()),
            ("Egresos", summary.rows.iter().map(|r| r.expense).collect()),
        ];
        draw_bars(&path, "Ingresos vs Egresos por Mes", "Mes", "Monto", &labels, &series)?;
        Ok(Self::done(ChartKind::Bar, MONTHLY_CHART, path))
    }

    /// Pie of expense share per category, clockwise from the top.
    pub fn category_pie(&self, summary: &CategorySummary) -> Result<RenderedChart> {
        let slices: Vec<(&str, f64)> = summary
            .items
            .iter()
            .filter(|i| i.total > 0.0)
            .map(|i| (i.name.as_str(), i.total))
            .collect();
        if slices.is_empty() {
            return Err(FinanzasError::Render(
                "Gastos por Categoría: no positive expense totals".to_string(),
            ));
        }
        let path = self.prepare(CATEGORY_CHART)?;
        draw_pie(&path, "Gastos por Categoría", &slices)?;
        Ok(Self::done(ChartKind::Pie, CATEGORY_CHART, path))
    }

    /// One line per restaurant/food category, y ticks in pesos.
    pub fn history_lines(&self, history: &FoodHistory) -> Result<RenderedChart> {
        let path = self.prepare(HISTORY_CHART)?;
        let series: Vec<(&str, Vec<f64>)> = history
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), history.series(i)))
            .collect();
        draw_lines(
            &path,
            "Histórico mensual de gastos: Restaurant y Food",
            &history.months,
            &series,
        )?;
        Ok(Self::done(ChartKind::Line, HISTORY_CHART, path))
    }

    pub fn histogram(&self, column: &str, values: &[f64]) -> Result<RenderedChart> {
        let file_name = format!("histograma_{column}.png");
        let Some(bins) = bin_counts(values, HISTOGRAM_BINS) else {
            return Err(FinanzasError::Render(format!("{column}: no numeric values")));
        };
        let path = self.prepare(&file_name)?;
        draw_histogram(&path, &format!("Distribución de {column}"), column, &bins)?;
        Ok(Self::done(ChartKind::Histogram, &file_name, path))
    }

    /// Bars of value counts, the most frequent values only.
    pub fn value_counts(&self, column: &str, counts: &[(String, usize)]) -> Result<RenderedChart> {
        let file_name = format!("barras_{column}.png");
        let path = self.prepare(&file_name)?;
        let top = &counts[..counts.len().min(MAX_BARS)];
        let labels: Vec<String> = top.iter().map(|(v, _)| v.clone()).collect();
        let series = [(column, top.iter().map(|(_, n)| *n as f64).collect::<Vec<_>>())];
        draw_bars(
            &path,
            &format!("Distribución de {column}"),
            column,
            "Cantidad",
            &labels,
            &series,
        )?;
        Ok(Self::done(ChartKind::Bar, &file_name, path))
    }

    /// Value over time; points must be sorted by date.
    pub fn temporal(&self, column: &str, points: &[(NaiveDate, f64)]) -> Result<RenderedChart> {
        let Some(&(first, _)) = points.first() else {
            return Err(FinanzasError::Render(format!("{column}: no dated values")));
        };
        let path = self.prepare(TEMPORAL_CHART)?;
        draw_timeline(&path, "Evolución Temporal", column, first, points)?;
        Ok(Self::done(ChartKind::Line, TEMPORAL_CHART, path))
    }
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Start angle and sweep (radians, screen coordinates) of each slice. The
/// first slice starts at 12 o'clock and angles grow clockwise.
pub fn pie_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let sum: f64 = values.iter().sum();
    let mut start = -FRAC_PI_2;
    values
        .iter()
        .map(|v| {
            let sweep = v / sum * TAU;
            let slice = (start, sweep);
            start += sweep;
            slice
        })
        .collect()
}

pub struct Bins {
    pub low: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

/// Equal-width bins over [min, max]; the max value falls into the last bin.
pub fn bin_counts(values: &[f64], bins: usize) -> Option<Bins> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return None;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (high - low) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - low) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Bins { low, width, counts })
}

fn y_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let bottom = if lo < 0.0 { lo - span * 0.1 } else { 0.0 };
    (bottom, hi + span * 0.1)
}

fn index_label(labels: &[String], x: f64) -> String {
    let r = x.round();
    if (x - r).abs() > 0.01 || r < 0.0 {
        return String::new();
    }
    labels.get(r as usize).cloned().unwrap_or_default()
}

fn nothing_to_plot(title: &str) -> FinanzasError {
    FinanzasError::Render(format!("{title}: nothing to plot"))
}

fn centered(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    series: &[(&str, Vec<f64>)],
) -> Result<()> {
    if labels.is_empty() || series.is_empty() {
        return Err(nothing_to_plot(title));
    }
    let n = labels.len();
    let (y_min, y_max) = y_bounds(series.iter().flat_map(|(_, v)| v.iter().copied()));

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)?;

    let label_at = |x: &f64| index_label(labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    let group = 0.8;
    let bar = group / series.len() as f64;
    for (s, (name, values)) in series.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        let offset = -group / 2.0 + s as f64 * bar;
        chart
            .draw_series(values.iter().enumerate().map(|(i, v)| {
                let x0 = i as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + bar, *v)], color.filled())
            }))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }
    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

fn draw_lines(
    path: &Path,
    title: &str,
    labels: &[String],
    series: &[(&str, Vec<f64>)],
) -> Result<()> {
    if labels.is_empty() || series.is_empty() {
        return Err(nothing_to_plot(title));
    }
    let n = labels.len();
    let (y_min, y_max) = y_bounds(series.iter().flat_map(|(_, v)| v.iter().copied()));

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)?;

    let label_at = |x: &f64| index_label(labels, *x);
    let money_tick = |y: &f64| pesos_tick(*y);
    chart
        .configure_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .y_label_formatter(&money_tick)
        .x_desc("Mes")
        .y_desc("Monto")
        .draw()?;

    for (s, (name, values)) in series.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_histogram(path: &Path, title: &str, x_desc: &str, bins: &Bins) -> Result<()> {
    let high = bins.low + bins.width * bins.counts.len() as f64;
    let peak = bins.counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(bins.low..high, 0f64..peak * 1.1)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Frecuencia")
        .draw()?;

    let color = PALETTE[0];
    chart.draw_series(bins.counts.iter().enumerate().map(|(i, count)| {
        let x0 = bins.low + bins.width * i as f64;
        Rectangle::new([(x0, 0.0), (x0 + bins.width, *count as f64)], color.filled())
    }))?;
    chart.draw_series(bins.counts.iter().enumerate().map(|(i, count)| {
        let x0 = bins.low + bins.width * i as f64;
        Rectangle::new([(x0, 0.0), (x0 + bins.width, *count as f64)], BLACK.stroke_width(1))
    }))?;
    root.present()?;
    Ok(())
}

fn draw_timeline(
    path: &Path,
    title: &str,
    y_desc: &str,
    first: NaiveDate,
    points: &[(NaiveDate, f64)],
) -> Result<()> {
    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|(d, v)| ((*d - first).num_days() as f64, *v))
        .collect();
    let last_day = xy.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let (y_min, y_max) = y_bounds(xy.iter().map(|p| p.1));

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 28).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..last_day, y_min..y_max)?;

    let date_at = |x: &f64| {
        (first + chrono::Duration::days(x.round() as i64))
            .format("%Y-%m-%d")
            .to_string()
    };
    chart
        .configure_mesh()
        .x_label_formatter(&date_at)
        .x_desc("Fecha")
        .y_desc(y_desc)
        .draw()?;
    chart.draw_series(LineSeries::new(xy, PALETTE[0].stroke_width(2)))?;
    root.present()?;
    Ok(())
}

fn draw_pie(path: &Path, title: &str, slices: &[(&str, f64)]) -> Result<()> {
    let values: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
    let sum: f64 = values.iter().sum();

    let root = BitMapBackend::new(path, SQUARE).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, (FONT, 28))?;
    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = w.min(h) as f64 * 0.35;
    let at = |angle: f64, r: f64| -> (i32, i32) {
        (
            (cx + r * angle.cos()).round() as i32,
            (cy + r * angle.sin()).round() as i32,
        )
    };

    for (i, ((name, value), (start, sweep))) in
        slices.iter().zip(pie_angles(&values)).enumerate()
    {
        let color = PALETTE[i % PALETTE.len()];
        let steps = ((sweep / TAU) * 180.0).ceil().max(2.0) as usize;
        let mut outline = vec![at(0.0, 0.0)];
        outline.extend((0..=steps).map(|k| at(start + sweep * k as f64 / steps as f64, radius)));
        area.draw(&Polygon::new(outline, color.filled()))?;

        let mid = start + sweep / 2.0;
        area.draw(&Text::new(
            format!("{:.1}%", value / sum * 100.0),
            at(mid, radius * 0.6),
            centered(16),
        ))?;
        area.draw(&Text::new(name.to_string(), at(mid, radius * 1.15), centered(16)))?;
    }
    root.present()?;
    Ok(())
}
