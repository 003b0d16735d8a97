use super::{Error, Result, TimeLatency};
use chrono::prelude::*;
use log::{debug, info};
use plotters::prelude::*;
use plotters::coord::Shift;
use plotters::series::DashedLineSeries;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::Path;

type Point = (DateTime<Utc>, f64);

/// 12x6 inches at 300 dpi
pub const DPI: u32 = 300;
pub const SIZE: (u32, u32) = (12 * DPI, 6 * DPI);
/// 300 dpi in pixels per metre, for the png pHYs chunk
pub const PIXELS_PER_METRE: u32 = 11811;

pub const Y_MAX: f64 = 10000.;
pub const X_FMT: &str = "%H:%M:%S";

pub const TITLE: &str = "API Request Elapsed Time Over Time";
pub const ELAPSED_LABEL: &str = "Elapsed Time (ms)";
pub const PREVIOUS_LABEL: &str = "Previous Time (ms)";

const ELAPSED_COLOR: RGBColor = RGBColor(31, 119, 180);
const PREVIOUS_COLOR: RGBColor = RGBColor(255, 127, 14);
const GRID_COLOR: RGBColor = RGBColor(210, 210, 210);
const PREVIOUS_ALPHA: f64 = 0.7;
const LINE_WIDTH: u32 = 4;
const MARKER_SIZE: u32 = 9;
const FONT: &str = "sans-serif";
const FONT_SIZE: u32 = 40;
const MAX_AUTO_X_LABELS: usize = 12;

/// How the time axis picks its tick labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// evenly spaced ticks chosen by the time axis
    Auto,
    /// a tick at the timestamp of every n-th row
    EveryNth(usize),
}

impl Default for TickMode {
    fn default() -> Self {
        TickMode::Auto
    }
}

/// places a time of day on 1900-01-01 UTC to get a plottable datetime
pub fn on_reference_date(t: NaiveTime) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default();
    TimeZone::from_utc_datetime(&Utc, &date.and_time(t))
}

fn in_y_range(y: f64) -> bool {
    (0. ..=Y_MAX).contains(&y)
}

fn lerp(a: Point, b: Point, frac: f64) -> Point {
    if frac <= 0. {
        return a;
    }
    if frac >= 1. {
        return b;
    }
    let ns = (b.0 - a.0).num_nanoseconds().unwrap_or_default() as f64 * frac;
    (
        a.0 + chrono::Duration::nanoseconds(ns.round() as i64),
        a.1 + (b.1 - a.1) * frac,
    )
}

/// the part of the line a-b inside the y range, None if it is all outside
fn clip_line(a: Point, b: Point) -> Option<(Point, Point)> {
    let dy = b.1 - a.1;
    if dy == 0. {
        return if in_y_range(a.1) { Some((a, b)) } else { None };
    }
    let t_low = -a.1 / dy;
    let t_high = (Y_MAX - a.1) / dy;
    let t0 = t_low.min(t_high).max(0.);
    let t1 = t_low.max(t_high).min(1.);
    if t0 > t1 {
        return None;
    }
    // an inner t is a crossing, its y is the bound itself
    let point_at = |t: f64| {
        if t <= 0. || t >= 1. {
            lerp(a, b, t)
        } else {
            (lerp(a, b, t).0, if t == t_high { Y_MAX } else { 0. })
        }
    };
    Some((point_at(t0), point_at(t1)))
}

/// Clips a continuous chunk to the y range like an axis limit does:
/// the line is cut where it crosses 0 or Y_MAX, crossing points are
/// interpolated and the parts outside are dropped.
pub fn clip_segment(seg: &[Point]) -> Vec<Vec<Point>> {
    let mut pieces = Vec::new();
    if seg.len() == 1 {
        if in_y_range(seg[0].1) {
            pieces.push(seg.to_vec());
        }
        return pieces;
    }
    let mut current: Vec<Point> = Vec::new();
    for pair in seg.windows(2) {
        match clip_line(pair[0], pair[1]) {
            Some((p, q)) => {
                if current.last() != Some(&p) {
                    if !current.is_empty() {
                        pieces.push(std::mem::take(&mut current));
                    }
                    current.push(p);
                }
                current.push(q);
                if q != pair[1] {
                    pieces.push(std::mem::take(&mut current));
                }
            }
            None => {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// encodes the rgb buffer as png, tagged with the 300 dpi resolution
fn write_png(fout: &Path, buf: &[u8]) -> Result<()> {
    let file = File::create(fout)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), SIZE.0, SIZE.1);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: PIXELS_PER_METRE,
        yppu: PIXELS_PER_METRE,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(buf)?;
    writer.finish()?;
    Ok(())
}

impl TimeLatency {
    /// splits the (time, value) pairs into continuous chunks,
    /// a missing timestamp or a NAN or infinite value ends the current chunk
    pub fn segments(&self, values: &[f64]) -> Vec<Vec<Point>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (t, &v) in self.time.iter().zip(values.iter()) {
            match t {
                Some(t) if v.is_finite() => current.push((on_reference_date(*t), v)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// time axis limits with a 5% margin on each side
    fn x_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (tmin, tmax) = self.time_span().ok_or(Error::NoTimestamps)?;
        let xspan: chrono::Duration = tmax - tmin;
        let xmargin = if xspan == chrono::Duration::zero() {
            chrono::Duration::seconds(1)
        } else {
            xspan / 20
        };
        Ok((
            on_reference_date(tmin) - xmargin,
            on_reference_date(tmax) + xmargin,
        ))
    }

    /// plots elapsed and previous times to png,
    /// the file is only written once the whole chart is drawn
    pub fn plot_png(&self, fout: &Path, ticks: TickMode) -> Result<()> {
        let (xmin, xmax) = self.x_range()?;
        debug!("time axis from {} to {}", xmin, xmax);

        let mut buf = vec![0u8; (SIZE.0 * SIZE.1 * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf[..], SIZE).into_drawing_area();
            self.draw_chart(&root, xmin..xmax, ticks)?;
            root.present()?;
        }
        write_png(fout, &buf)?;
        info!("plotted {} rows to {}", self.len(), fout.display());
        Ok(())
    }

    fn draw_chart(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        xrange: Range<DateTime<Utc>>,
        ticks: TickMode,
    ) -> Result<()> {
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(root)
            .caption(TITLE, (FONT, FONT_SIZE + 12))
            .margin(40)
            .x_label_area_size(260)
            .y_label_area_size(200)
            .build_cartesian_2d(xrange, 0f64..Y_MAX)?;

        let x_label_style = (FONT, FONT_SIZE)
            .into_font()
            .transform(FontTransform::Rotate90);
        let auto_fmt = |x: &DateTime<Utc>| x.format(X_FMT).to_string();
        let blank_fmt = |_: &DateTime<Utc>| String::new();
        let y_fmt = |y: &f64| format!("{:.0}", y);

        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(GRID_COLOR.mix(0.4).stroke_width(1))
            .bold_line_style(GRID_COLOR.stroke_width(2))
            .label_style((FONT, FONT_SIZE))
            .x_label_style(x_label_style.clone())
            .axis_desc_style((FONT, FONT_SIZE + 4))
            .x_desc("Timestamp")
            .y_desc("Milliseconds")
            .y_labels(11)
            .y_label_formatter(&y_fmt);
        match ticks {
            TickMode::Auto => {
                mesh.x_labels(MAX_AUTO_X_LABELS).x_label_formatter(&auto_fmt);
            }
            TickMode::EveryNth(_) => {
                mesh.disable_x_mesh().x_label_formatter(&blank_fmt);
            }
        }
        mesh.draw()?;

        if let TickMode::EveryNth(n) = ticks {
            for t in self.time.iter().step_by(n.max(1)).flatten() {
                let x = on_reference_date(*t);
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(x, 0.), (x, Y_MAX)],
                    GRID_COLOR.stroke_width(2),
                )))?;
                let (px, py) = chart.backend_coord(&(x, 0.));
                root.draw(&Text::new(
                    t.format(X_FMT).to_string(),
                    (px, py + 16),
                    x_label_style.clone(),
                ))?;
            }
        }

        let elapsed_style = ELAPSED_COLOR.stroke_width(LINE_WIDTH);
        let mut labelled = false;
        for seg in self.segments(&self.elapsed[..]).iter() {
            for piece in clip_segment(seg) {
                let series = chart.draw_series(LineSeries::new(piece, elapsed_style))?;
                if labelled {
                    continue;
                }
                labelled = true;
                series.label(ELAPSED_LABEL).legend(move |(x, y)| {
                    EmptyElement::at((x, y))
                        + PathElement::new(vec![(0, 0), (40, 0)], elapsed_style)
                        + Circle::new((20, 0), MARKER_SIZE, ELAPSED_COLOR.filled())
                });
            }
            chart.draw_series(
                seg.iter()
                    .filter(|(_, y)| in_y_range(*y))
                    .map(|&(x, y)| Circle::new((x, y), MARKER_SIZE, ELAPSED_COLOR.filled())),
            )?;
        }

        let previous_style = PREVIOUS_COLOR.mix(PREVIOUS_ALPHA).stroke_width(LINE_WIDTH);
        let mut labelled = false;
        for seg in self.segments(&self.previous[..]).iter() {
            for piece in clip_segment(seg) {
                let series =
                    chart.draw_series(DashedLineSeries::new(piece, 24, 14, previous_style))?;
                if labelled {
                    continue;
                }
                labelled = true;
                series.label(PREVIOUS_LABEL).legend(move |(x, y)| {
                    EmptyElement::at((x, y))
                        + PathElement::new(vec![(0, 0), (14, 0)], previous_style)
                        + PathElement::new(vec![(26, 0), (40, 0)], previous_style)
                });
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, FONT_SIZE))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}
