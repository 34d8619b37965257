use common::{
    config::ImageFormat,
    style::{LINE_WIDTH, LineStyle, MARKER_SIZE, Marker, Rgb, SeriesStyle, X_LABEL},
    util::axis_range,
};
use eyre::Result;
use plotters::{
    coord::Shift,
    element::{Drawable, PointCollection},
    prelude::*,
    series::DashedLineSeries,
};
use plotters_backend::{BackendCoord, DrawingErrorKind};

use crate::ChartJob;

const TITLE_FONT_SIZE: u32 = 28;
const AXIS_LABEL_FONT_SIZE: u32 = 20;
const TICK_LABEL_FONT_SIZE: u32 = 16;
const LEGEND_FONT_SIZE: u32 = 16;
/// Width of the line sample drawn next to each legend label
const LEGEND_SAMPLE_LEN: i32 = 24;

fn rgb_color(rgb: Rgb) -> RGBColor {
    let Rgb(r, g, b) = rgb;
    RGBColor(r, g, b)
}

/// Dash length and gap in pixels, `None` for a solid line
fn dash(line: LineStyle) -> Option<(u32, u32)> {
    match line {
        LineStyle::Solid => None,
        LineStyle::Dotted => Some((2, 4)),
        LineStyle::Dashed => Some((10, 6)),
        // no dash-dot primitive, long dashes with short gaps stand in for it
        LineStyle::DashDot => Some((14, 3)),
    }
}

/// Primitive drawing steps in backend pixels
#[derive(Debug, Clone, PartialEq)]
enum Stroke {
    Line(BackendCoord, BackendCoord),
    Disc(BackendCoord, u32),
    Fill(Vec<BackendCoord>),
}

/// Start and end offsets of the visible dashes along a line of `len` pixels
fn dash_segments(line: LineStyle, len: i32) -> Vec<(i32, i32)> {
    match dash(line) {
        None => vec![(0, len)],
        Some((on, off)) => (0..len)
            .step_by((on + off) as usize)
            .map(|start| (start, (start + on as i32).min(len)))
            .collect(),
    }
}

fn marker_strokes(marker: Marker, (x, y): BackendCoord) -> Vec<Stroke> {
    let r = (MARKER_SIZE / 2) as i32;
    match marker {
        Marker::Circle => vec![Stroke::Disc((x, y), r as u32)],
        Marker::Cross => vec![
            Stroke::Line((x - r, y - r), (x + r, y + r)),
            Stroke::Line((x - r, y + r), (x + r, y - r)),
        ],
        Marker::TriangleDown => vec![Stroke::Fill(vec![(x - r, y - r), (x + r, y - r), (x, y + r)])],
        Marker::Star => vec![
            Stroke::Line((x - r, y - r), (x + r, y + r)),
            Stroke::Line((x - r, y + r), (x + r, y - r)),
            Stroke::Line((x, y - r), (x, y + r)),
            Stroke::Line((x - r, y), (x + r, y)),
        ],
    }
}

/// Legend sample starting at `(x, y)`: the dash pattern, then the marker at its midpoint
fn legend_strokes(style: &SeriesStyle, (x, y): BackendCoord) -> Vec<Stroke> {
    let mut strokes = dash_segments(style.line, LEGEND_SAMPLE_LEN)
        .into_iter()
        .map(|(from, to)| Stroke::Line((x + from, y), (x + to, y)))
        .collect::<Vec<_>>();
    strokes.extend(marker_strokes(style.marker, (x + LEGEND_SAMPLE_LEN / 2, y)));
    strokes
}

fn draw_strokes<DB: DrawingBackend>(
    backend: &mut DB,
    strokes: &[Stroke],
    style: &ShapeStyle,
) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
    for stroke in strokes {
        match stroke {
            Stroke::Line(from, to) => backend.draw_line(*from, *to, style)?,
            Stroke::Disc(center, radius) => backend.draw_circle(*center, *radius, style, true)?,
            Stroke::Fill(points) => backend.fill_polygon(points.iter().copied(), style)?,
        }
    }
    Ok(())
}

/// Series marker anchored at a data point
struct MarkerGlyph<Coord> {
    at: Coord,
    marker: Marker,
    color: Rgb,
}

impl<'a, Coord> PointCollection<'a, Coord> for &'a MarkerGlyph<Coord> {
    type Point = &'a Coord;
    type IntoIter = std::iter::Once<&'a Coord>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&self.at)
    }
}

impl<Coord, DB: DrawingBackend> Drawable<DB> for MarkerGlyph<Coord> {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut pos: I,
        backend: &mut DB,
        _: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        match pos.next() {
            Some(at) => draw_strokes(
                backend,
                &marker_strokes(self.marker, at),
                &rgb_color(self.color).stroke_width(LINE_WIDTH),
            ),
            None => Ok(()),
        }
    }
}

/// Legend entry drawn in the series' own line pattern and marker
struct LegendSample {
    at: BackendCoord,
    style: SeriesStyle,
}

impl<'a> PointCollection<'a, BackendCoord> for &'a LegendSample {
    type Point = &'a BackendCoord;
    type IntoIter = std::iter::Once<&'a BackendCoord>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&self.at)
    }
}

impl<DB: DrawingBackend> Drawable<DB> for LegendSample {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut pos: I,
        backend: &mut DB,
        _: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        match pos.next() {
            Some(at) => draw_strokes(
                backend,
                &legend_strokes(&self.style, at),
                &rgb_color(self.style.color).stroke_width(LINE_WIDTH),
            ),
            None => Ok(()),
        }
    }
}

pub fn draw_line_chart(job: &ChartJob, size: (u32, u32), format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Png => {
            let root = BitMapBackend::new(&job.filepath, size).into_drawing_area();
            draw_on(&root, job)?;
            root.present()?;
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(&job.filepath, size).into_drawing_area();
            draw_on(&root, job)?;
            root.present()?;
        }
    }
    Ok(())
}

fn draw_on<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, job: &ChartJob) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let points = || job.lines.iter().flat_map(|l| l.points.iter());
    let (x_min, x_max) = axis_range(points().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = axis_range(points().map(|p| p.1)).unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(root)
        .caption(&job.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(job.view.y_label())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    for line in &job.lines {
        let style = line.style;
        let stroke = rgb_color(style.color).stroke_width(LINE_WIDTH);
        let data = line.points.iter().copied();

        let anno = match dash(style.line) {
            None => chart.draw_series(LineSeries::new(data.clone(), stroke))?,
            Some((size, spacing)) => {
                chart.draw_series(DashedLineSeries::new(data.clone(), size, spacing, stroke))?
            }
        };
        anno.label(line.label.clone())
            .legend(move |at| LegendSample { at, style });

        chart.draw_series(data.map(|at| MarkerGlyph {
            at,
            marker: style.marker,
            color: style.color,
        }))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use common::style::StyleTable;

    use super::*;
    use crate::ChartLine;

    #[test]
    fn dash_patterns() {
        let table = StyleTable::default();
        let pattern = |name: &str| dash(table.resolve(name).unwrap().line);
        assert_eq!(pattern("ArtMap"), None);
        assert!(pattern("UnorderedMap").is_some());
        assert_ne!(pattern("Map"), pattern("BtreeMap"));
    }

    #[test]
    fn dash_segments_cover_the_sample() {
        assert_eq!(dash_segments(LineStyle::Solid, 24), vec![(0, 24)]);
        assert_eq!(dash_segments(LineStyle::Dashed, 24), vec![(0, 10), (16, 24)]);
        assert_eq!(dash_segments(LineStyle::Dotted, 24).len(), 4);
    }

    #[test]
    fn legend_sample_follows_line_and_marker() {
        let table = StyleTable::default();
        let unordered = *table.resolve("UnorderedMap").unwrap();
        let map = *table.resolve("Map").unwrap();
        // same color, told apart by dash pattern and marker
        assert_eq!(unordered.color, map.color);
        assert_ne!(legend_strokes(&unordered, (0, 0)), legend_strokes(&map, (0, 0)));

        let solid = SeriesStyle {
            line: LineStyle::Solid,
            ..map
        };
        assert_ne!(legend_strokes(&solid, (0, 0)), legend_strokes(&map, (0, 0)));
        assert_eq!(
            legend_strokes(&solid, (0, 0))[0],
            Stroke::Line((0, 0), (LEGEND_SAMPLE_LEN, 0))
        );

        let circle = SeriesStyle {
            marker: Marker::Circle,
            ..map
        };
        assert_ne!(legend_strokes(&circle, (0, 0)), legend_strokes(&map, (0, 0)));

        let strokes = legend_strokes(&map, (5, 7));
        assert!(strokes.ends_with(&marker_strokes(
            Marker::TriangleDown,
            (5 + LEGEND_SAMPLE_LEN / 2, 7)
        )));
    }

    /// Text layout needs a system font, drawing is skipped without one
    fn fonts_available() -> bool {
        ("sans-serif", 12).into_font().box_size("0").is_ok()
    }

    #[test]
    fn draws_png_and_svg() {
        if !fonts_available() {
            eprintln!("no sans-serif font, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let table = StyleTable::default();
        let lines = ["ArtMap", "UnorderedMap", "Map", "BtreeMap"]
            .iter()
            .enumerate()
            .map(|(i, name)| ChartLine {
                label: name.to_string(),
                style: *table.resolve(name).unwrap(),
                points: vec![(1.0, i as f64), (0.5, i as f64 + 1.0), (2.0, i as f64 * 2.0)],
            })
            .collect::<Vec<_>>();

        for (format, file) in [
            (ImageFormat::Png, "absolute_sparse.png"),
            (ImageFormat::Svg, "absolute_sparse.svg"),
        ] {
            let job = ChartJob {
                filepath: dir.path().join(file),
                title: "sparse (absolute)".to_owned(),
                view: common::aggregate::ViewKind::Absolute,
                lines: lines.clone(),
            };
            draw_line_chart(&job, (640, 480), format).unwrap();
            assert!(std::fs::metadata(&job.filepath).unwrap().len() > 0);
        }
    }
}
