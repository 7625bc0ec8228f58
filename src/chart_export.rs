//! Chart rendering to SVG with the plotters SVG backend.

use crate::aggregate::{Quartiles, Share};
use crate::chart::{CategoryValue, ChartData, ChartSpec, LabeledPoint, SeriesPoint};
use chrono::NaiveDate;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::path::Path;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const TITLE_FONT: (&str, f64) = ("sans-serif", 18.0);
const LABEL_FONT: (&str, f64) = ("sans-serif", 13.0);

const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);
const POINT_COLOR: RGBColor = RGBColor(231, 76, 60);
const SLICE_COLORS: [RGBColor; 5] = [
    RGBColor(127, 255, 212), // aquamarine
    RGBColor(250, 128, 114), // salmon
    RGBColor(221, 160, 221), // plum
    RGBColor(128, 128, 128), // grey
    RGBColor(106, 90, 205),  // slateblue
];

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Render `spec` to an SVG document.
///
/// Charts with no rows still render: the title and a "No data" note.
pub fn render_svg(spec: &ChartSpec) -> Result<String> {
    if !spec.kind.renders_to_svg() {
        return Err(eyre!("{} charts have no SVG rendering", spec.kind));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let all_zero_slices = matches!(
            &spec.data,
            ChartData::Slices(slices) if slices.iter().all(|s| s.value <= 0.0)
        );
        if spec.data.is_empty() || all_zero_slices {
            draw_empty(&root, &spec.title)?;
        } else {
            match &spec.data {
                ChartData::Categories(rows) => draw_bars(&root, spec, rows)?,
                ChartData::Series(points) => draw_area(&root, spec, points)?,
                ChartData::Points(points) => draw_scatter(&root, spec, points)?,
                ChartData::Slices(slices) => draw_donut(&root, spec, slices)?,
                ChartData::Boxes(boxes) => draw_boxes(&root, spec, boxes)?,
                ChartData::Grid(_) => {
                    return Err(eyre!("{} charts have no SVG rendering", spec.kind))
                }
            }
        }
        root.present()?;
    }
    Ok(svg)
}

/// Write `spec` as an SVG file.
pub fn write_chart_svg(path: &Path, spec: &ChartSpec) -> Result<()> {
    let svg = render_svg(spec)?;
    std::fs::write(path, svg)?;
    Ok(())
}

/// Label of the category drawn at integer position `pos`; blank between categories.
fn category_label(labels: &[String], pos: f64) -> String {
    let idx = pos.round();
    if (pos - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// `2022-11-01` → `Nov 2022`; anything unparseable is shown as-is.
fn month_label(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn upper_bound(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

fn draw_empty(root: &Area<'_>, title: &str) -> Result<()> {
    let area = root.titled(title, TITLE_FONT.into_font())?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No data",
        (w as i32 / 2 - 30, h as i32 / 2),
        LABEL_FONT.into_font(),
    ))?;
    Ok(())
}

fn draw_bars(root: &Area<'_>, spec: &ChartSpec, rows: &[CategoryValue]) -> Result<()> {
    let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
    let x_max = upper_bound(rows.iter().map(|r| r.value).fold(0.0, f64::max));
    let y_fmt = |y: &f64| category_label(&labels, *y);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0.0..x_max, -0.5..(rows.len() as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rows.len())
        .y_label_formatter(&y_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .draw()?;

    chart.draw_series(rows.iter().enumerate().map(|(i, r)| {
        let y = i as f64;
        Rectangle::new([(0.0, y - 0.4), (r.value, y + 0.4)], BAR_COLOR.filled())
    }))?;
    Ok(())
}

fn draw_area(root: &Area<'_>, spec: &ChartSpec, points: &[SeriesPoint]) -> Result<()> {
    let labels: Vec<String> = points.iter().map(|p| month_label(&p.x)).collect();
    let x_range = if points.len() > 1 {
        0.0..(points.len() - 1) as f64
    } else {
        -0.5..0.5
    };
    let y_max = upper_bound(points.iter().map(|p| p.y).fold(0.0, f64::max));
    let x_fmt = |x: &f64| category_label(&labels, *x);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_labels(points.len().min(8))
        .x_label_formatter(&x_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .draw()?;

    chart.draw_series(
        AreaSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.y)),
            0.0,
            BAR_COLOR.mix(0.3),
        )
        .border_style(BAR_COLOR),
    )?;
    Ok(())
}

fn draw_scatter(root: &Area<'_>, spec: &ChartSpec, points: &[LabeledPoint]) -> Result<()> {
    let y_max = upper_bound(points.iter().map(|p| p.y).fold(0.0, f64::max));

    if spec.log_x {
        // Log axes cannot show non-positive values.
        let visible: Vec<&LabeledPoint> = points.iter().filter(|p| p.x > 0.0).collect();
        if visible.is_empty() {
            return draw_empty(root, &spec.title);
        }
        let mut x_min = visible.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let mut x_max = visible.iter().map(|p| p.x).fold(0.0, f64::max);
        if x_max <= x_min {
            x_min /= 10.0;
            x_max *= 10.0;
        }

        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, TITLE_FONT)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((x_min..x_max).log_scale(), 0.0..y_max)?;
        chart
            .configure_mesh()
            .x_desc(spec.x_label.as_str())
            .y_desc(spec.y_label.as_str())
            .draw()?;
        chart.draw_series(
            visible
                .iter()
                .map(|p| Circle::new((p.x, p.y), 3, POINT_COLOR.mix(0.7).filled())),
        )?;
    } else {
        let x_max = upper_bound(points.iter().map(|p| p.x).fold(0.0, f64::max));
        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, TITLE_FONT)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;
        chart
            .configure_mesh()
            .x_desc(spec.x_label.as_str())
            .y_desc(spec.y_label.as_str())
            .draw()?;
        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p.x, p.y), 3, POINT_COLOR.mix(0.7).filled())),
        )?;
    }
    Ok(())
}

fn draw_donut(root: &Area<'_>, spec: &ChartSpec, slices: &[Share]) -> Result<()> {
    let area = root.titled(&spec.title, TITLE_FONT.into_font())?;
    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = w.min(h) as f64 * 0.35;
    let at = |angle: f64, r: f64| ((cx + r * angle.cos()) as i32, (cy + r * angle.sin()) as i32);

    let mut start = -PI / 2.0;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.percent / 100.0 * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((sweep / (2.0 * PI)) * 120.0).ceil().max(2.0) as usize;
        let mut outline = vec![(cx as i32, cy as i32)];
        outline.extend((0..=steps).map(|s| at(start + sweep * s as f64 / steps as f64, radius)));
        area.draw(&Polygon::new(
            outline,
            SLICE_COLORS[i % SLICE_COLORS.len()].filled(),
        ))?;

        let (lx, ly) = at(start + sweep / 2.0, radius * 1.12);
        let text = format!("{} {:.1}%", slice.label, slice.percent);
        let lx = if lx < cx as i32 {
            lx - (text.len() as i32 * 6)
        } else {
            lx
        };
        area.draw(&Text::new(text, (lx, ly), LABEL_FONT.into_font()))?;
        start += sweep;
    }

    area.draw(&Circle::new(
        (cx as i32, cy as i32),
        (radius * 0.4) as i32,
        WHITE.filled(),
    ))?;
    Ok(())
}

fn draw_boxes(root: &Area<'_>, spec: &ChartSpec, boxes: &[Quartiles]) -> Result<()> {
    let labels: Vec<String> = boxes.iter().map(|b| b.label.clone()).collect();
    let y_min = boxes.iter().map(|b| b.min).fold(f64::INFINITY, f64::min).min(0.0);
    let y_max = upper_bound(boxes.iter().map(|b| b.max).fold(0.0, f64::max));
    let x_fmt = |x: &f64| category_label(&labels, *x);

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(boxes.len() as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(boxes.len())
        .x_label_formatter(&x_fmt)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .draw()?;

    let color = |i: usize| SLICE_COLORS[i % SLICE_COLORS.len()];
    chart.draw_series(boxes.iter().enumerate().map(|(i, b)| {
        let x = i as f64;
        Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], color(i).mix(0.6).filled())
    }))?;
    chart.draw_series(boxes.iter().enumerate().map(|(i, b)| {
        let x = i as f64;
        Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], BLACK.stroke_width(1))
    }))?;
    chart.draw_series(boxes.iter().enumerate().map(|(i, b)| {
        let x = i as f64;
        PathElement::new(vec![(x - 0.3, b.median), (x + 0.3, b.median)], BLACK.stroke_width(2))
    }))?;
    chart.draw_series(boxes.iter().enumerate().flat_map(|(i, b)| {
        let x = i as f64;
        [
            PathElement::new(vec![(x, b.min), (x, b.q1)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x, b.q3), (x, b.max)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x - 0.1, b.min), (x + 0.1, b.min)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x - 0.1, b.max), (x + 0.1, b.max)], BLACK.stroke_width(1)),
        ]
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, GridCell};

    fn bars() -> ChartSpec {
        ChartSpec::new(
            ChartKind::HorizontalBar,
            "Top 2 industries with most layoffs",
            ChartData::Categories(vec![
                CategoryValue {
                    label: "Finance".to_string(),
                    value: 50.0,
                },
                CategoryValue {
                    label: "Retail".to_string(),
                    value: 120.0,
                },
            ]),
        )
        .with_labels("Number of people laid off", "Industry")
    }

    #[test]
    fn bar_chart_contains_title_and_labels() {
        let svg = render_svg(&bars()).unwrap();
        assert!(svg.contains("<svg"), "svg root");
        assert!(svg.contains("Top 2 industries with most layoffs"), "title");
        assert!(svg.contains("Retail"), "category label");
        assert!(svg.contains("<rect"), "bars");
    }

    #[test]
    fn empty_chart_still_renders() {
        let spec = ChartSpec::new(
            ChartKind::HorizontalBar,
            "Top 0 companies with most layoffs in Atlantis",
            ChartData::Categories(vec![]),
        );
        let svg = render_svg(&spec).unwrap();
        assert!(svg.contains("No data"));
    }

    #[test]
    fn donut_draws_slices() {
        let spec = ChartSpec::new(
            ChartKind::Donut,
            "75.0% layoffs came from Privately owned companies",
            ChartData::Slices(vec![
                Share {
                    label: "Publicly traded".to_string(),
                    value: 25.0,
                    percent: 25.0,
                },
                Share {
                    label: "Privately owned".to_string(),
                    value: 75.0,
                    percent: 75.0,
                },
            ]),
        );
        let svg = render_svg(&spec).unwrap();
        assert!(svg.contains("<polygon"), "slices");
        assert!(svg.contains("75.0%"), "slice label");
    }

    #[test]
    fn zero_total_donut_renders_as_empty() {
        let spec = ChartSpec::new(
            ChartKind::Donut,
            "No layoffs recorded",
            ChartData::Slices(vec![Share {
                label: "Privately owned".to_string(),
                value: 0.0,
                percent: 0.0,
            }]),
        );
        assert!(render_svg(&spec).unwrap().contains("No data"));
    }

    #[test]
    fn log_scatter_renders_points() {
        let spec = ChartSpec::new(
            ChartKind::Scatter,
            "correlation",
            ChartData::Points(vec![
                LabeledPoint {
                    label: "Acme".to_string(),
                    x: 10.0,
                    y: 100.0,
                },
                LabeledPoint {
                    label: "Globex".to_string(),
                    x: 1000.0,
                    y: 20.0,
                },
            ]),
        )
        .with_log_x();
        let svg = render_svg(&spec).unwrap();
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn choropleth_is_rejected() {
        let spec = ChartSpec::new(
            ChartKind::Choropleth,
            "map",
            ChartData::Grid(vec![GridCell {
                location: "IDN".to_string(),
                period: 2001,
                value: 3.0,
            }]),
        );
        assert!(render_svg(&spec).is_err());
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bar_industry.svg");
        write_chart_svg(&path, &bars()).expect("write_chart_svg");
        let content = std::fs::read_to_string(&path).expect("read");
        assert!(content.contains("</svg>"));
    }

    #[test]
    fn labels_between_categories_are_blank() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 5.0), "");
        assert_eq!(month_label("2022-11-01"), "Nov 2022");
    }
}
