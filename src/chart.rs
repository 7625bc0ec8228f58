//! Chart specifications: what a handler hands to the rendering layer.
//!
//! A [`ChartSpec`] is plain data. The server returns it as JSON for the page
//! to draw, and [`crate::chart_export`] turns it into SVG with plotters.

use crate::aggregate::{AggregatedView, Quartiles, Share};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Area,
    Scatter,
    HorizontalBar,
    Donut,
    Box,
    Choropleth,
}

impl ChartKind {
    /// Whether [`crate::chart_export::render_svg`] can draw this kind.
    pub fn renders_to_svg(self) -> bool {
        !matches!(self, ChartKind::Choropleth)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::HorizontalBar => "horizontal bar",
            ChartKind::Donut => "donut",
            ChartKind::Box => "box",
            ChartKind::Choropleth => "choropleth",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub location: String,
    pub period: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "rows", rename_all = "snake_case")]
pub enum ChartData {
    Categories(Vec<CategoryValue>),
    Series(Vec<SeriesPoint>),
    Points(Vec<LabeledPoint>),
    Slices(Vec<Share>),
    Boxes(Vec<Quartiles>),
    Grid(Vec<GridCell>),
}

impl ChartData {
    pub fn len(&self) -> usize {
        match self {
            ChartData::Categories(rows) => rows.len(),
            ChartData::Series(rows) => rows.len(),
            ChartData::Points(rows) => rows.len(),
            ChartData::Slices(rows) => rows.len(),
            ChartData::Boxes(rows) => rows.len(),
            ChartData::Grid(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<AggregatedView> for ChartData {
    fn from(view: AggregatedView) -> Self {
        ChartData::Categories(
            view.rows
                .into_iter()
                .map(|(label, value)| CategoryValue { label, value })
                .collect(),
        )
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Hover label template; `%{x}`, `%{y}`, `%{label}` and `%{value}` are
    /// substituted by the client.
    pub hover_template: String,
    pub log_x: bool,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: ChartData) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            hover_template: String::new(),
            log_x: false,
            data,
        }
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_hover(mut self, template: impl Into<String>) -> Self {
        self.hover_template = template.into();
        self
    }

    pub fn with_log_x(mut self) -> Self {
        self.log_x = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tagged_data() {
        let spec = ChartSpec::new(
            ChartKind::HorizontalBar,
            "Top 1 industries with most layoffs",
            ChartData::Categories(vec![CategoryValue {
                label: "Retail".to_string(),
                value: 120.0,
            }]),
        )
        .with_labels("Number of people laid off", "Industry");

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "horizontal_bar");
        assert_eq!(json["data"]["type"], "categories");
        assert_eq!(json["data"]["rows"][0]["label"], "Retail");
        assert_eq!(json["y_label"], "Industry");
        assert_eq!(json["log_x"], false);
    }

    #[test]
    fn only_choropleth_lacks_svg() {
        assert!(ChartKind::Area.renders_to_svg());
        assert!(ChartKind::Box.renders_to_svg());
        assert!(!ChartKind::Choropleth.renders_to_svg());
    }
}
