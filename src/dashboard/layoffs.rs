//! Tech layoffs dashboard.

use super::{
    unknown_panel, Card, Dashboard, DashboardSettings, Layout, PanelDef, PanelKind, PanelOutput,
    SelectionControl,
};
use crate::aggregate::{self, round1, AggregatedView};
use crate::chart::{ChartData, ChartKind, ChartSpec, LabeledPoint, SeriesPoint};
use crate::dataset::{require_columns, Dataset};
use crate::selection::Selection;
use crate::LoadOptions;
use chrono::NaiveDate;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::path::Path;

pub const ID: &str = "layoffs";

pub const REQUIRED_COLUMNS: &[&str] = &[
    "company",
    "location",
    "industry",
    "total_laid_off",
    "date",
    "stage",
    "country",
    "funds_raised",
];

pub const PUBLICLY_TRADED: &str = "Publicly traded";
pub const PRIVATELY_OWNED: &str = "Privately owned";

const RANKINGS: &str = "Rankings";

pub static PANELS: &[PanelDef] = &[
    PanelDef {
        key: "total_companies",
        caption: "Number of companies",
        section: "Summary",
        tab: None,
        reactive: true,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "total_laid_off",
        caption: "Number of people laid off",
        section: "Summary",
        tab: None,
        reactive: true,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "updated_as_of",
        caption: "Data updated as of",
        section: "Summary",
        tab: None,
        reactive: false,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "area_plot",
        caption: "Trends",
        section: "Trends",
        tab: None,
        reactive: true,
        kind: PanelKind::Chart(ChartKind::Area),
    },
    PanelDef {
        key: "scatter_plot",
        caption: "Correlation",
        section: "Correlation",
        tab: None,
        reactive: true,
        kind: PanelKind::Chart(ChartKind::Scatter),
    },
    PanelDef {
        key: "bar_industry",
        caption: "By Industry",
        section: RANKINGS,
        tab: Some("By Industry"),
        reactive: true,
        kind: PanelKind::Chart(ChartKind::HorizontalBar),
    },
    PanelDef {
        key: "bar_company",
        caption: "By Company",
        section: RANKINGS,
        tab: Some("By Company"),
        reactive: true,
        kind: PanelKind::Chart(ChartKind::HorizontalBar),
    },
    PanelDef {
        key: "bar_city",
        caption: "By City",
        section: RANKINGS,
        tab: Some("By City"),
        reactive: true,
        kind: PanelKind::Chart(ChartKind::HorizontalBar),
    },
    PanelDef {
        key: "pie_plot",
        caption: "Proportion",
        section: "Proportion",
        tab: None,
        reactive: true,
        kind: PanelKind::Chart(ChartKind::Donut),
    },
];

/// Normalise `date` to a Date and derive `month` and `status`.
pub fn prepare(df: DataFrame) -> Result<DataFrame> {
    require_columns(&df, REQUIRED_COLUMNS)?;

    let date = match df.column("date")?.dtype() {
        DataType::Date => col("date"),
        DataType::Datetime(_, _) => col("date").cast(DataType::Date),
        DataType::String => col("date").str().to_date(StrptimeOptions::default()),
        other => return Err(eyre!("Column 'date' has type {} and cannot be read as dates", other)),
    };

    let df = df
        .lazy()
        .with_columns([
            date.alias("date"),
            col("total_laid_off").cast(DataType::Float64),
            col("funds_raised").cast(DataType::Float64),
        ])
        .with_columns([
            col("date").dt().month_start().alias("month"),
            when(col("stage").eq(lit("IPO")))
                .then(lit(PUBLICLY_TRADED))
                .otherwise(lit(PRIVATELY_OWNED))
                .alias("status"),
        ])
        .collect()?;
    Ok(df)
}

/// Latest date as "Friday, 06 Jan 2023", or `None` for an empty table.
fn latest_date(dataset: &Dataset) -> Result<Option<String>> {
    let df = dataset
        .lazy()
        .select([col("date").max().dt().to_string("%Y-%m-%d").alias("latest")])
        .collect()?;
    let latest = df.column("latest")?.str()?.get(0).map(str::to_string);
    match latest {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?;
            Ok(Some(date.format("%A, %d %b %Y").to_string()))
        }
        None => Ok(None),
    }
}

struct Panels {
    data: Dataset,
    top_n: usize,
    updated_as_of: String,
}

impl Panels {
    fn filtered(&self, selection: &Selection) -> LazyFrame {
        selection.apply(self.data.lazy(), "country")
    }

    fn render(&self, key: &str, selection: &Selection) -> Result<PanelOutput> {
        let output = match key {
            "total_companies" => PanelOutput::Card(Card::number(
                "Number of companies",
                aggregate::distinct_count(self.filtered(selection), "company")? as f64,
            )),
            "total_laid_off" => PanelOutput::Card(Card::number(
                "Number of people laid off",
                aggregate::column_sum(self.filtered(selection), "total_laid_off")?,
            )),
            "updated_as_of" => {
                PanelOutput::Card(Card::text("Data updated as of", self.updated_as_of.clone()))
            }
            "area_plot" => PanelOutput::Chart(self.area_plot(selection)?),
            "scatter_plot" => PanelOutput::Chart(self.scatter_plot(selection)?),
            "bar_industry" => PanelOutput::Chart(self.ranking(
                selection,
                "industry",
                "industries",
                "Industry",
                "<b>%{y}</b> industry has laid off <b>%{x}</b> employees",
            )?),
            "bar_company" => PanelOutput::Chart(self.ranking(
                selection,
                "company",
                "companies",
                "Company",
                "<b>%{y}</b> has laid off <b>%{x}</b> employees",
            )?),
            "bar_city" => PanelOutput::Chart(self.ranking(
                selection,
                "location",
                "cities",
                "City",
                "<b>%{x}</b> employees working in <b>%{y}</b> were laid off",
            )?),
            "pie_plot" => PanelOutput::Chart(self.pie_plot(selection)?),
            other => return Err(unknown_panel(ID, other)),
        };
        Ok(output)
    }

    fn area_plot(&self, selection: &Selection) -> Result<ChartSpec> {
        let series = aggregate::sum_by_period(self.filtered(selection), "month", "total_laid_off")?;
        let points = series
            .into_iter()
            .map(|(x, y)| SeriesPoint { x, y })
            .collect();
        Ok(ChartSpec::new(
            ChartKind::Area,
            format!("Number of people laid off, by months{}", selection.title_suffix()),
            ChartData::Series(points),
        )
        .with_labels("Month", "Number of people laid off")
        .with_hover("<b>%{y}</b> employees were laid off in <b>%{x}</b>"))
    }

    fn scatter_plot(&self, selection: &Selection) -> Result<ChartSpec> {
        let nonzero = |name: &str| col(name).is_not_null().and(col(name).neq(lit(0.0)));
        let df = self
            .filtered(selection)
            .filter(nonzero("funds_raised").and(nonzero("total_laid_off")))
            .select([col("company"), col("funds_raised"), col("total_laid_off")])
            .collect()?;

        let companies = df.column("company")?.str()?;
        let funds = df.column("funds_raised")?.f64()?;
        let laid_off = df.column("total_laid_off")?.f64()?;
        let points = companies
            .into_iter()
            .zip(funds.into_iter().zip(laid_off.into_iter()))
            .filter_map(|(company, (x, y))| {
                Some(LabeledPoint {
                    label: company.unwrap_or_default().to_string(),
                    x: x?,
                    y: y?,
                })
            })
            .collect();

        Ok(ChartSpec::new(
            ChartKind::Scatter,
            "correlation between log(funds raised) and number of people laid off",
            ChartData::Points(points),
        )
        .with_labels("Log(funds raised)", "Number of people laid off")
        .with_hover(
            "%{label} have raised <b>%{x}</b> million USD and have laid off <b>%{y}</b> employees",
        )
        .with_log_x())
    }

    fn ranking(
        &self,
        selection: &Selection,
        dimension: &str,
        plural: &str,
        axis: &str,
        hover: &str,
    ) -> Result<ChartSpec> {
        let view = aggregate::sum_by(self.filtered(selection), dimension, "total_laid_off")?
            .top(self.top_n)
            .ascending();
        let title = format!(
            "Top {} {} with most layoffs{}",
            view.len(),
            plural,
            selection.title_suffix()
        );
        Ok(
            ChartSpec::new(ChartKind::HorizontalBar, title, ChartData::from(view))
                .with_labels("Number of people laid off", axis)
                .with_hover(hover),
        )
    }

    fn pie_plot(&self, selection: &Selection) -> Result<ChartSpec> {
        let view = aggregate::sum_by(self.filtered(selection), "status", "total_laid_off")?;
        let title = status_title(&view, selection);
        Ok(ChartSpec::new(
            ChartKind::Donut,
            title,
            ChartData::Slices(view.ascending().shares()),
        )
        .with_hover("<b>%{value}</b> employees have been laid off from <b>%{label}</b> companies"))
    }
}

/// "In Chile, 66.7% layoffs came from Privately owned companies".
fn status_title(view: &AggregatedView, selection: &Selection) -> String {
    let total = view.total();
    match view.rows.first() {
        Some((status, value)) if total > 0.0 => {
            let percent = round1(100.0 * value / total);
            let sentence = format!("{:.1}% layoffs came from {} companies", percent, status);
            match selection.country() {
                Some(country) => format!("In {}, {}", country, sentence),
                None => sentence,
            }
        }
        _ => format!("No layoffs recorded{}", selection.title_suffix()),
    }
}

pub struct LayoffsDashboard {
    panels: Panels,
    layout: Layout,
}

impl LayoffsDashboard {
    pub fn load(path: &Path, options: &LoadOptions, settings: DashboardSettings) -> Result<Self> {
        let data = Dataset::load(ID, path, options, prepare)?;
        Self::from_dataset(data, settings)
    }

    /// Build from an in-memory table; `prepare` is applied here.
    pub fn from_frame(df: DataFrame, settings: DashboardSettings) -> Result<Self> {
        Self::from_dataset(Dataset::new(prepare(df)?), settings)
    }

    fn from_dataset(data: Dataset, settings: DashboardSettings) -> Result<Self> {
        let updated_as_of = latest_date(&data)?.unwrap_or_else(|| "No data".to_string());
        let countries = aggregate::distinct_sorted(data.lazy(), "country")?;
        let panels = Panels {
            data,
            top_n: settings.top_n,
            updated_as_of,
        };
        let default = settings.default_selection;
        let layout = Layout::build(
            ID,
            "Tech Layoffs 2020-2022",
            "Tech Layoffs Dashboard",
            SelectionControl::countries(countries, &default),
            PANELS,
            |panel| panels.render(panel.key, &default),
        )?;
        Ok(Self { panels, layout })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.panels.data
    }
}

impl Dashboard for LayoffsDashboard {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &str {
        &self.layout.title
    }

    fn panels(&self) -> &'static [PanelDef] {
        PANELS
    }

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn render(&self, key: &str, selection: &Selection) -> Result<PanelOutput> {
        self.panels.render(key, selection)
    }
}
