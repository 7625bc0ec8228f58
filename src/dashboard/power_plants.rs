//! Global power plant dashboard.

use super::{
    unknown_panel, Card, Dashboard, DashboardSettings, Layout, PanelDef, PanelKind, PanelOutput,
    SelectionControl,
};
use crate::aggregate::{self, round1, AggregatedView};
use crate::chart::{ChartData, ChartKind, ChartSpec, GridCell};
use crate::dataset::{require_columns, Dataset};
use crate::selection::Selection;
use crate::LoadOptions;
use color_eyre::Result;
use polars::prelude::*;
use std::path::Path;

pub const ID: &str = "power-plants";

const COUNTRY: &str = "country_long";
const COUNTRY_CODE: &str = "country code";
const PLANT: &str = "name of powerplant";
const FUEL: &str = "primary_fuel";
const CAPACITY: &str = "capacity in MW";
const START_YEAR: &str = "start_year";

pub const REQUIRED_COLUMNS: &[&str] = &[COUNTRY, COUNTRY_CODE, PLANT, FUEL, CAPACITY, START_YEAR];

const OVERVIEW: &str = "Overview";
const ANALYSIS: &str = "Analysis by Country";

pub static PANELS: &[PanelDef] = &[
    PanelDef {
        key: "total_countries",
        caption: "Number of Country",
        section: OVERVIEW,
        tab: None,
        reactive: false,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "total_power_plants",
        caption: "Number of Power plants",
        section: OVERVIEW,
        tab: None,
        reactive: false,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "most_used_fuel",
        caption: "Most Used Fuel",
        section: OVERVIEW,
        tab: None,
        reactive: false,
        kind: PanelKind::Card,
    },
    PanelDef {
        key: "map_plot",
        caption: "Power plants by start year",
        section: OVERVIEW,
        tab: None,
        reactive: false,
        kind: PanelKind::Chart(ChartKind::Choropleth),
    },
    PanelDef {
        key: "plot_ranking",
        caption: "Ranking",
        section: ANALYSIS,
        tab: Some("Ranking"),
        reactive: true,
        kind: PanelKind::Chart(ChartKind::HorizontalBar),
    },
    PanelDef {
        key: "plot_distribution",
        caption: "Distribution",
        section: ANALYSIS,
        tab: Some("Distribution"),
        reactive: true,
        kind: PanelKind::Chart(ChartKind::Box),
    },
    PanelDef {
        key: "plot_pie",
        caption: "Primary fuel",
        section: ANALYSIS,
        tab: None,
        reactive: true,
        kind: PanelKind::Chart(ChartKind::Donut),
    },
];

/// Capacity as Float64 and start year as Int64; nulls are kept.
pub fn prepare(df: DataFrame) -> Result<DataFrame> {
    require_columns(&df, REQUIRED_COLUMNS)?;
    let df = df
        .lazy()
        .with_columns([
            col(CAPACITY).cast(DataType::Float64),
            col(START_YEAR).cast(DataType::Int64),
        ])
        .collect()?;
    Ok(df)
}

/// Values that never change with the selection, computed once.
struct Overview {
    total_countries: u64,
    total_power_plants: u64,
    most_used_fuel: String,
    map: Vec<GridCell>,
}

impl Overview {
    fn compute(data: &Dataset) -> Result<Self> {
        let fuels = aggregate::count_by(data.lazy(), FUEL)?;
        let most_used_fuel = match fuels.rows.first() {
            Some((fuel, count)) => format!("{} = {}", fuel, count),
            None => "No data".to_string(),
        };
        let map = aggregate::count_by_pair(data.lazy(), COUNTRY_CODE, START_YEAR)?
            .into_iter()
            .map(|(location, period, value)| GridCell {
                location,
                period,
                value,
            })
            .collect();
        Ok(Self {
            total_countries: aggregate::distinct_count(data.lazy(), COUNTRY)?,
            total_power_plants: aggregate::distinct_count(data.lazy(), PLANT)?,
            most_used_fuel,
            map,
        })
    }
}

struct Panels {
    data: Dataset,
    top_n: usize,
    overview: Overview,
}

impl Panels {
    fn filtered(&self, selection: &Selection) -> LazyFrame {
        selection.apply(self.data.lazy(), COUNTRY)
    }

    fn render(&self, key: &str, selection: &Selection) -> Result<PanelOutput> {
        let overview = &self.overview;
        let output = match key {
            "total_countries" => PanelOutput::Card(Card::number(
                "Number of Country",
                overview.total_countries as f64,
            )),
            "total_power_plants" => PanelOutput::Card(Card::number(
                "Number of Power plants",
                overview.total_power_plants as f64,
            )),
            "most_used_fuel" => PanelOutput::Card(Card::text(
                "Most Used Fuel",
                overview.most_used_fuel.clone(),
            )),
            "map_plot" => PanelOutput::Chart(
                ChartSpec::new(
                    ChartKind::Choropleth,
                    "Number of power plants by start year",
                    ChartData::Grid(overview.map.clone()),
                )
                .with_labels("start_year", "No of Power Plant")
                .with_hover("<b>%{label}</b>: <b>%{value}</b> power plants started in %{x}"),
            ),
            "plot_ranking" => PanelOutput::Chart(self.ranking(selection)?),
            "plot_distribution" => PanelOutput::Chart(self.distribution(selection)?),
            "plot_pie" => PanelOutput::Chart(self.fuel_pie(selection)?),
            other => return Err(unknown_panel(ID, other)),
        };
        Ok(output)
    }

    fn ranking(&self, selection: &Selection) -> Result<ChartSpec> {
        let view = aggregate::sum_by(self.filtered(selection), PLANT, CAPACITY)?
            .top(self.top_n)
            .ascending();
        Ok(ChartSpec::new(
            ChartKind::HorizontalBar,
            format!("Ranking of Overall Power Plants{}", selection.title_suffix()),
            ChartData::from(view),
        )
        .with_labels(CAPACITY, PLANT)
        .with_hover("<b>%{y}</b> has a capacity of <b>%{x}</b> MW"))
    }

    fn distribution(&self, selection: &Selection) -> Result<ChartSpec> {
        let boxes = aggregate::quartiles_by(self.filtered(selection), FUEL, CAPACITY)?;
        Ok(ChartSpec::new(
            ChartKind::Box,
            format!(
                "Distribution of capacity in MW in each fuel{}",
                selection.title_suffix()
            ),
            ChartData::Boxes(boxes),
        )
        .with_labels("Type of Fuel", CAPACITY)
        .with_hover("<b>%{label}</b>: median <b>%{y}</b> MW"))
    }

    fn fuel_pie(&self, selection: &Selection) -> Result<ChartSpec> {
        let view = aggregate::count_by(self.filtered(selection), FUEL)?;
        Ok(ChartSpec::new(
            ChartKind::Donut,
            fuel_title(&view, selection),
            ChartData::Slices(view.shares()),
        )
        .with_hover("<b>%{value}</b> power plants run on <b>%{label}</b>"))
    }
}

/// "Proportion of Overall Power Plants primary fuel in Chile: 42.9% Hydro".
fn fuel_title(view: &AggregatedView, selection: &Selection) -> String {
    let total = view.total();
    match view.rows.first() {
        Some((fuel, count)) if total > 0.0 => format!(
            "Proportion of Overall Power Plants primary fuel{}: {:.1}% {}",
            selection.title_suffix(),
            round1(100.0 * count / total),
            fuel
        ),
        _ => format!("No power plants recorded{}", selection.title_suffix()),
    }
}

pub struct PowerPlantsDashboard {
    panels: Panels,
    layout: Layout,
}

impl PowerPlantsDashboard {
    pub fn load(path: &Path, options: &LoadOptions, settings: DashboardSettings) -> Result<Self> {
        let data = Dataset::load(ID, path, options, prepare)?;
        Self::from_dataset(data, settings)
    }

    pub fn from_frame(df: DataFrame, settings: DashboardSettings) -> Result<Self> {
        Self::from_dataset(Dataset::new(prepare(df)?), settings)
    }

    fn from_dataset(data: Dataset, settings: DashboardSettings) -> Result<Self> {
        let countries = aggregate::distinct_sorted(data.lazy(), COUNTRY)?;
        let overview = Overview::compute(&data)?;
        let panels = Panels {
            data,
            top_n: settings.top_n,
            overview,
        };
        let default = settings.default_selection;
        let layout = Layout::build(
            ID,
            "World power plant dashboard",
            "Global Power Plants",
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

impl Dashboard for PowerPlantsDashboard {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            COUNTRY => &["Indonesia", "Indonesia", "Chile", "Indonesia", "Chile", "Indonesia"],
            COUNTRY_CODE => &["IDN", "IDN", "CHL", "IDN", "CHL", "IDN"],
            PLANT => &["Suralaya", "Paiton", "Ralco", "Saguling", "Pangue", "Cirata"],
            FUEL => &["Coal", "Coal", "Hydro", "Hydro", "Hydro", "Hydro"],
            CAPACITY => &[4025.0f64, 4710.0, 690.0, 700.7, 467.0, 1008.0],
            START_YEAR => &[
                Some(1985.0f64),
                Some(1994.0),
                Some(2004.0),
                Some(1985.0),
                None,
                Some(1988.0)
            ]
        )
        .unwrap()
    }

    fn dashboard() -> PowerPlantsDashboard {
        PowerPlantsDashboard::from_frame(sample(), DashboardSettings::default()).unwrap()
    }

    fn render(key: &str, selection: &Selection) -> PanelOutput {
        dashboard().render(key, selection).unwrap()
    }

    #[test]
    fn prepare_casts_types() {
        let df = prepare(sample()).unwrap();
        assert_eq!(df.column(START_YEAR).unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column(CAPACITY).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(START_YEAR).unwrap().null_count(), 1);
    }

    #[test]
    fn static_cards_ignore_selection() {
        let chile = Selection::Country("Chile".to_string());
        let card = |key: &str| render(key, &chile).as_card().cloned().unwrap();
        assert_eq!(card("total_countries").value, Some(2.0));
        assert_eq!(card("total_power_plants").value, Some(6.0));
        assert_eq!(card("most_used_fuel").display, "Hydro = 4");
    }

    #[test]
    fn map_drops_null_years_and_orders_by_year() {
        let spec = render("map_plot", &Selection::All);
        match &spec.as_chart().unwrap().data {
            ChartData::Grid(cells) => {
                let years: Vec<i64> = cells.iter().map(|c| c.period).collect();
                assert_eq!(years, vec![1985, 1988, 1994, 2004]);
                assert_eq!(cells[0].value, 2.0);
            }
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn ranking_is_ascending_by_capacity() {
        let indonesia = Selection::Country("Indonesia".to_string());
        let output = render("plot_ranking", &indonesia);
        let spec = output.as_chart().unwrap();
        assert_eq!(spec.title, "Ranking of Overall Power Plants in Indonesia");
        match &spec.data {
            ChartData::Categories(rows) => {
                let names: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
                assert_eq!(names, vec!["Saguling", "Cirata", "Suralaya", "Paiton"]);
            }
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn distribution_per_fuel() {
        let output = render("plot_distribution", &Selection::All);
        match &output.as_chart().unwrap().data {
            ChartData::Boxes(boxes) => {
                assert_eq!(boxes.len(), 2);
                assert_eq!(boxes[0].label, "Coal");
                assert_eq!(boxes[0].max, 4710.0);
                assert_eq!(boxes[1].count, 4);
            }
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn pie_title_and_shares() {
        let output = render("plot_pie", &Selection::Country("Indonesia".to_string()));
        let spec = output.as_chart().unwrap();
        assert_eq!(
            spec.title,
            "Proportion of Overall Power Plants primary fuel in Indonesia: 50.0% Coal"
        );
        match &spec.data {
            ChartData::Slices(slices) => {
                let total: f64 = slices.iter().map(|s| s.percent).sum();
                assert!((total - 100.0).abs() < 0.1);
            }
            other => panic!("unexpected data {:?}", other),
        }
    }

    #[test]
    fn unknown_country_is_empty() {
        let nowhere = Selection::Country("Atlantis".to_string());
        let output = render("plot_pie", &nowhere);
        let spec = output.as_chart().unwrap();
        assert!(spec.data.is_empty());
        assert_eq!(spec.title, "No power plants recorded in Atlantis");
    }

    #[test]
    fn map_panel_is_json_only() {
        let d = dashboard();
        assert!(!d.panel("map_plot").unwrap().renders_to_svg());
        assert!(d.panel("plot_ranking").unwrap().renders_to_svg());
        assert!(!d.layout().region("map_plot").unwrap().svg);
    }
}
