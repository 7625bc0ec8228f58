//! Dashboards: a dataset, a fixed set of keyed panels, and a layout.
//!
//! Every panel is an independent handler of the current [`Selection`]. The
//! server calls [`Dashboard::render`] once per panel request; nothing is
//! shared between panels besides the read-only dataset.

pub mod layoffs;
pub mod power_plants;

use crate::chart::{ChartKind, ChartSpec};
use crate::config::AppConfig;
use crate::error_display::user_message_from_report;
use crate::selection::{Selection, ALL_COUNTRIES};
use crate::LoadOptions;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use layoffs::LayoffsDashboard;
pub use power_plants::PowerPlantsDashboard;

/// What a panel produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "chart", rename_all = "snake_case")]
pub enum PanelKind {
    Card,
    Chart(ChartKind),
}

/// Static description of one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PanelDef {
    pub key: &'static str,
    pub caption: &'static str,
    /// Heading of the page section the panel sits in.
    pub section: &'static str,
    /// Tab label when the section groups panels into tabs.
    pub tab: Option<&'static str>,
    /// Whether the panel follows the selection control.
    pub reactive: bool,
    pub kind: PanelKind,
}

impl PanelDef {
    pub fn renders_to_svg(&self) -> bool {
        matches!(self.kind, PanelKind::Chart(kind) if kind.renders_to_svg())
    }
}

/// A scalar summary card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub header: String,
    pub value: Option<f64>,
    pub display: String,
}

impl Card {
    pub fn number(header: impl Into<String>, value: f64) -> Self {
        Self {
            header: header.into(),
            value: Some(value),
            display: format_number(value),
        }
    }

    pub fn text(header: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: None,
            display: display.into(),
        }
    }
}

/// Whole numbers without a fractional part, anything else to one decimal.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum PanelOutput {
    Card(Card),
    Chart(ChartSpec),
}

impl PanelOutput {
    pub fn as_chart(&self) -> Option<&ChartSpec> {
        match self {
            PanelOutput::Chart(spec) => Some(spec),
            PanelOutput::Card(_) => None,
        }
    }

    pub fn as_card(&self) -> Option<&Card> {
        match self {
            PanelOutput::Card(card) => Some(card),
            PanelOutput::Chart(_) => None,
        }
    }
}

/// Settings shared by every dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub top_n: usize,
    pub default_selection: Selection,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            top_n: 10,
            default_selection: Selection::All,
        }
    }
}

/// The country dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionControl {
    pub id: String,
    pub label: String,
    pub options: Vec<String>,
    pub value: String,
}

impl SelectionControl {
    /// Sentinel first, then `countries` in the order given.
    pub fn countries(countries: Vec<String>, default: &Selection) -> Self {
        let mut options = Vec::with_capacity(countries.len() + 1);
        options.push(ALL_COUNTRIES.to_string());
        options.extend(countries);
        Self {
            id: "country".to_string(),
            label: "Select country".to_string(),
            options,
            value: default.label().to_string(),
        }
    }
}

/// One keyed region of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    #[serde(flatten)]
    pub panel: PanelDef,
    pub svg: bool,
    /// Content for the default selection, computed when the layout is built.
    pub initial: PanelOutput,
}

/// The serialisable page structure of a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub selection: SelectionControl,
    pub regions: Vec<Region>,
}

impl Layout {
    /// Build a layout, rendering every panel once for the default selection.
    pub fn build<F>(
        id: &str,
        title: &str,
        brand: &str,
        selection: SelectionControl,
        panels: &[PanelDef],
        mut render: F,
    ) -> Result<Self>
    where
        F: FnMut(&PanelDef) -> Result<PanelOutput>,
    {
        let regions = panels
            .iter()
            .map(|panel| {
                Ok(Region {
                    panel: *panel,
                    svg: panel.renders_to_svg(),
                    initial: render(panel)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            brand: brand.to_string(),
            selection,
            regions,
        })
    }

    pub fn region(&self, key: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.panel.key == key)
    }

    /// Distinct section headings in page order.
    pub fn sections(&self) -> Vec<&'static str> {
        let mut sections: Vec<&'static str> = Vec::new();
        for region in &self.regions {
            if !sections.contains(&region.panel.section) {
                sections.push(region.panel.section);
            }
        }
        sections
    }
}

pub trait Dashboard: Send + Sync {
    /// URL segment, e.g. `layoffs`.
    fn id(&self) -> &'static str;

    fn title(&self) -> &str;

    fn panels(&self) -> &'static [PanelDef];

    fn panel(&self, key: &str) -> Option<&'static PanelDef> {
        self.panels().iter().find(|p| p.key == key)
    }

    fn layout(&self) -> &Layout;

    /// Run one panel for `selection`. Static panels ignore the selection.
    fn render(&self, key: &str, selection: &Selection) -> Result<PanelOutput>;

    /// Run every panel for `selection`, keyed by panel key.
    fn render_all(&self, selection: &Selection) -> Result<BTreeMap<String, PanelOutput>> {
        self.panels()
            .iter()
            .map(|p| Ok((p.key.to_string(), self.render(p.key, selection)?)))
            .collect()
    }
}

pub(crate) fn unknown_panel(dashboard: &str, key: &str) -> color_eyre::Report {
    eyre!("Unknown panel '{}' on dashboard '{}'", key, dashboard)
}

/// The dashboards mounted by this process.
#[derive(Clone, Default)]
pub struct Registry {
    dashboards: Vec<Arc<dyn Dashboard>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dashboard: Arc<dyn Dashboard>) -> Self {
        self.dashboards.push(dashboard);
        self
    }

    /// Load every dataset named in `config`. Any failure is fatal.
    pub fn load(config: &AppConfig, options: &LoadOptions) -> Result<Self> {
        let top_n = config.dashboard.top_n;
        let mut registry = Self::new();

        if let Some(path) = &config.data.layoffs_path {
            let settings = DashboardSettings {
                top_n,
                default_selection: Selection::parse(
                    config.dashboard.layoffs_default_country.as_deref(),
                ),
            };
            let dashboard = LayoffsDashboard::load(path, options, settings)
                .map_err(|e| load_error(&e, path))?;
            registry = registry.with(Arc::new(dashboard));
        }

        if let Some(path) = &config.data.power_plants_path {
            let settings = DashboardSettings {
                top_n,
                default_selection: Selection::parse(
                    config.dashboard.power_plants_default_country.as_deref(),
                ),
            };
            let dashboard = PowerPlantsDashboard::load(path, options, settings)
                .map_err(|e| load_error(&e, path))?;
            registry = registry.with(Arc::new(dashboard));
        }

        if registry.is_empty() {
            return Err(eyre!(
                "No dataset configured. Pass --layoffs or --power-plants, or set [data] paths in the config file"
            ));
        }
        info!(dashboards = ?registry.ids(), "dashboards ready");
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Dashboard>> {
        self.dashboards.iter().find(|d| d.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.dashboards.iter().map(|d| d.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Dashboard>> {
        self.dashboards.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }
}

fn load_error(report: &color_eyre::Report, path: &Path) -> color_eyre::Report {
    eyre!(user_message_from_report(report, Some(path)))
}
