//! The country selection that drives every panel of a dashboard.

use polars::prelude::*;

/// Label of the "no filter" entry in the country dropdown.
pub const ALL_COUNTRIES: &str = "All countries";

/// Older spelling of the sentinel, still accepted from links and scripts.
const ALL_COUNTRY_ALIAS: &str = "All country";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Country(String),
}

impl Selection {
    /// Parse a dropdown value. Missing, blank, or the sentinel label select all countries.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value)
                if value.eq_ignore_ascii_case(ALL_COUNTRIES)
                    || value.eq_ignore_ascii_case(ALL_COUNTRY_ALIAS) =>
            {
                Self::All
            }
            Some(value) => Self::Country(value.to_string()),
        }
    }

    /// Value shown in (and sent back by) the dropdown.
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_COUNTRIES,
            Self::Country(name) => name,
        }
    }

    pub fn country(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Country(name) => Some(name),
        }
    }

    /// `" in <country>"` for filtered titles, empty otherwise.
    pub fn title_suffix(&self) -> String {
        match self {
            Self::All => String::new(),
            Self::Country(name) => format!(" in {}", name),
        }
    }

    /// Restrict `lf` to rows whose `column` equals the selected country.
    pub fn apply(&self, lf: LazyFrame, column: &str) -> LazyFrame {
        match self {
            Self::All => lf,
            Self::Country(name) => lf.filter(col(column).eq(lit(name.as_str()))),
        }
    }
}
