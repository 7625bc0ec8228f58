//! Grouped aggregations shared by the card and chart handlers.
//!
//! Every function takes an already-filtered `LazyFrame` and collects a small
//! result. Groups with a null key are dropped; null measures are ignored by
//! the sums, so a selection that matches no rows yields an empty view or zero.

use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

/// Column name of the group key in every intermediate frame.
pub const KEY: &str = "key";
/// Column name of the aggregated measure in every intermediate frame.
pub const VALUE: &str = "value";

/// A table grouped by one dimension with one numeric measure, sorted
/// descending by that measure. Ties keep first-appearance order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedView {
    pub dimension: String,
    pub rows: Vec<(String, f64)>,
}

/// One slice of a proportion chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub value: f64,
    pub percent: f64,
}

/// Five-number summary of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quartiles {
    pub label: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: u64,
}

impl AggregatedView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|(_, v)| v).sum()
    }

    /// Keep the `n` largest groups.
    pub fn top(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Smallest first, for horizontal bars that draw the largest on top.
    pub fn ascending(mut self) -> Self {
        self.rows.reverse();
        self
    }

    /// Each group's percentage of the total. A zero total gives 0% everywhere.
    pub fn shares(&self) -> Vec<Share> {
        let total = self.total();
        self.rows
            .iter()
            .map(|(label, value)| Share {
                label: label.clone(),
                value: *value,
                percent: if total > 0.0 {
                    100.0 * value / total
                } else {
                    0.0
                },
            })
            .collect()
    }
}

fn descending_by_value() -> SortMultipleOptions {
    SortMultipleOptions {
        descending: vec![true],
        maintain_order: true,
        ..Default::default()
    }
}

fn view_from_frame(df: &DataFrame, dimension: &str) -> Result<AggregatedView> {
    let keys = df.column(KEY)?.str()?;
    let values = df.column(VALUE)?.f64()?;
    let rows = keys
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(k, v)| k.map(|k| (k.to_string(), v.unwrap_or(0.0))))
        .collect();
    Ok(AggregatedView {
        dimension: dimension.to_string(),
        rows,
    })
}

fn scalar_f64(df: &DataFrame) -> Result<f64> {
    Ok(df.column(VALUE)?.f64()?.get(0).unwrap_or(0.0))
}

/// Sum `measure` per `dimension`, largest first.
pub fn sum_by(lf: LazyFrame, dimension: &str, measure: &str) -> Result<AggregatedView> {
    let df = lf
        .filter(col(dimension).is_not_null())
        .group_by_stable([col(dimension).cast(DataType::String).alias(KEY)])
        .agg([col(measure).cast(DataType::Float64).sum().alias(VALUE)])
        .sort_by_exprs(vec![col(VALUE)], descending_by_value())
        .collect()?;
    view_from_frame(&df, dimension)
}

/// Number of rows per `dimension`, largest first.
pub fn count_by(lf: LazyFrame, dimension: &str) -> Result<AggregatedView> {
    let df = lf
        .filter(col(dimension).is_not_null())
        .group_by_stable([col(dimension).cast(DataType::String).alias(KEY)])
        .agg([len().cast(DataType::Float64).alias(VALUE)])
        .sort_by_exprs(vec![col(VALUE)], descending_by_value())
        .collect()?;
    view_from_frame(&df, dimension)
}

/// Sum `measure` per value of the temporal column `period`, oldest first.
/// Periods are returned as `YYYY-MM-DD`.
pub fn sum_by_period(lf: LazyFrame, period: &str, measure: &str) -> Result<Vec<(String, f64)>> {
    let df = lf
        .filter(col(period).is_not_null())
        .group_by_stable([col(period)])
        .agg([col(measure).cast(DataType::Float64).sum().alias(VALUE)])
        .sort_by_exprs(vec![col(period)], SortMultipleOptions::default())
        .select([
            col(period).dt().to_string("%Y-%m-%d").alias(KEY),
            col(VALUE),
        ])
        .collect()?;
    Ok(view_from_frame(&df, period)?.rows)
}

/// Number of rows per (`first`, integer `second`) pair, ordered by `second` then `first`.
pub fn count_by_pair(lf: LazyFrame, first: &str, second: &str) -> Result<Vec<(String, i64, f64)>> {
    let df = lf
        .filter(col(first).is_not_null().and(col(second).is_not_null()))
        .group_by_stable([
            col(first).cast(DataType::String).alias(KEY),
            col(second).cast(DataType::Int64).alias(second),
        ])
        .agg([len().cast(DataType::Float64).alias(VALUE)])
        .sort_by_exprs(vec![col(second), col(KEY)], SortMultipleOptions::default())
        .collect()?;

    let keys = df.column(KEY)?.str()?;
    let periods = df.column(second)?.i64()?;
    let values = df.column(VALUE)?.f64()?;
    let mut cells = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(k), Some(p)) = (keys.get(i), periods.get(i)) {
            cells.push((k.to_string(), p, values.get(i).unwrap_or(0.0)));
        }
    }
    Ok(cells)
}

/// Count of distinct non-null values of `column`.
pub fn distinct_count(lf: LazyFrame, column: &str) -> Result<u64> {
    let df = lf
        .select([col(column)
            .drop_nulls()
            .n_unique()
            .cast(DataType::Float64)
            .alias(VALUE)])
        .collect()?;
    Ok(scalar_f64(&df)? as u64)
}

/// Distinct non-null values of `column`, sorted.
pub fn distinct_sorted(lf: LazyFrame, column: &str) -> Result<Vec<String>> {
    let df = lf
        .select([col(column)
            .cast(DataType::String)
            .drop_nulls()
            .unique()
            .sort(SortOptions::default())
            .alias(KEY)])
        .collect()?;
    Ok(df
        .column(KEY)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

/// Sum of `column`, ignoring nulls. Zero for an empty frame.
pub fn column_sum(lf: LazyFrame, column: &str) -> Result<f64> {
    let df = lf
        .select([col(column).cast(DataType::Float64).sum().alias(VALUE)])
        .collect()?;
    scalar_f64(&df)
}

/// Min, quartiles and max of `measure` per `dimension`, ordered by group name.
/// Quartiles use linear interpolation.
pub fn quartiles_by(lf: LazyFrame, dimension: &str, measure: &str) -> Result<Vec<Quartiles>> {
    let m = || col(measure).cast(DataType::Float64);
    let df = lf
        .filter(col(dimension).is_not_null().and(col(measure).is_not_null()))
        .group_by_stable([col(dimension).cast(DataType::String).alias(KEY)])
        .agg([
            m().min().alias("min"),
            m().quantile(lit(0.25), QuantileMethod::Linear).alias("q1"),
            m().median().alias("median"),
            m().quantile(lit(0.75), QuantileMethod::Linear).alias("q3"),
            m().max().alias("max"),
            len().cast(DataType::Float64).alias("count"),
        ])
        .sort_by_exprs(vec![col(KEY)], SortMultipleOptions::default())
        .collect()?;

    let keys = df.column(KEY)?.str()?;
    let stat = |name: &str| -> Result<Vec<f64>> {
        Ok(df
            .column(name)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    };
    let (min, q1, median, q3, max, count) = (
        stat("min")?,
        stat("q1")?,
        stat("median")?,
        stat("q3")?,
        stat("max")?,
        stat("count")?,
    );

    Ok(keys
        .into_iter()
        .enumerate()
        .filter_map(|(i, k)| {
            k.map(|label| Quartiles {
                label: label.to_string(),
                min: min[i],
                q1: q1[i],
                median: median[i],
                q3: q3[i],
                max: max[i],
                count: count[i] as u64,
            })
        })
        .collect())
}

/// Round to one decimal place, the precision shown in chart titles.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
