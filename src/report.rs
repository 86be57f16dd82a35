//! Monthly per-category market statistics.

use crate::model::{Accommodation, AccommodationKind};
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Whether a report row describes hotels or rentals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryKind {
    Hotel,
    Rental,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Hotel => f.write_str("Hotel"),
            CategoryKind::Rental => f.write_str("Rental"),
        }
    }
}

/// Running totals of the accommodations in one category during a month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTally {
    pub kind: CategoryKind,
    pub name: String,
    pub n_agents: usize,
    pub price_sum: f64,
    /// Occupied units, from each accommodation's occupancy rate.
    pub occupied: f64,
    pub capacity: u64,
}

impl CategoryTally {
    pub fn new(kind: CategoryKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            n_agents: 0,
            price_sum: 0.0,
            occupied: 0.0,
            capacity: 0,
        }
    }

    /// Tally for the category `acc` belongs to.
    pub fn of(acc: &Accommodation) -> Self {
        let kind = match acc.kind() {
            AccommodationKind::Hotel { .. } => CategoryKind::Hotel,
            AccommodationKind::Rental { .. } => CategoryKind::Rental,
        };
        Self::new(kind, acc.kind().category())
    }

    pub fn matches(&self, acc: &Accommodation) -> bool {
        let kind_matches = matches!(
            (self.kind, acc.kind()),
            (CategoryKind::Hotel, AccommodationKind::Hotel { .. })
                | (CategoryKind::Rental, AccommodationKind::Rental { .. })
        );
        kind_matches && self.name == acc.kind().category()
    }

    pub fn add(&mut self, acc: &Accommodation) {
        self.n_agents += 1;
        self.price_sum += acc.price();
        self.occupied += acc.occupancy_rate() * f64::from(acc.capacity()) / 100.0;
        self.capacity += u64::from(acc.capacity());
    }

    pub fn average_price(&self) -> f64 {
        self.price_sum / self.n_agents as f64
    }

    /// Occupied units as a percentage of the category's combined capacity.
    pub fn occupancy_rate(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        100.0 * self.occupied / self.capacity as f64
    }
}

/// Statistics of one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Month as `YYYY-MM`.
    pub month: String,
    pub kind: CategoryKind,
    pub name: String,
    /// Percentage of the category's capacity.
    pub occupancy_rate: f64,
    pub average_price: f64,
}

impl ReportRow {
    pub fn occupancy_label(&self) -> String {
        format!("{:.2}%", self.occupancy_rate)
    }

    pub fn price_label(&self) -> String {
        format_currency(self.average_price)
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.month,
            self.kind,
            self.name,
            self.occupancy_label(),
            self.price_label()
        )
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Month")]
    month: &'a str,
    #[serde(rename = "Agent Type")]
    kind: CategoryKind,
    #[serde(rename = "Agent Name")]
    name: &'a str,
    #[serde(rename = "Occupancy Rate")]
    occupancy_rate: String,
    #[serde(rename = "Pricing")]
    price: String,
}

/// Rows of a run, ordered by month and then by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row per tally, in tally order.
    ///
    /// `occupancy` supplies the reported occupancy rate of each category.
    pub fn record_month<F>(&mut self, month: &str, tallies: &[CategoryTally], mut occupancy: F)
    where
        F: FnMut(&CategoryTally) -> f64,
    {
        for tally in tallies {
            self.rows.push(ReportRow {
                month: month.to_string(),
                kind: tally.kind,
                name: tally.name.clone(),
                occupancy_rate: occupancy(tally),
                average_price: tally.average_price(),
            });
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Write the rows as CSV with formatted occupancy and price columns.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            writer
                .serialize(CsvRow {
                    month: &row.month,
                    kind: row.kind,
                    name: &row.name,
                    occupancy_rate: row.occupancy_label(),
                    price: row.price_label(),
                })
                .context("failed to write report row")?;
        }
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}

/// Outcome of a run together with the seed that reproduces it.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub seed: u64,
    pub report: Report,
}

impl RunRecord {
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, self).context("failed to serialize run record")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let record = decode::from_read(&mut reader).context("failed to deserialize run record")?;
        Ok(record)
    }
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, digit) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}
