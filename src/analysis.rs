use crate::report::{CategoryKind, Report, RunRecord};
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Price and occupancy statistics of one category over every month seen.
struct CategorySummary {
    kind: CategoryKind,
    name: String,
    price: Accumulator,
    occupancy: Accumulator,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    kind: CategoryKind,
    name: &'a str,
    n_months: usize,
    mean_price: f64,
    std_dev_price: f64,
    mean_occupancy: f64,
    std_dev_occupancy: f64,
}

/// Summarizes the reports of several runs per category.
pub struct Analyzer {
    categories: Vec<CategorySummary>,
    n_runs: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            n_runs: 0,
        }
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Add every row of a run's report, keeping categories in report order.
    pub fn add_report(&mut self, report: &Report) {
        for row in report.rows() {
            let idx = match self
                .categories
                .iter()
                .position(|cat| cat.kind == row.kind && cat.name == row.name)
            {
                Some(idx) => idx,
                None => {
                    self.categories.push(CategorySummary {
                        kind: row.kind,
                        name: row.name.clone(),
                        price: Accumulator::new(),
                        occupancy: Accumulator::new(),
                    });
                    self.categories.len() - 1
                }
            };
            let cat = &mut self.categories[idx];
            cat.price.add(row.average_price);
            cat.occupancy.add(row.occupancy_rate);
        }
        self.n_runs += 1;
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let record = RunRecord::load(file)?;
        log::info!("analyzing run with seed {}", record.seed);
        self.add_report(&record.report);
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        for cat in &self.categories {
            let price = cat.price.report();
            let occupancy = cat.occupancy.report();
            writer
                .serialize(SummaryRow {
                    kind: cat.kind,
                    name: &cat.name,
                    n_months: price.n_vals,
                    mean_price: price.mean,
                    std_dev_price: price.std_dev,
                    mean_occupancy: occupancy.mean,
                    std_dev_occupancy: occupancy.std_dev,
                })
                .context("failed to write summary row")?;
        }

        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
