use crate::config::{Config, MarketConfig, OccupancyMode, UtilityWeights};
use crate::input::{MarketTables, MonthlyVisitors};
use crate::model::{Accommodation, AccommodationId, AccommodationKind, RentalTier};
use crate::pricing::adjust_pricing;
use crate::report::{CategoryTally, Report};
use crate::tourist::Tourist;
use anyhow::{Context, Result, bail, ensure};
use rand::prelude::*;
use rand_distr::Uniform;

/// Lowest starting price of a hotel category.
const MIN_INITIAL_PRICE: f64 = 1.0;

/// Simulation engine.
///
/// Owns the accommodation and tourist populations together with the random
/// number generator, and advances the market one month at a time.
pub struct Engine<R: Rng> {
    market: MarketConfig,
    weights: UtilityWeights,
    accommodations: Vec<Accommodation>,
    tourists: Vec<Tourist>,
    /// Order in which tourists scan accommodations, reshuffled every month.
    scan_order: Vec<usize>,
    /// One empty tally per category present, in report order.
    categories: Vec<CategoryTally>,
    rng: R,
}

impl<R: Rng> Engine<R> {
    /// Create an `Engine` from the prepared tables, drawing the tourist
    /// population from `rng`.
    pub fn generate_initial_condition(
        cfg: &Config,
        tables: &MarketTables,
        mut rng: R,
    ) -> Result<Self> {
        let capacity = cfg.market.capacity;
        let mut accommodations = Vec::with_capacity(cfg.hotels.len() + tables.rentals.len());

        for hotel in &cfg.hotels {
            let rate = tables
                .hotels
                .average(&hotel.name)
                .with_context(|| format!("no rates for hotel category {:?}", hotel.name))?;
            accommodations.push(Accommodation::new(
                AccommodationId(accommodations.len()),
                AccommodationKind::Hotel {
                    category: hotel.name.clone(),
                },
                rate.max(MIN_INITIAL_PRICE),
                hotel.amenities.iter().cloned().collect(),
                hotel.region,
                capacity,
            ));
        }

        for listing in &tables.rentals {
            let tier = RentalTier::from_price(listing.price, cfg.rentals.tier_bounds);
            accommodations.push(Accommodation::new(
                AccommodationId(accommodations.len()),
                AccommodationKind::Rental { tier },
                listing.price,
                listing.amenities.clone(),
                listing.region,
                capacity,
            ));
        }

        let amenity_pool = cfg.amenity_pool();
        let tourists = (0..cfg.tourists.count)
            .map(|_| Tourist::generate(&mut rng, &cfg.tourists, &amenity_pool))
            .collect::<Result<Vec<_>>>()
            .context("failed to generate tourists")?;
        for (i_tourist, tourist) in tourists.iter().enumerate() {
            log::debug!(
                "tourist {i_tourist}: budget {:.2}, prefers {}, wants {:?}",
                tourist.budget(),
                tourist.preferred_region(),
                tourist.desired_amenities()
            );
        }

        Self::new(cfg.market.clone(), cfg.tourists.weights, accommodations, tourists, rng)
    }

    /// Assemble an `Engine` from existing populations.
    ///
    /// Accommodation ids must equal their positions in `accommodations`.
    pub fn new(
        market: MarketConfig,
        weights: UtilityWeights,
        accommodations: Vec<Accommodation>,
        tourists: Vec<Tourist>,
        rng: R,
    ) -> Result<Self> {
        ensure!(!accommodations.is_empty(), "no accommodations to simulate");
        for (idx, acc) in accommodations.iter().enumerate() {
            ensure!(
                acc.id() == AccommodationId(idx),
                "accommodation at position {idx} has id {:?}",
                acc.id()
            );
            ensure!(acc.capacity() > 0, "accommodation {idx} has zero capacity");
            ensure!(
                acc.capacity() as usize >= tourists.len(),
                "accommodation {idx} has capacity {} for {} tourists",
                acc.capacity(),
                tourists.len()
            );
        }

        let categories = categories_in_report_order(&accommodations);
        let scan_order = (0..accommodations.len()).collect();

        log::info!(
            "initialized {} accommodations in {} categories and {} tourists",
            accommodations.len(),
            categories.len(),
            tourists.len()
        );

        Ok(Self {
            market,
            weights,
            accommodations,
            tourists,
            scan_order,
            categories,
            rng,
        })
    }

    pub fn tourists(&self) -> &[Tourist] {
        &self.tourists
    }

    /// Run every month of `visitors`, which must be sorted ascending.
    pub fn perform_simulation(&mut self, visitors: &[MonthlyVisitors]) -> Result<Report> {
        ensure!(!visitors.is_empty(), "no months to simulate");
        if let Some(pair) = visitors.windows(2).find(|pair| pair[0].month >= pair[1].month) {
            bail!(
                "months must be strictly ascending, but {} is followed by {}",
                pair[0].month,
                pair[1].month
            );
        }

        let mut report = Report::new();
        for (i_month, month) in visitors.iter().enumerate() {
            self.perform_step(month, &mut report)
                .with_context(|| format!("failed to simulate {}", month.month))?;

            let progress = 100.0 * (i_month + 1) as f64 / visitors.len() as f64;
            log::info!("completed {progress:06.2}%");
        }

        Ok(report)
    }

    /// Advance the market by one month and append its rows to `report`.
    pub fn perform_step(&mut self, month: &MonthlyVisitors, report: &mut Report) -> Result<()> {
        let demand_factor = month.total_visitors / self.market.demand_scale;

        // Reprice before tourists look at the market.
        for acc in &mut self.accommodations {
            adjust_pricing(acc, demand_factor, &self.market);
        }

        // Ties go to whichever candidate is scanned first.
        self.scan_order.shuffle(&mut self.rng);

        for tourist in &mut self.tourists {
            let candidates = self.scan_order.iter().map(|&idx| &self.accommodations[idx]);
            let chosen = tourist.choose_accommodation(candidates, &self.weights);
            if let Some(AccommodationId(idx)) = chosen {
                self.accommodations[idx].add_guest();
            }
        }
        let n_placed: u32 = self
            .accommodations
            .iter()
            .map(Accommodation::current_occupancy)
            .sum();

        for acc in &mut self.accommodations {
            acc.update_occupancy_rate();
        }

        let mut tallies = self.categories.clone();
        for acc in &self.accommodations {
            let tally = tallies
                .iter_mut()
                .find(|tally| tally.matches(acc))
                .with_context(|| format!("no category for accommodation {:?}", acc.id()))?;
            tally.add(acc);
        }

        let label = month.month.format("%Y-%m").to_string();
        match self.market.occupancy {
            OccupancyMode::Tally => {
                report.record_month(&label, &tallies, CategoryTally::occupancy_rate);
            }
            OccupancyMode::Random => {
                let noise = Uniform::new(0.0, 100.0)?;
                report.record_month(&label, &tallies, |_| noise.sample(&mut self.rng));
            }
        }

        log::debug!(
            "{label}: demand factor {demand_factor:.3}, {n_placed} of {} tourists placed",
            self.tourists.len()
        );

        for acc in &mut self.accommodations {
            acc.reset_occupancy();
        }

        Ok(())
    }
}

/// Hotel categories in order of appearance, then rental tiers by price.
fn categories_in_report_order(accommodations: &[Accommodation]) -> Vec<CategoryTally> {
    let mut categories: Vec<CategoryTally> = Vec::new();
    for acc in accommodations {
        if matches!(acc.kind(), AccommodationKind::Hotel { .. })
            && !categories.iter().any(|tally| tally.matches(acc))
        {
            categories.push(CategoryTally::of(acc));
        }
    }
    for tier in RentalTier::ALL {
        let first = accommodations
            .iter()
            .find(|acc| matches!(acc.kind(), AccommodationKind::Rental { tier: t } if *t == tier));
        if let Some(acc) = first {
            categories.push(CategoryTally::of(acc));
        }
    }
    categories
}
