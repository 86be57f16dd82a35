//! Tourists choosing where to stay.

use crate::config::{TouristConfig, UtilityWeights};
use crate::model::{Accommodation, AccommodationId, Region};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::Uniform;
use std::collections::BTreeSet;

/// Visitor with a fixed budget and preferences.
#[derive(Debug, Clone)]
pub struct Tourist {
    budget: f64,
    preferred_region: Region,
    desired_amenities: BTreeSet<String>,
    chosen: Option<AccommodationId>,
}

impl Tourist {
    pub fn new(budget: f64, preferred_region: Region, desired_amenities: BTreeSet<String>) -> Self {
        Self {
            budget,
            preferred_region,
            desired_amenities,
            chosen: None,
        }
    }

    /// Draw a tourist: uniform budget, uniform region, and a uniform sample of
    /// distinct amenities from `amenity_pool`.
    pub fn generate<R: Rng>(
        rng: &mut R,
        cfg: &TouristConfig,
        amenity_pool: &[String],
    ) -> Result<Self> {
        let [budget_min, budget_max] = cfg.budget_range;
        let budget = Uniform::new(budget_min, budget_max)?.sample(rng);

        let &preferred_region = Region::ALL
            .choose(rng)
            .context("failed to choose a preferred region")?;

        let [amenity_min, amenity_max] = cfg.amenity_range;
        let n_amenities = rng.random_range(amenity_min..=amenity_max);
        let desired_amenities = amenity_pool
            .choose_multiple(rng, n_amenities)
            .cloned()
            .collect();

        Ok(Self::new(budget, preferred_region, desired_amenities))
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn preferred_region(&self) -> Region {
        self.preferred_region
    }

    pub fn desired_amenities(&self) -> &BTreeSet<String> {
        &self.desired_amenities
    }

    /// Accommodation picked in the latest month a pick was possible.
    pub fn chosen(&self) -> Option<AccommodationId> {
        self.chosen
    }

    /// Anything over budget has no price appeal at all.
    pub fn price_score(&self, acc: &Accommodation) -> f64 {
        let price = acc.price();
        if price > 0.0 && price <= self.budget {
            1.0 / price
        } else {
            0.0
        }
    }

    pub fn location_score(&self, acc: &Accommodation) -> f64 {
        if acc.region() == self.preferred_region {
            1.0
        } else {
            0.0
        }
    }

    /// Share of desired amenities the accommodation offers.
    pub fn amenity_score(&self, acc: &Accommodation) -> f64 {
        if self.desired_amenities.is_empty() {
            return 1.0;
        }
        let n_offered = self
            .desired_amenities
            .intersection(acc.amenities())
            .count();
        n_offered as f64 / self.desired_amenities.len() as f64
    }

    pub fn calculate_utility(&self, acc: &Accommodation, weights: &UtilityWeights) -> f64 {
        weights.price * self.price_score(acc)
            + weights.location * self.location_score(acc)
            + weights.amenity * self.amenity_score(acc)
    }

    /// Pick the first candidate with the highest positive utility.
    ///
    /// When no candidate scores above zero the previous pick is kept.
    pub fn choose_accommodation<'a, I>(
        &mut self,
        candidates: I,
        weights: &UtilityWeights,
    ) -> Option<AccommodationId>
    where
        I: IntoIterator<Item = &'a Accommodation>,
    {
        let mut best_score = 0.0;
        for acc in candidates {
            let score = self.calculate_utility(acc, weights);
            if score > best_score {
                best_score = score;
                self.chosen = Some(acc.id());
            }
        }
        self.chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{AccommodationKind, RentalTier};
    use rand_chacha::ChaCha12Rng;

    const WEIGHTS: UtilityWeights = UtilityWeights {
        price: 0.5,
        location: 0.3,
        amenity: 0.2,
    };

    fn amenities(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn rental(id: usize, price: f64, region: Region, offered: &[&str]) -> Accommodation {
        Accommodation::new(
            AccommodationId(id),
            AccommodationKind::Rental {
                tier: RentalTier::Standard,
            },
            price,
            amenities(offered),
            region,
            100,
        )
    }

    #[test]
    fn over_budget_has_no_price_score() {
        let tourist = Tourist::new(150.0, Region::Mid, amenities(&["WiFi"]));
        let acc = rental(0, 151.0, Region::Mid, &["WiFi"]);
        assert_eq!(tourist.price_score(&acc), 0.0);
        let utility = tourist.calculate_utility(&acc, &WEIGHTS);
        assert!((utility - 0.5).abs() < 1e-12);

        let acc = rental(1, 150.0, Region::Mid, &["WiFi"]);
        assert!((tourist.price_score(&acc) - 1.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn amenity_score_is_share_of_wishes() {
        let tourist = Tourist::new(500.0, Region::Upper, amenities(&["Kitchen", "WiFi"]));
        let none = rental(0, 100.0, Region::Upper, &["Parking"]);
        let half = rental(1, 100.0, Region::Upper, &["WiFi", "Parking"]);
        let all = rental(2, 100.0, Region::Upper, &["Kitchen", "WiFi", "Parking"]);
        assert_eq!(tourist.amenity_score(&none), 0.0);
        assert_eq!(tourist.amenity_score(&half), 0.5);
        assert_eq!(tourist.amenity_score(&all), 1.0);
    }

    #[test]
    fn amenity_score_bounded_for_generated_tourists() {
        let cfg = Config::default();
        let pool = cfg.amenity_pool();
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let offered: Vec<_> = pool.iter().take(6).map(String::as_str).collect();
        let acc = rental(0, 120.0, Region::Lower, &offered);
        for _ in 0..500 {
            let tourist = Tourist::generate(&mut rng, &cfg.tourists, &pool).unwrap();
            let score = tourist.amenity_score(&acc);
            assert!((0.0..=1.0).contains(&score));
            let subset = tourist.desired_amenities().is_subset(acc.amenities());
            assert_eq!(score == 1.0, subset);
        }
    }

    #[test]
    fn generated_tourists_respect_config() {
        let cfg = Config::default();
        let pool = cfg.amenity_pool();
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        for _ in 0..500 {
            let tourist = Tourist::generate(&mut rng, &cfg.tourists, &pool).unwrap();
            assert!((100.0..1500.0).contains(&tourist.budget()));
            assert!((2..=4).contains(&tourist.desired_amenities().len()));
            assert!(tourist.chosen().is_none());
        }
    }

    #[test]
    fn ties_favor_first_candidate() {
        let mut tourist = Tourist::new(300.0, Region::Mid, amenities(&["WiFi"]));
        let candidates = [
            rental(4, 120.0, Region::Mid, &["WiFi"]),
            rental(9, 120.0, Region::Mid, &["WiFi"]),
        ];
        assert_eq!(
            tourist.choose_accommodation(&candidates, &WEIGHTS),
            Some(AccommodationId(4))
        );
        assert_eq!(
            tourist.choose_accommodation(candidates.iter().rev(), &WEIGHTS),
            Some(AccommodationId(9))
        );
    }

    #[test]
    fn picks_highest_utility() {
        let mut tourist = Tourist::new(300.0, Region::Lower, amenities(&["Kitchen"]));
        let candidates = [
            rental(0, 100.0, Region::Mid, &["Kitchen"]),
            rental(1, 250.0, Region::Lower, &["Kitchen"]),
            rental(2, 50.0, Region::Upper, &[]),
        ];
        assert_eq!(
            tourist.choose_accommodation(&candidates, &WEIGHTS),
            Some(AccommodationId(1))
        );
    }

    #[test]
    fn no_positive_utility_keeps_previous_pick() {
        let mut tourist = Tourist::new(100.0, Region::Upper, amenities(&["Spa"]));
        let good = [rental(3, 90.0, Region::Upper, &["Spa"])];
        assert_eq!(tourist.choose_accommodation(&good, &WEIGHTS), Some(AccommodationId(3)));

        let useless = [rental(5, 500.0, Region::Lower, &["Pool"])];
        assert_eq!(tourist.choose_accommodation(&useless, &WEIGHTS), Some(AccommodationId(3)));

        let mut fresh = Tourist::new(100.0, Region::Upper, amenities(&["Spa"]));
        assert_eq!(fresh.choose_accommodation(&useless, &WEIGHTS), None);
    }
}
