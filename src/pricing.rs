//! Demand-driven repricing of accommodations.

use crate::config::MarketConfig;
use crate::model::Accommodation;

/// Price after one month of demand `demand_factor` (1 is the baseline).
///
/// The candidate price moves by `price_sensitivity` per unit of demand away
/// from the baseline. It is raised to `price_floor` and then capped at
/// `max_price_growth` above `price`, so the cap wins when `price` is already
/// below the floor.
pub fn adjusted_price(price: f64, demand_factor: f64, market: &MarketConfig) -> f64 {
    let price_change = (demand_factor - 1.0) * market.price_sensitivity;
    let candidate = price * (1.0 + price_change);
    let ceiling = price * (1.0 + market.max_price_growth);
    candidate.max(market.price_floor).min(ceiling)
}

pub fn adjust_pricing(acc: &mut Accommodation, demand_factor: f64, market: &MarketConfig) {
    let price = adjusted_price(acc.price(), demand_factor, market);
    acc.set_price(price);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{AccommodationId, AccommodationKind, Region, RentalTier};
    use rand::prelude::*;
    use rand_chacha::ChaCha12Rng;
    use std::collections::BTreeSet;

    fn market() -> MarketConfig {
        Config::default().market
    }

    fn rental(price: f64) -> Accommodation {
        Accommodation::new(
            AccommodationId(0),
            AccommodationKind::Rental {
                tier: RentalTier::Budget,
            },
            price,
            BTreeSet::new(),
            Region::Lower,
            100,
        )
    }

    #[test]
    fn high_demand_is_capped_by_growth_limit() {
        let mut acc = rental(100.0);
        adjust_pricing(&mut acc, 2.0, &market());
        assert!((acc.price() - 105.0).abs() < 1e-9);
    }

    #[test]
    fn zero_demand_lowers_price() {
        let mut acc = rental(100.0);
        adjust_pricing(&mut acc, 0.0, &market());
        assert!((acc.price() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn baseline_demand_keeps_price() {
        assert_eq!(adjusted_price(250.0, 1.0, &market()), 250.0);
    }

    #[test]
    fn low_prices_stop_at_floor() {
        assert_eq!(adjusted_price(10.5, 0.0, &market()), 10.0);
    }

    #[test]
    fn prices_below_floor_climb_by_growth_limit() {
        let market = market();
        for demand_factor in [0.0, 1.0, 3.0] {
            assert!((adjusted_price(5.0, demand_factor, &market) - 5.25).abs() < 1e-9);
        }

        let mut price = 5.0;
        let mut n_months = 0;
        while price < market.price_floor {
            price = adjusted_price(price, 0.0, &market);
            n_months += 1;
        }
        assert_eq!(n_months, 15);
        assert_eq!(price, market.price_floor);
    }

    #[test]
    fn price_stays_within_floor_and_ceiling() {
        let market = market();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let price = rng.random_range(market.price_floor..5_000.0);
            let demand_factor = rng.random_range(0.0..20.0);
            let new_price = adjusted_price(price, demand_factor, &market);
            assert!(new_price >= market.price_floor, "{price} {demand_factor} {new_price}");
            assert!(new_price <= price * 1.05, "{price} {demand_factor} {new_price}");
        }
    }
}
