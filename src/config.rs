use crate::model::Region;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fmt::Debug,
    fs,
    ops::RangeBounds,
    path::Path,
};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub input: InputConfig,
    pub regions: Vec<RegionConfig>,
    pub hotels: Vec<HotelConfig>,
    pub rentals: RentalConfig,
    pub market: MarketConfig,
    pub tourists: TouristConfig,
}

/// Location and layout of the input tables.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Hotel ADR table, relative to the simulation directory.
    pub hotels: String,
    /// Rental listings table, relative to the simulation directory.
    pub rentals: String,
    /// Monthly visitors table, relative to the simulation directory.
    pub visitors: String,

    /// Visitor count columns summed into the monthly total.
    pub visitor_columns: Vec<String>,

    pub price_column: String,
    pub amenities_column: String,
    pub neighbourhood_column: String,
}

/// Neighbourhoods belonging to a region.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub region: Region,
    pub neighbourhoods: Vec<String>,
}

/// Hotel category, priced from the `"<name> ADR"` column.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotelConfig {
    pub name: String,
    pub amenities: Vec<String>,
    pub region: Region,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RentalConfig {
    /// Amenities rentals advertise, offered to tourists as preferences.
    pub amenities: Vec<String>,
    /// Upper price bounds of the budget and standard tiers.
    pub tier_bounds: [f64; 2],
}

/// How the reported occupancy of a category is obtained.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyMode {
    /// Share of category capacity taken by tourists this month.
    Tally,
    /// Uniform noise in `[0, 100)`.
    Random,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    /// Visitors per month corresponding to a demand factor of 1.
    pub demand_scale: f64,
    /// Relative price change per unit of demand above baseline.
    pub price_sensitivity: f64,
    /// Maximum relative price growth per month.
    pub max_price_growth: f64,
    /// Lowest price an adjustment may produce.
    pub price_floor: f64,
    /// Capacity of every accommodation.
    pub capacity: u32,
    pub occupancy: OccupancyMode,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TouristConfig {
    /// Number of tourists.
    pub count: usize,
    /// Range the budget is uniformly drawn from.
    pub budget_range: [f64; 2],
    /// Range the number of desired amenities is uniformly drawn from.
    pub amenity_range: [usize; 2],
    pub weights: UtilityWeights,
}

/// Weights of the utility terms.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityWeights {
    pub price: f64,
    pub location: f64,
    pub amenity: f64,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    /// Map from neighbourhood name to its region.
    pub fn region_map(&self) -> HashMap<String, Region> {
        self.regions
            .iter()
            .flat_map(|cfg| cfg.neighbourhoods.iter().map(|n| (n.clone(), cfg.region)))
            .collect()
    }

    /// Every amenity a tourist may wish for, deduplicated and sorted.
    pub fn amenity_pool(&self) -> Vec<String> {
        let pool: BTreeSet<_> = self
            .hotels
            .iter()
            .flat_map(|hotel| hotel.amenities.iter())
            .chain(self.rentals.amenities.iter())
            .cloned()
            .collect();
        pool.into_iter().collect()
    }

    fn validate(&self) -> Result<()> {
        if self.input.visitor_columns.is_empty() {
            bail!("at least one visitor column is required");
        }

        let mut seen = HashMap::new();
        for cfg in &self.regions {
            for neighbourhood in &cfg.neighbourhoods {
                if let Some(other) = seen.insert(neighbourhood, cfg.region) {
                    bail!(
                        "neighbourhood {neighbourhood:?} is mapped to both {other} and {}",
                        cfg.region
                    );
                }
            }
        }

        check_num(self.hotels.len(), 1..100).context("invalid number of hotel categories")?;
        let mut names = BTreeSet::new();
        for hotel in &self.hotels {
            if !names.insert(&hotel.name) {
                bail!("hotel category {:?} is defined twice", hotel.name);
            }
        }

        let [budget_tier_max, standard_tier_max] = self.rentals.tier_bounds;
        check_num(budget_tier_max, 0.0..standard_tier_max).context("invalid rental tier bounds")?;

        let market = &self.market;
        check_num(market.demand_scale, 1.0..).context("invalid demand scale")?;
        check_num(market.price_sensitivity, 0.0..=1.0).context("invalid price sensitivity")?;
        check_num(market.max_price_growth, 0.0..=1.0).context("invalid maximum price growth")?;
        check_num(market.price_floor, 0.0..).context("invalid price floor")?;
        check_num(market.capacity, 1..=1_000_000).context("invalid capacity")?;

        let tourists = &self.tourists;
        check_num(tourists.count, 1..1_000_000).context("invalid number of tourists")?;
        if tourists.count > market.capacity as usize {
            bail!(
                "{} tourists could overfill an accommodation of capacity {}",
                tourists.count,
                market.capacity
            );
        }
        let [budget_min, budget_max] = tourists.budget_range;
        check_num(budget_min, 0.0..budget_max).context("invalid budget range")?;
        let [amenity_min, amenity_max] = tourists.amenity_range;
        check_num(amenity_min, 1..=amenity_max).context("invalid amenity range")?;
        let pool_len = self.amenity_pool().len();
        check_num(amenity_max, 1..=pool_len).context("amenity range exceeds amenity pool")?;

        let weights = &tourists.weights;
        check_num(weights.price, 0.0..).context("invalid price weight")?;
        check_num(weights.location, 0.0..).context("invalid location weight")?;
        check_num(weights.amenity, 0.0..).context("invalid amenity weight")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    /// Manhattan setup with five hotel categories and three regions.
    fn default() -> Self {
        let hotel = |name: &str, amenities: &[&str], region| HotelConfig {
            name: name.to_string(),
            amenities: strings(amenities),
            region,
        };
        Self {
            input: InputConfig {
                hotels: "hotels.csv".to_string(),
                rentals: "rentals.csv".to_string(),
                visitors: "visitors.csv".to_string(),
                visitor_columns: strings(&["JFK visitors (2023)", "LaGuardia visitors (2023)"]),
                price_column: "price".to_string(),
                amenities_column: "amenities".to_string(),
                neighbourhood_column: "neighbourhood_cleansed".to_string(),
            },
            regions: vec![
                RegionConfig {
                    region: Region::Upper,
                    neighbourhoods: strings(&[
                        "Harlem",
                        "Inwood",
                        "Washington Heights",
                        "Upper East Side",
                        "Upper West Side",
                    ]),
                },
                RegionConfig {
                    region: Region::Mid,
                    neighbourhoods: strings(&[
                        "Midtown",
                        "Murray Hill",
                        "Hell's Kitchen",
                        "Chelsea",
                        "Gramercy",
                    ]),
                },
                RegionConfig {
                    region: Region::Lower,
                    neighbourhoods: strings(&[
                        "Lower East Side",
                        "East Village",
                        "West Village",
                        "Soho",
                        "Chinatown",
                        "Financial District",
                    ]),
                },
            ],
            hotels: vec![
                hotel("Luxury", &["Spa", "Fine Dining", "Concierge Service"], Region::Mid),
                hotel(
                    "Upper Upscale",
                    &["Fitness Center", "Business Center", "Room Service"],
                    Region::Mid,
                ),
                hotel("Upscale", &["Free Wi-Fi", "Parking", "Restaurant"], Region::Mid),
                hotel(
                    "Upper Midscale",
                    &["Complimentary Breakfast", "Free Wi-Fi", "Pool"],
                    Region::Lower,
                ),
                hotel(
                    "Luxury Upper Manhattan",
                    &["Unique Experience", "Prime Location", "Exclusive Services"],
                    Region::Upper,
                ),
            ],
            rentals: RentalConfig {
                amenities: strings(&["Kitchen", "Private Room", "Unique Experience", "WiFi", "Parking"]),
                tier_bounds: [100.0, 200.0],
            },
            market: MarketConfig {
                demand_scale: 1_000_000.0,
                price_sensitivity: 0.1,
                max_price_growth: 0.05,
                price_floor: 10.0,
                capacity: 100,
                occupancy: OccupancyMode::Tally,
            },
            tourists: TouristConfig {
                count: 100,
                budget_range: [100.0, 1500.0],
                amenity_range: [2, 4],
                weights: UtilityWeights {
                    price: 0.5,
                    location: 0.3,
                    amenity: 0.2,
                },
            },
        }
    }
}
