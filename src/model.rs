//! Accommodation agents of the lodging market.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Area of Manhattan an accommodation is located in or a tourist prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Upper Manhattan")]
    Upper,
    #[serde(rename = "Mid Manhattan")]
    Mid,
    #[serde(rename = "Lower Manhattan")]
    Lower,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Upper, Region::Mid, Region::Lower];

    pub fn label(self) -> &'static str {
        match self {
            Region::Upper => "Upper Manhattan",
            Region::Mid => "Mid Manhattan",
            Region::Lower => "Lower Manhattan",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price tier of a short-term rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RentalTier {
    Budget,
    Standard,
    Premium,
}

impl RentalTier {
    pub const ALL: [RentalTier; 3] = [RentalTier::Budget, RentalTier::Standard, RentalTier::Premium];

    /// Classify a price using right-inclusive bins `(0, budget_max]`,
    /// `(budget_max, standard_max]` and `(standard_max, inf)`.
    pub fn from_price(price: f64, bounds: [f64; 2]) -> Self {
        if price <= bounds[0] {
            RentalTier::Budget
        } else if price <= bounds[1] {
            RentalTier::Standard
        } else {
            RentalTier::Premium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RentalTier::Budget => "Budget",
            RentalTier::Standard => "Standard",
            RentalTier::Premium => "Premium",
        }
    }
}

/// Index of an accommodation in the market population.
///
/// Tourists hold this key instead of a reference to their current pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccommodationId(pub usize);

/// Variant of an accommodation together with its category label.
#[derive(Debug, Clone, PartialEq)]
pub enum AccommodationKind {
    Hotel { category: String },
    Rental { tier: RentalTier },
}

impl AccommodationKind {
    pub fn category(&self) -> &str {
        match self {
            AccommodationKind::Hotel { category } => category,
            AccommodationKind::Rental { tier } => tier.label(),
        }
    }
}

/// Hotel category or rental unit acting as a pricing agent.
#[derive(Debug, Clone)]
pub struct Accommodation {
    id: AccommodationId,
    kind: AccommodationKind,
    base_price: f64,
    amenities: BTreeSet<String>,
    region: Region,
    capacity: u32,
    current_occupancy: u32,
    occupancy_rate: f64,
}

impl Accommodation {
    pub fn new(
        id: AccommodationId,
        kind: AccommodationKind,
        base_price: f64,
        amenities: BTreeSet<String>,
        region: Region,
        capacity: u32,
    ) -> Self {
        Self {
            id,
            kind,
            base_price,
            amenities,
            region,
            capacity,
            current_occupancy: 0,
            occupancy_rate: 0.0,
        }
    }

    pub fn id(&self) -> AccommodationId {
        self.id
    }

    pub fn kind(&self) -> &AccommodationKind {
        &self.kind
    }

    pub fn price(&self) -> f64 {
        self.base_price
    }

    pub fn set_price(&mut self, price: f64) {
        self.base_price = price;
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn amenities(&self) -> &BTreeSet<String> {
        &self.amenities
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn current_occupancy(&self) -> u32 {
        self.current_occupancy
    }

    /// Occupancy as a percentage of capacity, as of the last
    /// [`Accommodation::update_occupancy_rate`] call.
    pub fn occupancy_rate(&self) -> f64 {
        self.occupancy_rate
    }

    /// Register one tourist staying this month.
    pub fn add_guest(&mut self) {
        self.current_occupancy += 1;
    }

    pub fn update_occupancy_rate(&mut self) {
        self.occupancy_rate = if self.capacity > 0 {
            100.0 * self.current_occupancy as f64 / self.capacity as f64
        } else {
            0.0
        };
    }

    /// Clear the monthly tally.
    pub fn reset_occupancy(&mut self) {
        self.current_occupancy = 0;
    }
}
