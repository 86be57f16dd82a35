//! Reading and cleaning the hotel, rental and visitor tables.

use crate::config::{Config, InputConfig};
use crate::model::Region;
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

const MONTH_COLUMN: &str = "Month";
const ADR_SUFFIX: &str = " ADR";

/// Average daily rates of each hotel category over the year.
#[derive(Debug, Default)]
pub struct HotelRates {
    rates: HashMap<String, Vec<f64>>,
}

impl HotelRates {
    pub fn insert(&mut self, category: &str, rate: f64) {
        self.rates.entry(category.to_string()).or_default().push(rate);
    }

    /// Mean rate of a category, `None` if it has no rates.
    pub fn average(&self, category: &str) -> Option<f64> {
        let rates = self.rates.get(category)?;
        if rates.is_empty() {
            return None;
        }
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}

/// Short-term rental listing with its region resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalListing {
    pub price: f64,
    pub amenities: BTreeSet<String>,
    pub region: Region,
}

/// Visitors arriving in a month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyVisitors {
    pub month: NaiveDate,
    pub total_visitors: f64,
}

/// Cleaned inputs of a simulation run.
#[derive(Debug)]
pub struct MarketTables {
    pub hotels: HotelRates,
    pub rentals: Vec<RentalListing>,
    /// Sorted ascending by month.
    pub visitors: Vec<MonthlyVisitors>,
}

impl MarketTables {
    /// Load the three tables named in `cfg` from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P, cfg: &Config) -> Result<Self> {
        let dir = dir.as_ref();
        let input = &cfg.input;

        let hotels = read_hotel_rates(open(&dir.join(&input.hotels))?)
            .with_context(|| format!("failed to read {:?}", input.hotels))?;
        let rentals = read_rentals(open(&dir.join(&input.rentals))?, input, &cfg.region_map())
            .with_context(|| format!("failed to read {:?}", input.rentals))?;
        let visitors = read_visitors(open(&dir.join(&input.visitors))?, &input.visitor_columns)
            .with_context(|| format!("failed to read {:?}", input.visitors))?;

        log::info!(
            "loaded {} rental listings and {} months of visitors",
            rentals.len(),
            visitors.len()
        );

        Ok(Self {
            hotels,
            rentals,
            visitors,
        })
    }
}

fn open(file: &Path) -> Result<BufReader<File>> {
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    Ok(BufReader::new(file))
}

/// Read a table with a `Month` column and one `"<category> ADR"` column per
/// hotel category. Empty cells are skipped.
pub fn read_hotel_rates<R: Read>(reader: R) -> Result<HotelRates> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("failed to read header")?.clone();
    column_index(&headers, MONTH_COLUMN)?;

    let adr_columns: Vec<_> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| Some((idx, name.strip_suffix(ADR_SUFFIX)?)))
        .collect();
    if adr_columns.is_empty() {
        bail!("no ADR columns found");
    }

    let mut rates = HotelRates::default();
    for (i_row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {i_row}"))?;
        for &(idx, category) in &adr_columns {
            let cell = record.get(idx).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            let rate = parse_amount(cell)
                .with_context(|| format!("invalid {category} ADR in row {i_row}"))?;
            rates.insert(category, rate);
        }
    }

    Ok(rates)
}

/// Read rental listings, resolving each neighbourhood to its region.
///
/// Listings without a positive price or in an unknown neighbourhood are dropped.
pub fn read_rentals<R: Read>(
    reader: R,
    input: &InputConfig,
    region_map: &HashMap<String, Region>,
) -> Result<Vec<RentalListing>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("failed to read header")?.clone();
    let price_idx = column_index(&headers, &input.price_column)?;
    let amenities_idx = column_index(&headers, &input.amenities_column)?;
    let neighbourhood_idx = column_index(&headers, &input.neighbourhood_column)?;

    let mut listings = Vec::new();
    let mut n_unpriced = 0;
    let mut n_unmapped = 0;
    for (i_row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {i_row}"))?;

        let price = record.get(price_idx).unwrap_or_default().trim();
        if price.is_empty() {
            n_unpriced += 1;
            continue;
        }
        let price = parse_amount(price).with_context(|| format!("invalid price in row {i_row}"))?;
        if price <= 0.0 {
            n_unpriced += 1;
            continue;
        }

        let neighbourhood = record.get(neighbourhood_idx).unwrap_or_default().trim();
        let Some(&region) = region_map.get(neighbourhood) else {
            n_unmapped += 1;
            continue;
        };

        let amenities = parse_amenities(record.get(amenities_idx).unwrap_or_default());

        listings.push(RentalListing {
            price,
            amenities,
            region,
        });
    }

    if n_unpriced > 0 {
        log::warn!("dropped {n_unpriced} listings without a positive price");
    }
    if n_unmapped > 0 {
        log::warn!("dropped {n_unmapped} listings outside the configured neighbourhoods");
    }

    Ok(listings)
}

/// Read monthly visitor counts, summing `columns`, sorted by month.
pub fn read_visitors<R: Read>(reader: R, columns: &[String]) -> Result<Vec<MonthlyVisitors>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("failed to read header")?.clone();
    let month_idx = column_index(&headers, MONTH_COLUMN)?;
    let count_idxs = columns
        .iter()
        .map(|column| column_index(&headers, column))
        .collect::<Result<Vec<_>>>()?;

    let mut visitors = Vec::new();
    for (i_row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {i_row}"))?;

        let month = record.get(month_idx).unwrap_or_default();
        let month = parse_month(month).with_context(|| format!("invalid month in row {i_row}"))?;

        let mut total_visitors = 0.0;
        for (&idx, column) in count_idxs.iter().zip(columns) {
            let count = record.get(idx).unwrap_or_default().trim();
            total_visitors += parse_amount(count)
                .with_context(|| format!("invalid {column:?} in row {i_row}"))?;
        }

        visitors.push(MonthlyVisitors {
            month,
            total_visitors,
        });
    }

    ensure!(!visitors.is_empty(), "visitor table has no rows");

    visitors.sort_by_key(|row| row.month);
    if let Some(pair) = visitors.windows(2).find(|pair| pair[0].month == pair[1].month) {
        bail!("month {} appears more than once", pair[0].month);
    }

    Ok(visitors)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .with_context(|| format!("missing column {name:?}"))
}

/// Parse a number, ignoring currency signs and thousands separators.
fn parse_amount(cell: &str) -> Result<f64> {
    let cleaned: String = cell.chars().filter(|&c| c != '$' && c != ',').collect();
    let amount = cleaned
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{cell:?} is not a number"))?;
    ensure!(amount.is_finite(), "{cell:?} is not a finite number");
    Ok(amount)
}

/// Accepts `2023-01-01` with an optional trailing time.
fn parse_month(cell: &str) -> Result<NaiveDate> {
    let date = cell.split_whitespace().next().unwrap_or_default();
    let month = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("{cell:?} is not a YYYY-MM-DD date"))?;
    Ok(month)
}

/// Split a comma-separated amenity list, also accepting `["A", "B"]`.
fn parse_amenities(cell: &str) -> BTreeSet<String> {
    cell.split(',')
        .map(|item| item.trim().trim_matches(['[', ']', '"']).trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotel_rates_average_per_category() {
        let table = "\
Month,Luxury ADR,Upscale ADR,Occupancy
01-Jan,\"$1,000.00\",200,0.7
01-Feb,500,,0.8
";
        let rates = read_hotel_rates(table.as_bytes()).unwrap();
        assert_eq!(rates.average("Luxury"), Some(750.0));
        assert_eq!(rates.average("Upscale"), Some(200.0));
        assert_eq!(rates.average("Occupancy"), None);
        assert_eq!(rates.average("Midscale"), None);
    }

    #[test]
    fn hotel_table_needs_month_column() {
        let table = "Luxury ADR\n300\n";
        assert!(read_hotel_rates(table.as_bytes()).is_err());
    }

    #[test]
    fn rentals_resolve_regions() {
        let cfg = Config::default();
        let table = "\
id,price,amenities,neighbourhood_cleansed
1,$85.00,\"WiFi, Kitchen\",Harlem
2,\"$1,250.00\",\"[\"\"Parking\"\"]\",Chelsea
3,,WiFi,Soho
4,$120.00,WiFi,Staten Island
5,$0.00,WiFi,Soho
";
        let listings = read_rentals(table.as_bytes(), &cfg.input, &cfg.region_map()).unwrap();
        assert_eq!(
            listings,
            vec![
                RentalListing {
                    price: 85.0,
                    amenities: BTreeSet::from(["Kitchen".to_string(), "WiFi".to_string()]),
                    region: Region::Upper,
                },
                RentalListing {
                    price: 1250.0,
                    amenities: BTreeSet::from(["Parking".to_string()]),
                    region: Region::Mid,
                },
            ]
        );
    }

    #[test]
    fn malformed_rental_price_is_an_error() {
        let cfg = Config::default();
        let table = "price,amenities,neighbourhood_cleansed\nfree,WiFi,Soho\n";
        assert!(read_rentals(table.as_bytes(), &cfg.input, &cfg.region_map()).is_err());
    }

    #[test]
    fn visitors_are_summed_and_sorted() {
        let columns = ["JFK".to_string(), "LGA".to_string()];
        let table = "\
Month,JFK,LGA
2023-02-01,\"600,000\",300000
2023-01-01 00:00:00,500000,250000
";
        let visitors = read_visitors(table.as_bytes(), &columns).unwrap();
        assert_eq!(visitors.len(), 2);
        assert_eq!(visitors[0].month, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(visitors[0].total_visitors, 750_000.0);
        assert_eq!(visitors[1].total_visitors, 900_000.0);
    }

    #[test]
    fn duplicate_months_are_rejected() {
        let columns = ["JFK".to_string()];
        let table = "Month,JFK\n2023-01-01,5\n2023-01-01,6\n";
        assert!(read_visitors(table.as_bytes(), &columns).is_err());
    }

    #[test]
    fn empty_visitor_table_is_rejected() {
        let columns = ["JFK".to_string()];
        assert!(read_visitors("Month,JFK\n".as_bytes(), &columns).is_err());
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        let cfg = Config::default();
        let columns = ["JFK".to_string()];
        for cell in ["NaN", "inf", "-inf"] {
            let visitors = format!("Month,JFK\n2023-01-01,{cell}\n");
            assert!(read_visitors(visitors.as_bytes(), &columns).is_err());

            let rentals = format!("price,amenities,neighbourhood_cleansed\n{cell},WiFi,Soho\n");
            assert!(read_rentals(rentals.as_bytes(), &cfg.input, &cfg.region_map()).is_err());

            let hotels = format!("Month,Luxury ADR\n01-Jan,{cell}\n");
            assert!(read_hotel_rates(hotels.as_bytes()).is_err());
        }
    }
}
