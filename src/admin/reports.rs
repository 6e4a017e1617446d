//! Booking report over a window of booking days.
//!
//! Counts booked units per room type and per hotel and sums revenue (units
//! times the room's list price) per day and per hotel. Cancelled bookings are
//! left out.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::db::InventoryStore;
use crate::error::{AppError, Result};
use crate::models::ReportLine;
use crate::pricing::services::today;

/// Days covered when no start is given
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
/// Entries kept in each ranking
pub const TOP_ENTRIES: usize = 10;
/// Label for lines whose hotel record is gone
pub const UNKNOWN_HOTEL: &str = "Unknown";

/// Report window, both ends inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTotal {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub room_types: Vec<NamedCount>,
    pub hotels: Vec<NamedCount>,
    pub revenue_by_day: Vec<DailyTotal>,
    pub revenue_by_hotel: Vec<NamedTotal>,
}

/// Resolve the window: `end` defaults to today, `start` to a week before `end`
fn window(query: &ReportQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let end = query.end.unwrap_or(today);
    let start = query
        .start
        .unwrap_or(end - Duration::days(DEFAULT_WINDOW_DAYS));
    if start > end {
        return Err(AppError::Validation(format!(
            "report start {} is after its end {}",
            start, end
        )));
    }
    Ok((start, end))
}

/// Largest first, ties by name
fn top_counts(counts: HashMap<String, i64>) -> Vec<NamedCount> {
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_ENTRIES);
    ranked
}

fn summarize(start: NaiveDate, end: NaiveDate, lines: &[ReportLine]) -> BookingReport {
    let mut room_types: HashMap<String, i64> = HashMap::new();
    let mut hotels: HashMap<String, i64> = HashMap::new();
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut by_hotel: HashMap<String, Decimal> = HashMap::new();

    for line in lines {
        let quantity = i64::from(line.quantity);
        let revenue = line.price * Decimal::from(line.quantity);
        let hotel = line.hotel_name.as_deref().unwrap_or(UNKNOWN_HOTEL);

        *room_types.entry(line.room_name.clone()).or_default() += quantity;
        *hotels.entry(hotel.to_string()).or_default() += quantity;
        *by_day.entry(line.booking_date.date_naive()).or_default() += revenue;
        *by_hotel.entry(hotel.to_string()).or_default() += revenue;
    }

    let mut revenue_by_hotel: Vec<NamedTotal> = by_hotel
        .into_iter()
        .map(|(name, total)| NamedTotal { name, total })
        .collect();
    revenue_by_hotel.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    revenue_by_hotel.truncate(TOP_ENTRIES);

    BookingReport {
        start,
        end,
        room_types: top_counts(room_types),
        hotels: top_counts(hotels),
        revenue_by_day: by_day
            .into_iter()
            .map(|(date, total)| DailyTotal { date, total })
            .collect(),
        revenue_by_hotel,
    }
}

/// Booking report over booking days `start..=end`
pub async fn booking_report(
    store: &dyn InventoryStore,
    principal: &Principal,
    query: ReportQuery,
) -> Result<BookingReport> {
    principal.require_admin()?;
    let (start, end) = window(&query, today())?;

    let lines = store.report_lines(start, end + Duration::days(1)).await?;
    Ok(summarize(start, end, &lines))
}
