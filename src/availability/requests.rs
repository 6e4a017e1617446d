//! Search request parsing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{RoomFilters, StayRange};

/// Query string of `GET /api/rooms/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub hotel_name: Option<String>,
    pub room_name: Option<String>,
    pub max_bed_count: Option<i32>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub max_price: Option<Decimal>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

impl SearchQuery {
    /// Split into non-date predicates and the optional stay.
    ///
    /// Both dates or neither; check-out must be after check-in.
    pub fn into_parts(self) -> Result<(RoomFilters, Option<StayRange>)> {
        let stay = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some(StayRange::new(check_in, check_out)?),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "check_in and check_out must be given together".to_string(),
                ))
            }
        };

        let filters = RoomFilters {
            hotel_name: self.hotel_name,
            room_name: self.room_name,
            max_bed_count: self.max_bed_count,
            min_size: self.min_size,
            max_size: self.max_size,
            max_price: self.max_price,
        };

        Ok((filters, stay))
    }
}
