use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole years between `date_of_birth` and `as_of`, dropping a year while the
/// birthday has not yet come round. `None` when `as_of` precedes the birth.
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    if as_of < date_of_birth {
        return None;
    }
    let mut years = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Age as calendar units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreciseAge {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl fmt::Display for PreciseAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} years, {} months, and {} days",
            self.years, self.months, self.days
        )
    }
}

/// Years, months and days from `date_of_birth` to `as_of`.
///
/// Whole months are counted first: the largest month count whose anniversary
/// (clamped to the end of a short month) does not pass `as_of`. The remainder
/// is counted in days from that anniversary.
pub fn precise_age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> Option<PreciseAge> {
    if as_of < date_of_birth {
        return None;
    }

    let mut total_months = (as_of.year() - date_of_birth.year()) * 12
        + (as_of.month() as i32 - date_of_birth.month() as i32);

    let mut anchor = date_of_birth.checked_add_months(Months::new(u32::try_from(total_months).ok()?))?;
    while anchor > as_of {
        total_months -= 1;
        anchor = date_of_birth.checked_add_months(Months::new(u32::try_from(total_months).ok()?))?;
    }

    let days = (as_of - anchor).num_days();
    let total_months = u32::try_from(total_months).ok()?;
    Some(PreciseAge {
        years: total_months / 12,
        months: total_months % 12,
        days: u32::try_from(days).ok()?,
    })
}
