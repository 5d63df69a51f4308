use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, iter, path::Path};
use thiserror::Error;

const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Error)]
pub enum BusinessRulesError {
    #[error("At least one weekday has to stay open")]
    NoOpenWeekday,
    #[error("Opening hour {open_hour} has to be before closing hour {close_hour}")]
    InvalidHours { open_hour: u32, close_hour: u32 },
    #[error("Closing hour {0} is not a valid hour of the day")]
    HourOutOfRange(u32),
    #[error("Failed to read business rules: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse business rules: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBusinessRules {
    closed_weekdays: HashSet<Weekday>,
    open_hour: u32,
    close_hour: u32,
}

/// Opening days and hours of the salon.
///
/// The same rules drive request validation on the server and the
/// navigation of the calendar grid, so closed days are never offered as
/// slots and never accepted as bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBusinessRules", into = "RawBusinessRules")]
pub struct BusinessRules {
    closed_weekdays: HashSet<Weekday>,
    open_hour: u32,
    close_hour: u32,
}

impl TryFrom<RawBusinessRules> for BusinessRules {
    type Error = BusinessRulesError;

    fn try_from(raw: RawBusinessRules) -> Result<Self, Self::Error> {
        BusinessRules::new(raw.closed_weekdays, raw.open_hour, raw.close_hour)
    }
}

impl From<BusinessRules> for RawBusinessRules {
    fn from(rules: BusinessRules) -> Self {
        Self {
            closed_weekdays: rules.closed_weekdays,
            open_hour: rules.open_hour,
            close_hour: rules.close_hour,
        }
    }
}

impl Default for BusinessRules {
    /// Closed on Sunday and Monday, open from 8 to 18 o'clock.
    fn default() -> Self {
        Self {
            closed_weekdays: HashSet::from([Weekday::Sun, Weekday::Mon]),
            open_hour: 8,
            close_hour: 18,
        }
    }
}

impl BusinessRules {
    pub fn new(
        closed_weekdays: HashSet<Weekday>,
        open_hour: u32,
        close_hour: u32,
    ) -> Result<Self, BusinessRulesError> {
        if closed_weekdays.len() >= DAYS_PER_WEEK {
            return Err(BusinessRulesError::NoOpenWeekday);
        }
        if close_hour > 23 {
            return Err(BusinessRulesError::HourOutOfRange(close_hour));
        }
        if open_hour >= close_hour {
            return Err(BusinessRulesError::InvalidHours {
                open_hour,
                close_hour,
            });
        }
        Ok(Self {
            closed_weekdays,
            open_hour,
            close_hour,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, BusinessRulesError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn is_closed_weekday(&self, weekday: Weekday) -> bool {
        self.closed_weekdays.contains(&weekday)
    }

    pub fn is_open_day(&self, date: NaiveDate) -> bool {
        !self.is_closed_weekday(date.weekday())
    }

    /// Hour-granular check of both ends of an appointment.
    ///
    /// An appointment ending at 18:45 passes with a closing hour of 18
    /// while one ending at 19:00 fails.
    pub fn within_business_hours(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.hour_in_window(start.hour()) && self.hour_in_window(end.hour())
    }

    fn hour_in_window(&self, hour: u32) -> bool {
        (self.open_hour..=self.close_hour).contains(&hour)
    }

    /// Weekday on which week and month views begin: the first open day
    /// following a closed one, Monday when the salon never closes.
    pub fn anchor_weekday(&self) -> Weekday {
        iter::successors(Some(Weekday::Mon), |weekday| Some(weekday.succ()))
            .take(DAYS_PER_WEEK)
            .find(|weekday| {
                !self.is_closed_weekday(*weekday) && self.is_closed_weekday(weekday.pred())
            })
            .unwrap_or(Weekday::Mon)
    }

    /// First open day at or after `date`.
    pub fn next_open_day(&self, date: NaiveDate) -> NaiveDate {
        iter::successors(Some(date), |day| day.succ_opt())
            .take(DAYS_PER_WEEK)
            .find(|day| self.is_open_day(*day))
            .unwrap_or(date)
    }

    /// Last open day at or before `date`.
    pub fn previous_open_day(&self, date: NaiveDate) -> NaiveDate {
        iter::successors(Some(date), |day| day.pred_opt())
            .take(DAYS_PER_WEEK)
            .find(|day| self.is_open_day(*day))
            .unwrap_or(date)
    }
}
