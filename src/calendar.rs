//! Calendar grid logic: which days are visible in a view, how the view
//! date moves on navigation and which time slots a day offers.

use crate::business_rules::BusinessRules;
use crate::types::{Appointment, ServiceType};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use std::iter;
use uuid::Uuid;

pub const AGENDA_LENGTH_DAYS: i64 = 30;
pub const SLOT_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CalendarView {
    Day,
    Week,
    Month,
    Agenda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NavigateAction {
    #[value(name = "prev")]
    Previous,
    Next,
    Today,
}

/// An appointment as shown in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub phone: Option<String>,
    pub service_type: ServiceType,
    pub notes: Option<String>,
}

impl From<Appointment> for CalendarEvent {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            title: appointment.title,
            start: appointment.start,
            end: appointment.end,
            phone: Some(appointment.phone).filter(|phone| !phone.is_empty()),
            service_type: appointment.service_type,
            notes: appointment.notes,
        }
    }
}

impl CalendarEvent {
    pub fn display_title(&self) -> String {
        match &self.phone {
            Some(phone) => format!("{} 📱 {}", self.title, phone),
            None => self.title.clone(),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }

    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        let day_start = day.and_time(NaiveTime::MIN);
        self.overlaps(day_start, day_start + Duration::days(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn is_covered_by(&self, events: &[CalendarEvent]) -> bool {
        events
            .iter()
            .any(|event| event.overlaps(self.start, self.end))
    }
}

fn days_from(first: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    iter::successors(Some(first), |day| day.succ_opt())
}

fn advance_to_weekday(date: NaiveDate, rules: &BusinessRules) -> NaiveDate {
    let anchor = rules.anchor_weekday();
    days_from(date)
        .take(7)
        .find(|day| day.weekday() == anchor)
        .unwrap_or(date)
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// Moves the view date of `view` according to `action`.
///
/// Day steps skip closed days in the direction of travel. Week and month
/// steps land on the anchor weekday of the rules. The result is never a
/// closed day.
pub fn navigate(
    rules: &BusinessRules,
    view: CalendarView,
    date: NaiveDate,
    action: NavigateAction,
    today: NaiveDate,
) -> NaiveDate {
    let target = match (view, action) {
        (_, NavigateAction::Today) => today,
        (CalendarView::Day, NavigateAction::Next) => rules.next_open_day(shift_days(date, 1)),
        (CalendarView::Day, NavigateAction::Previous) => {
            rules.previous_open_day(shift_days(date, -1))
        }
        (CalendarView::Week, NavigateAction::Next) => advance_to_weekday(shift_days(date, 7), rules),
        (CalendarView::Week, NavigateAction::Previous) => {
            advance_to_weekday(shift_days(date, -7), rules)
        }
        (CalendarView::Month, NavigateAction::Next) => {
            advance_to_weekday(date.checked_add_months(Months::new(1)).unwrap_or(date), rules)
        }
        (CalendarView::Month, NavigateAction::Previous) => {
            advance_to_weekday(date.checked_sub_months(Months::new(1)).unwrap_or(date), rules)
        }
        (CalendarView::Agenda, NavigateAction::Next) => shift_days(date, AGENDA_LENGTH_DAYS),
        (CalendarView::Agenda, NavigateAction::Previous) => shift_days(date, -AGENDA_LENGTH_DAYS),
    };
    rules.next_open_day(target)
}

/// Open days shown by `view` around `date`, in ascending order. A week
/// starts on the anchor weekday at or before `date`.
pub fn visible_days(rules: &BusinessRules, view: CalendarView, date: NaiveDate) -> Vec<NaiveDate> {
    let days: Vec<NaiveDate> = match view {
        CalendarView::Day => vec![date],
        CalendarView::Week => {
            let anchor = rules.anchor_weekday().num_days_from_monday();
            let back = (date.weekday().num_days_from_monday() + 7 - anchor) % 7;
            days_from(shift_days(date, -i64::from(back))).take(7).collect()
        }
        CalendarView::Month => {
            let first = date.with_day(1).unwrap_or(date);
            days_from(first)
                .take_while(|day| day.month() == first.month())
                .collect()
        }
        CalendarView::Agenda => days_from(date).take(AGENDA_LENGTH_DAYS as usize).collect(),
    };
    days.into_iter().filter(|day| rules.is_open_day(*day)).collect()
}

/// Bookable slots of a day between opening and closing hour.
pub fn day_slots(rules: &BusinessRules, day: NaiveDate) -> Vec<TimeSlot> {
    if !rules.is_open_day(day) {
        return vec![];
    }
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(rules.open_hour(), 0, 0),
        NaiveTime::from_hms_opt(rules.close_hour(), 0, 0),
    ) else {
        return vec![];
    };
    let close = day.and_time(close);
    iter::successors(Some(day.and_time(open)), |start| {
        Some(*start + Duration::minutes(SLOT_MINUTES))
    })
    .take_while(|start| *start < close)
    .map(|start| TimeSlot {
        start,
        end: start + Duration::minutes(SLOT_MINUTES),
    })
    .collect()
}

/// Events touching `day`, ordered by start.
pub fn events_on(events: &[CalendarEvent], day: NaiveDate) -> Vec<&CalendarEvent> {
    let mut events: Vec<&CalendarEvent> = events.iter().filter(|event| event.occurs_on(day)).collect();
    events.sort_by_key(|event| event.start);
    events
}
