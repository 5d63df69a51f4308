//! Plain text rendering of the calendar views.

use crate::business_rules::BusinessRules;
use crate::calendar::{day_slots, events_on, CalendarEvent, CalendarView};
use chrono::NaiveDate;

const EMPTY_RANGE: &str = "No appointments in this range";

fn day_header(day: NaiveDate) -> String {
    day.format("%a %d.%m.%Y").to_string()
}

fn range_label(view: CalendarView, days: &[NaiveDate]) -> String {
    let name = match view {
        CalendarView::Day => "Day",
        CalendarView::Week => "Week",
        CalendarView::Month => "Month",
        CalendarView::Agenda => "Agenda",
    };
    match (days.first(), days.last()) {
        (Some(first), Some(last)) if first != last => format!(
            "{name} {} - {}",
            first.format("%d.%m.%Y"),
            last.format("%d.%m.%Y")
        ),
        (Some(first), _) => format!("{name} {}", first.format("%d.%m.%Y")),
        _ => name.to_string(),
    }
}

fn event_line(event: &CalendarEvent) -> String {
    format!(
        "{}-{}  {} ({})",
        event.start.format("%H:%M"),
        event.end.format("%H:%M"),
        event.display_title(),
        event.service_type
    )
}

fn slot_lines(rules: &BusinessRules, day: NaiveDate, events: &[CalendarEvent]) -> Vec<String> {
    day_slots(rules, day)
        .into_iter()
        .map(|slot| {
            let time = slot.start.format("%H:%M");
            let starting = events
                .iter()
                .find(|event| event.start >= slot.start && event.start < slot.end);
            match starting {
                Some(event) => format!("{time} │ {}", event_line(event)),
                None if slot.is_covered_by(events) => format!("{time} │ ┆"),
                None => format!("{time} │"),
            }
        })
        .collect()
}

/// Renders `days` of `view`. The day view lists every slot, the other
/// views list the appointments per day.
pub fn render(
    rules: &BusinessRules,
    view: CalendarView,
    days: &[NaiveDate],
    events: &[CalendarEvent],
) -> String {
    let mut lines = vec![range_label(view, days)];

    if view == CalendarView::Day {
        for day in days {
            lines.push(day_header(*day));
            lines.extend(slot_lines(rules, *day, events));
        }
    } else {
        let mut any = false;
        for day in days {
            let on_day = events_on(events, *day);
            if on_day.is_empty() && view == CalendarView::Agenda {
                continue;
            }
            any |= !on_day.is_empty();
            lines.push(day_header(*day));
            lines.extend(on_day.into_iter().map(|event| format!("  {}", event_line(event))));
        }
        if !any {
            lines.push(EMPTY_RANGE.to_string());
        }
    }

    lines.into_iter().map(|line| line + "\n").collect()
}
