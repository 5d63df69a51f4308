use crate::{
    business_rules::BusinessRules,
    types::{AppointmentDraft, AppointmentRequest},
};
use chrono::{Datelike, Duration, NaiveDateTime, Weekday};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required fields are missing or invalid: {0}")]
    Fields(#[from] ValidationErrors),
    #[error("Required fields are missing")]
    MissingFields,
    #[error("Appointment id is missing")]
    MissingId,
    #[error("Malformed request: {0}")]
    MalformedBody(String),
    #[error("Duration of {0} minutes is out of range")]
    DurationOutOfRange(i64),
    #[error("End time must be after start time")]
    EndNotAfterStart,
    #[error("Appointments must lie between {open_hour}:00 and {close_hour}:00")]
    OutsideBusinessHours { open_hour: u32, close_hour: u32 },
    #[error("The salon is closed on {0}")]
    ClosedDay(Weekday),
}

/// Checks a create or update request against the business rules and
/// computes the end time from start and duration.
pub fn validate_request(
    request: AppointmentRequest,
    rules: &BusinessRules,
) -> Result<AppointmentDraft, ValidationError> {
    let request = request.normalized();
    request.validate()?;

    let (Some(title), Some(start), Some(service_type), Some(duration)) = (
        request.title,
        request.start,
        request.service_type,
        request.duration,
    ) else {
        return Err(ValidationError::MissingFields);
    };

    let end = end_time(start, duration)?;
    check_time_order(start, end)?;
    check_business_day(start, rules)?;
    check_business_hours(start, end, rules)?;

    Ok(AppointmentDraft {
        title,
        start,
        end,
        phone: request.phone.unwrap_or_default(),
        service_type,
        notes: request.notes,
    })
}

pub fn end_time(start: NaiveDateTime, duration: i64) -> Result<NaiveDateTime, ValidationError> {
    Duration::try_minutes(duration)
        .and_then(|duration| start.checked_add_signed(duration))
        .ok_or(ValidationError::DurationOutOfRange(duration))
}

pub fn check_time_order(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(())
}

pub fn check_business_day(
    start: NaiveDateTime,
    rules: &BusinessRules,
) -> Result<(), ValidationError> {
    let weekday = start.weekday();
    if rules.is_closed_weekday(weekday) {
        return Err(ValidationError::ClosedDay(weekday));
    }
    Ok(())
}

pub fn check_business_hours(
    start: NaiveDateTime,
    end: NaiveDateTime,
    rules: &BusinessRules,
) -> Result<(), ValidationError> {
    if !rules.within_business_hours(start, end) {
        return Err(ValidationError::OutsideBusinessHours {
            open_hour: rules.open_hour(),
            close_hour: rules.close_hour(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::ServiceType;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use test_case::test_case;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn request(start: NaiveDateTime, duration: i64) -> AppointmentRequest {
        AppointmentRequest {
            title: Some("Jane".into()),
            start: Some(start),
            service_type: Some(ServiceType::Haircut),
            duration: Some(duration),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_is_start_plus_duration() {
        let draft = validate_request(request(at(4, 9, 0), 30), &BusinessRules::default()).unwrap();
        assert_eq!(draft.title, "Jane");
        assert_eq!(draft.start, at(4, 9, 0));
        assert_eq!(draft.end, at(4, 9, 30));
        assert_eq!(draft.phone, "");
        assert_eq!(draft.notes, None);
    }

    #[test_case(|r: &mut AppointmentRequest| r.title = None ; "missing title")]
    #[test_case(|r: &mut AppointmentRequest| r.title = Some("   ".into()) ; "blank title")]
    #[test_case(|r: &mut AppointmentRequest| r.start = None ; "missing start")]
    #[test_case(|r: &mut AppointmentRequest| r.service_type = None ; "missing service type")]
    #[test_case(|r: &mut AppointmentRequest| r.duration = None ; "missing duration")]
    #[test_case(|r: &mut AppointmentRequest| r.duration = Some(0) ; "zero duration")]
    #[test_case(|r: &mut AppointmentRequest| r.duration = Some(-15) ; "negative duration")]
    fn test_reject_invalid_fields(modify: fn(&mut AppointmentRequest)) {
        let mut invalid = request(at(4, 9, 0), 30);
        modify(&mut invalid);
        let err = validate_request(invalid, &BusinessRules::default()).unwrap_err();
        assert!(matches!(err, ValidationError::Fields(_)));
    }

    #[test_case("0151 2345 (Anna)" ; "with name")]
    #[test_case("call me after 5" ; "free text")]
    #[test_case("  +49 151 2345  " ; "padded")]
    fn test_accept_free_text_phone(phone: &str) {
        let mut with_phone = request(at(4, 9, 0), 30);
        with_phone.phone = Some(phone.into());
        let draft = validate_request(with_phone, &BusinessRules::default()).unwrap();
        assert_eq!(draft.phone, phone.trim());
    }

    #[test_case(at(4, 7, 45), 30 ; "starts before opening")]
    #[test_case(at(4, 18, 30), 60 ; "ends after closing")]
    #[test_case(at(4, 17, 0), 600 ; "runs past midnight")]
    fn test_reject_outside_business_hours(start: NaiveDateTime, duration: i64) {
        let err = validate_request(request(start, duration), &BusinessRules::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutsideBusinessHours {
                open_hour: 8,
                close_hour: 18
            }
        ));
    }

    #[test]
    fn test_closing_hour_is_checked_per_hour() {
        let rules = BusinessRules::default();
        let draft = validate_request(request(at(4, 17, 30), 60), &rules).unwrap();
        assert_eq!(draft.end, at(4, 18, 30));
        validate_request(request(at(4, 17, 30), 90), &rules).unwrap_err();
    }

    #[test]
    fn test_reject_closed_day() {
        let err = validate_request(request(at(3, 10, 0), 30), &BusinessRules::default()).unwrap_err();
        assert!(matches!(err, ValidationError::ClosedDay(Weekday::Mon)));
    }

    #[test]
    fn test_rules_are_injected() {
        let rules = BusinessRules::new(HashSet::from([Weekday::Sun]), 6, 20).unwrap();
        validate_request(request(at(3, 6, 15), 30), &rules).unwrap();
        validate_request(request(at(4, 19, 0), 60), &rules).unwrap();
    }

    #[test]
    fn test_reject_overflowing_duration() {
        let err = validate_request(request(at(4, 9, 0), i64::MAX), &BusinessRules::default())
            .unwrap_err();
        assert!(matches!(err, ValidationError::DurationOutOfRange(_)));
    }

    #[test]
    fn test_end_must_follow_start() {
        check_time_order(at(4, 9, 0), at(4, 9, 0)).unwrap_err();
        check_time_order(at(4, 9, 0), at(4, 8, 0)).unwrap_err();
        check_time_order(at(4, 9, 0), at(4, 9, 15)).unwrap();
    }
}
