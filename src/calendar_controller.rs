use crate::api_client::AppointmentApi;
use crate::business_rules::BusinessRules;
use crate::calendar::{self, CalendarEvent, CalendarView, NavigateAction, TimeSlot};
use crate::types::{AppointmentRequest, ServiceType};
use crate::validation::end_time;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_DURATION_MINUTES: i64 = 45;
pub const DURATION_CHOICES: [i64; 6] = [15, 30, 45, 60, 90, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: Uuid },
}

/// The single create/edit form of the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentForm {
    pub mode: FormMode,
    pub start: NaiveDateTime,
    pub title: String,
    pub phone: String,
    pub service_type: ServiceType,
    pub duration_minutes: i64,
    pub notes: String,
}

impl AppointmentForm {
    fn create(start: NaiveDateTime) -> Self {
        Self {
            mode: FormMode::Create,
            start,
            title: String::new(),
            phone: String::new(),
            service_type: ServiceType::default(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            notes: String::new(),
        }
    }

    fn edit(event: &CalendarEvent) -> Self {
        Self {
            mode: FormMode::Edit { id: event.id },
            start: event.start,
            title: event.title.clone(),
            phone: event.phone.clone().unwrap_or_default(),
            service_type: event.service_type,
            duration_minutes: event.duration_minutes(),
            notes: event.notes.clone().unwrap_or_default(),
        }
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        end_time(self.start, self.duration_minutes).ok()
    }

    pub fn to_request(&self) -> AppointmentRequest {
        AppointmentRequest {
            id: None,
            title: Some(self.title.clone()),
            start: Some(self.start),
            service_type: Some(self.service_type),
            duration: Some(self.duration_minutes),
            phone: Some(self.phone.clone()),
            notes: Some(self.notes.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// State of the calendar page: loaded events, current view and date,
/// and at most one open form.
pub struct CalendarController<A: AppointmentApi> {
    api: A,
    rules: BusinessRules,
    view: CalendarView,
    date: NaiveDate,
    events: Vec<CalendarEvent>,
    form: Option<AppointmentForm>,
    notifications: Vec<Notification>,
}

impl<A: AppointmentApi> CalendarController<A> {
    pub fn new(api: A, rules: BusinessRules, today: NaiveDate) -> Self {
        let date = rules.next_open_day(today);
        Self {
            api,
            rules,
            view: CalendarView::Day,
            date,
            events: vec![],
            form: None,
            notifications: vec![],
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn rules(&self) -> &BusinessRules {
        &self.rules
    }

    pub fn view(&self) -> CalendarView {
        self.view
    }

    pub fn set_view(&mut self, view: CalendarView) {
        self.view = view;
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Jumps to `date`, moving forward past closed days.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = self.rules.next_open_day(date);
    }

    pub fn navigate(&mut self, action: NavigateAction, today: NaiveDate) {
        self.date = calendar::navigate(&self.rules, self.view, self.date, action, today);
    }

    pub fn visible_days(&self) -> Vec<NaiveDate> {
        calendar::visible_days(&self.rules, self.view, self.date)
    }

    pub fn form(&self) -> Option<&AppointmentForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut AppointmentForm> {
        self.form.as_mut()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.push(Notification {
            kind,
            message: message.into(),
        });
    }

    /// Reloads all appointments. Returns false and notifies on failure.
    pub async fn refresh(&mut self) -> bool {
        match self.api.list().await {
            Ok(appointments) => {
                self.events = appointments.into_iter().map(CalendarEvent::from).collect();
                true
            }
            Err(err) => {
                error!(?err, "Failed to load appointments");
                self.notify(
                    NotificationKind::Error,
                    format!("Failed to load appointments: {err}"),
                );
                false
            }
        }
    }

    /// Opens a create form for an empty slot on an open day.
    pub fn select_slot(&mut self, slot: TimeSlot) -> bool {
        if self.form.is_some()
            || !self.rules.is_open_day(slot.start.date())
            || slot.is_covered_by(&self.events)
        {
            return false;
        }
        self.form = Some(AppointmentForm::create(slot.start));
        true
    }

    /// Opens an edit form pre-filled from the event with `id`.
    pub fn select_event(&mut self, id: Uuid) -> bool {
        if self.form.is_some() {
            return false;
        }
        let Some(event) = self.events.iter().find(|event| event.id == id) else {
            return false;
        };
        self.form = Some(AppointmentForm::edit(event));
        true
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Submits the open form. The form stays open when the server rejects it.
    pub async fn save(&mut self) -> bool {
        let Some(form) = self.form.clone() else {
            return false;
        };
        let request = form.to_request();

        let (result, success_message) = match form.mode {
            FormMode::Create => (self.api.create(&request).await, "Appointment saved"),
            FormMode::Edit { id } => (
                self.api.update(&id.to_string(), &request).await,
                "Appointment updated",
            ),
        };

        match result {
            Ok(appointment) => {
                info!(id = %appointment.id, "Saved appointment");
                self.notify(NotificationKind::Success, success_message);
                self.refresh().await;
                self.close_form();
                true
            }
            Err(err) => {
                error!(?err, "Failed to save appointment");
                self.notify(NotificationKind::Error, err.to_string());
                false
            }
        }
    }

    /// Deletes the appointment of an open edit form once `confirm` agrees.
    pub async fn delete(&mut self, confirm: impl FnOnce(&AppointmentForm) -> bool) -> bool {
        let Some(form) = self.form.clone() else {
            return false;
        };
        let FormMode::Edit { id } = form.mode else {
            return false;
        };
        if !confirm(&form) {
            return false;
        }

        match self.api.delete(&id.to_string()).await {
            Ok(message) => {
                info!(%id, "Deleted appointment");
                self.notify(NotificationKind::Success, message);
                self.refresh().await;
                self.close_form();
                true
            }
            Err(err) => {
                error!(?err, "Failed to delete appointment");
                self.notify(NotificationKind::Error, err.to_string());
                false
            }
        }
    }
}
