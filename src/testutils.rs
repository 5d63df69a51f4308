use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use crate::{
    backend::AppointmentBackend,
    error::BackendError,
    types::{Appointment, AppointmentDraft, ServiceType},
};

pub struct MockAppointmentBackendInner {
    pub success: AtomicBool,
    pub missing: AtomicBool,
    pub calls_to_appointments: AtomicU64,
    pub calls_to_add_appointment: AtomicU64,
    pub calls_to_update_appointment: AtomicU64,
    pub calls_to_remove_appointment: AtomicU64,
    pub appointments: Mutex<Vec<Appointment>>,
}

#[derive(Clone)]
pub struct MockAppointmentBackend(pub Arc<MockAppointmentBackendInner>);

impl MockAppointmentBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            missing: AtomicBool::new(false),
            calls_to_appointments: AtomicU64::default(),
            calls_to_add_appointment: AtomicU64::default(),
            calls_to_update_appointment: AtomicU64::default(),
            calls_to_remove_appointment: AtomicU64::default(),
            appointments: Mutex::default(),
        }
    }
}

impl MockAppointmentBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockAppointmentBackendInner::new()))
    }

    fn result(&self, id: Uuid) -> Result<(), BackendError> {
        if !self.0.success.load(Ordering::SeqCst) {
            return Err(BackendError::Poisoned);
        }
        if self.0.missing.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound(id));
        }
        Ok(())
    }
}

impl AppointmentBackend for MockAppointmentBackend {
    fn appointments(&self) -> Result<Vec<Appointment>, BackendError> {
        self.0.calls_to_appointments.fetch_add(1, Ordering::SeqCst);
        self.result(Uuid::nil())?;
        Ok(self.0.appointments.lock().unwrap().clone())
    }

    fn add_appointment(&self, draft: AppointmentDraft) -> Result<Appointment, BackendError> {
        self.0
            .calls_to_add_appointment
            .fetch_add(1, Ordering::SeqCst);
        let appointment = Appointment::from_draft(draft);
        self.result(appointment.id)?;
        Ok(appointment)
    }

    fn update_appointment(
        &self,
        id: Uuid,
        draft: AppointmentDraft,
    ) -> Result<Appointment, BackendError> {
        self.0
            .calls_to_update_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.result(id)?;
        let mut appointment = Appointment::from_draft(draft);
        appointment.id = id;
        Ok(appointment)
    }

    fn remove_appointment(&self, id: Uuid) -> Result<(), BackendError> {
        self.0
            .calls_to_remove_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.result(id)
    }
}

pub fn appointment_at(title: &str, start: NaiveDateTime, minutes: i64) -> Appointment {
    Appointment::from_draft(AppointmentDraft {
        title: title.into(),
        start,
        end: start + Duration::minutes(minutes),
        phone: String::new(),
        service_type: ServiceType::Haircut,
        notes: None,
    })
}
