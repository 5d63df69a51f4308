use crate::{
    backend::AppointmentBackend,
    error::BackendError,
    types::{Appointment, AppointmentDraft},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::error;
use uuid::Uuid;

/// Non-persistent store used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalAppointments {
    appointments: Arc<Mutex<HashMap<Uuid, Appointment>>>,
}

impl LocalAppointments {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Appointment>>, BackendError> {
        self.appointments.lock().map_err(|_| {
            error!("Appointment store lock is poisoned");
            BackendError::Poisoned
        })
    }
}

impl AppointmentBackend for LocalAppointments {
    fn appointments(&self) -> Result<Vec<Appointment>, BackendError> {
        let mut appointments: Vec<Appointment> = self.lock()?.values().cloned().collect();
        appointments.sort_by_key(|appointment| (appointment.start, appointment.created_at));
        Ok(appointments)
    }

    fn add_appointment(&self, draft: AppointmentDraft) -> Result<Appointment, BackendError> {
        let appointment = Appointment::from_draft(draft);
        self.lock()?.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn update_appointment(
        &self,
        id: Uuid,
        draft: AppointmentDraft,
    ) -> Result<Appointment, BackendError> {
        let mut appointments = self.lock()?;
        let Some(appointment) = appointments.get_mut(&id) else {
            error!(%id, "Cannot update unknown appointment");
            return Err(BackendError::NotFound(id));
        };
        appointment.apply_draft(draft);
        Ok(appointment.clone())
    }

    fn remove_appointment(&self, id: Uuid) -> Result<(), BackendError> {
        if self.lock()?.remove(&id).is_none() {
            error!(%id, "Cannot remove unknown appointment");
            return Err(BackendError::NotFound(id));
        }
        Ok(())
    }
}
