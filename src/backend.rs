use crate::{
    error::BackendError,
    types::{Appointment, AppointmentDraft},
};
use uuid::Uuid;

pub trait AppointmentBackend: Clone + Send + Sync + 'static {
    fn appointments(&self) -> Result<Vec<Appointment>, BackendError>;
    fn add_appointment(&self, draft: AppointmentDraft) -> Result<Appointment, BackendError>;
    fn update_appointment(
        &self,
        id: Uuid,
        draft: AppointmentDraft,
    ) -> Result<Appointment, BackendError>;
    fn remove_appointment(&self, id: Uuid) -> Result<(), BackendError>;
}
