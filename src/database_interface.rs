use crate::schema::appointments;
use crate::types::{Appointment, AppointmentDraft, AppointmentStatus, ServiceType};
use crate::{backend::AppointmentBackend, error::BackendError};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::ConnectionError;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AppointmentRow {
    id: Uuid,
    title: String,
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
    phone: String,
    service_type: String,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = appointments)]
#[diesel(treat_none_as_null = true)]
struct AppointmentChanges<'a> {
    title: &'a str,
    starts_at: NaiveDateTime,
    ends_at: NaiveDateTime,
    phone: &'a str,
    service_type: &'a str,
    notes: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentRow {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            title: appointment.title,
            starts_at: appointment.start,
            ends_at: appointment.end,
            phone: appointment.phone,
            service_type: appointment.service_type.as_str().into(),
            notes: appointment.notes,
            status: appointment.status.as_str().into(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = BackendError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            start: row.starts_at,
            end: row.ends_at,
            phone: row.phone,
            service_type: row
                .service_type
                .parse::<ServiceType>()
                .map_err(BackendError::Corrupt)?,
            notes: row.notes,
            status: row
                .status
                .parse::<AppointmentStatus>()
                .map_err(BackendError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL backed store.
///
/// The connection is opened on first use and reused afterwards. A
/// connection reported as closed is dropped and re-established by the
/// next call.
#[derive(Clone)]
pub struct DatabaseInterface {
    database_url: String,
    connection: Arc<Mutex<Option<PgConnection>>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            database_url: database_url.into(),
            connection: Arc::new(Mutex::new(Some(connection))),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn with_connection<T>(
        &self,
        query: impl FnOnce(&mut PgConnection) -> QueryResult<T>,
    ) -> Result<T, BackendError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| BackendError::Poisoned)?;

        let connection = match guard.take() {
            Some(connection) => connection,
            None => {
                let connection = Self::establish_connection(&self.database_url)?;
                info!("Reconnected to database");
                connection
            }
        };
        let connection = guard.insert(connection);

        let result = query(connection);
        if let Err(DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)) = &result {
            error!("Database connection was closed. Reconnecting on next request");
            *guard = None;
        }
        Ok(result?)
    }
}

impl AppointmentBackend for DatabaseInterface {
    fn appointments(&self) -> Result<Vec<Appointment>, BackendError> {
        let rows = self.with_connection(|connection| {
            appointments::table
                .order((
                    appointments::starts_at.asc(),
                    appointments::created_at.asc(),
                ))
                .select(AppointmentRow::as_select())
                .load(connection)
        })?;

        rows.into_iter().map(Appointment::try_from).collect()
    }

    fn add_appointment(&self, draft: AppointmentDraft) -> Result<Appointment, BackendError> {
        let row = AppointmentRow::from(Appointment::from_draft(draft));

        let stored = self.with_connection(|connection| {
            diesel::insert_into(appointments::table)
                .values(&row)
                .returning(AppointmentRow::as_returning())
                .get_result(connection)
        })?;

        Appointment::try_from(stored)
    }

    fn update_appointment(
        &self,
        appointment_id: Uuid,
        draft: AppointmentDraft,
    ) -> Result<Appointment, BackendError> {
        let changes = AppointmentChanges {
            title: &draft.title,
            starts_at: draft.start,
            ends_at: draft.end,
            phone: &draft.phone,
            service_type: draft.service_type.as_str(),
            notes: draft.notes.as_deref(),
            updated_at: Utc::now(),
        };

        let updated = self.with_connection(|connection| {
            diesel::update(appointments::table.find(appointment_id))
                .set(&changes)
                .returning(AppointmentRow::as_returning())
                .get_result(connection)
                .optional()
        })?;

        match updated {
            Some(row) => Appointment::try_from(row),
            None => Err(BackendError::NotFound(appointment_id)),
        }
    }

    fn remove_appointment(&self, appointment_id: Uuid) -> Result<(), BackendError> {
        let deleted = self.with_connection(|connection| {
            diesel::delete(appointments::table.find(appointment_id)).execute(connection)
        })?;

        match deleted {
            0 => {
                error!(%appointment_id, "Deletion failed. 0 database lines were changed");
                Err(BackendError::NotFound(appointment_id))
            }
            _ => Ok(()),
        }
    }
}
