use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::Local;
use clap::Parser;
use uuid::Uuid;

use crate::{
    api_client::{AppointmentApi, HttpAppointmentApi},
    calendar::{TimeSlot, SLOT_MINUTES},
    calendar_controller::{AppointmentForm, CalendarController, NotificationKind, DURATION_CHOICES},
    configuration::Configuration,
    configuration_handler::{
        load_business_rules, BookArgs, CalendarArgs, CancelArgs, Cli, ClientArgs, Command,
        ConfigurationHandler, EditArgs, ServeArgs,
    },
    database_interface::DatabaseInterface,
    http::create_app,
    local_appointments::LocalAppointments,
};
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api_client;
mod backend;
mod business_rules;
mod calendar;
mod calendar_controller;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_appointments;
mod render;
mod schema;
#[cfg(test)]
mod testutils;
mod types;
mod validation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Calendar(args) => show_calendar(args).await,
        Command::Book(args) => book(args).await,
        Command::Edit(args) => edit(args).await,
        Command::Cancel(args) => cancel(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let configuration = ConfigurationHandler::from_args(args)?;

    println!("##################");
    println!("# Salon Calendar #");
    println!("##################");

    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessible at:\n{address}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection. Retry in 1 sec. Omit the database url to keep appointments in memory.");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend, configuration)
    } else {
        info!("No database configured, appointments are kept in memory");
        create_app(LocalAppointments::default(), configuration)
    };

    axum::serve(listener, app).await?;
    Ok(())
}

async fn controller(
    client: &ClientArgs,
) -> anyhow::Result<CalendarController<HttpAppointmentApi>> {
    let rules = load_business_rules(client.business_rules.as_deref())?;
    let api = HttpAppointmentApi::new(&client.server);
    let mut controller = CalendarController::new(api, rules, Local::now().date_naive());
    if !controller.refresh().await {
        report(&mut controller);
        bail!("Could not load appointments from {}", client.server);
    }
    Ok(controller)
}

fn report<A: AppointmentApi>(controller: &mut CalendarController<A>) {
    for notification in controller.take_notifications() {
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.message),
            NotificationKind::Error => eprintln!("{}", notification.message),
        }
    }
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| anyhow!("Appointment not found"))
}

async fn show_calendar(args: CalendarArgs) -> anyhow::Result<()> {
    let mut controller = controller(&args.client).await?;
    let today = Local::now().date_naive();

    controller.set_view(args.view);
    if let Some(date) = args.date {
        controller.set_date(date);
    }
    if let Some(step) = args.step {
        controller.navigate(step, today);
    }

    print!(
        "{}",
        render::render(
            controller.rules(),
            controller.view(),
            &controller.visible_days(),
            controller.events(),
        )
    );
    Ok(())
}

fn check_duration(minutes: i64) -> anyhow::Result<i64> {
    if !DURATION_CHOICES.contains(&minutes) {
        bail!("Duration must be one of {DURATION_CHOICES:?} minutes");
    }
    Ok(minutes)
}

fn fill_form(
    form: &mut AppointmentForm,
    title: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
) {
    if let Some(title) = title {
        form.title = title;
    }
    if let Some(phone) = phone {
        form.phone = phone;
    }
    if let Some(notes) = notes {
        form.notes = notes;
    }
}

async fn submit<A: AppointmentApi>(controller: &mut CalendarController<A>) -> anyhow::Result<()> {
    let saved = controller.save().await;
    report(controller);
    if !saved {
        bail!("Appointment was not saved");
    }
    Ok(())
}

async fn book(args: BookArgs) -> anyhow::Result<()> {
    let mut controller = controller(&args.client).await?;
    book_slot(&mut controller, args).await
}

async fn book_slot<A: AppointmentApi>(
    controller: &mut CalendarController<A>,
    args: BookArgs,
) -> anyhow::Result<()> {
    let duration = check_duration(args.duration)?;
    let slot = TimeSlot {
        start: args.at,
        end: args.at + chrono::Duration::minutes(SLOT_MINUTES),
    };
    if !controller.select_slot(slot) {
        bail!("{} is not available", args.at.format("%d.%m.%Y %H:%M"));
    }

    if let Some(form) = controller.form_mut() {
        fill_form(form, Some(args.title), args.phone, args.notes);
        form.service_type = args.service;
        form.duration_minutes = duration;
    }
    submit(controller).await
}

async fn edit(args: EditArgs) -> anyhow::Result<()> {
    let mut controller = controller(&args.client).await?;
    edit_appointment(&mut controller, args).await
}

async fn edit_appointment<A: AppointmentApi>(
    controller: &mut CalendarController<A>,
    args: EditArgs,
) -> anyhow::Result<()> {
    let duration = args.duration.map(check_duration).transpose()?;
    if !controller.select_event(parse_id(&args.id)?) {
        bail!("Appointment not found");
    }

    if let Some(form) = controller.form_mut() {
        fill_form(form, args.title, args.phone, args.notes);
        if let Some(start) = args.at {
            form.start = start;
        }
        if let Some(service) = args.service {
            form.service_type = service;
        }
        if let Some(duration) = duration {
            form.duration_minutes = duration;
        }
    }
    submit(controller).await
}

fn confirm(form: &AppointmentForm) -> bool {
    print!(
        "Delete appointment '{}' on {}? [y/N] ",
        form.title,
        form.start.format("%d.%m.%Y %H:%M")
    );
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

async fn cancel(args: CancelArgs) -> anyhow::Result<()> {
    let mut controller = controller(&args.client).await?;
    let yes = args.yes;
    cancel_appointment(&mut controller, &args.id, |form| yes || confirm(form)).await
}

async fn cancel_appointment<A: AppointmentApi>(
    controller: &mut CalendarController<A>,
    id: &str,
    confirm: impl FnOnce(&AppointmentForm) -> bool,
) -> anyhow::Result<()> {
    if !controller.select_event(parse_id(id)?) {
        bail!("Appointment not found");
    }

    let mut confirmed = false;
    let deleted = controller
        .delete(|form| {
            confirmed = confirm(form);
            confirmed
        })
        .await;
    report(controller);
    if deleted {
        return Ok(());
    }
    if confirmed {
        bail!("Appointment was not deleted");
    }
    println!("Kept appointment");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api_client::{ApiError, MockAppointmentApi};
    use crate::business_rules::BusinessRules;
    use crate::testutils::appointment_at;
    use crate::types::{Appointment, ServiceType};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn client() -> ClientArgs {
        ClientArgs {
            server: "http://127.0.0.1:3000".into(),
            business_rules: None,
        }
    }

    fn rejected(status: u16, message: &str) -> ApiError {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Lists `appointments` once, then fails every following reload.
    fn api_failing_reload(appointments: Vec<Appointment>) -> MockAppointmentApi {
        let mut api = MockAppointmentApi::new();
        let mut list_calls = 0;
        api.expect_list().returning(move || {
            list_calls += 1;
            match list_calls {
                1 => Ok(appointments.clone()),
                _ => Err(rejected(500, "Internal server error")),
            }
        });
        api
    }

    async fn loaded(api: MockAppointmentApi) -> CalendarController<MockAppointmentApi> {
        let mut controller =
            CalendarController::new(api, BusinessRules::default(), at(4, 0, 0).date());
        assert!(controller.refresh().await);
        controller
    }

    fn book_args(start: NaiveDateTime, duration: i64) -> BookArgs {
        BookArgs {
            client: client(),
            at: start,
            title: "Jane".into(),
            phone: Some("0151 2345 (Anna)".into()),
            service: ServiceType::Coloring,
            duration,
            notes: None,
        }
    }

    fn edit_args(id: String) -> EditArgs {
        EditArgs {
            client: client(),
            id,
            at: None,
            title: Some("Jane Doe".into()),
            phone: None,
            service: None,
            duration: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_cancel_succeeds_when_reload_fails() {
        let appointment = appointment_at("Jane", at(4, 9, 0), 30);
        let mut api = api_failing_reload(vec![appointment.clone()]);
        api.expect_delete()
            .times(1)
            .returning(|_| Ok("Appointment deleted successfully".into()));

        let mut controller = loaded(api).await;
        cancel_appointment(&mut controller, &appointment.id.to_string(), |_| true)
            .await
            .unwrap();
        assert!(controller.form().is_none());
    }

    #[tokio::test]
    async fn test_cancel_fails_when_server_rejects() {
        let appointment = appointment_at("Jane", at(4, 9, 0), 30);
        let mut api = api_failing_reload(vec![appointment.clone()]);
        api.expect_delete()
            .times(1)
            .returning(|_| Err(rejected(404, "Appointment not found")));

        let mut controller = loaded(api).await;
        cancel_appointment(&mut controller, &appointment.id.to_string(), |_| true)
            .await
            .unwrap_err();
    }

    #[tokio::test]
    async fn test_declined_cancel_keeps_appointment() {
        let appointment = appointment_at("Jane", at(4, 9, 0), 30);
        let mut api = api_failing_reload(vec![appointment.clone()]);
        api.expect_delete().never();

        let mut controller = loaded(api).await;
        cancel_appointment(&mut controller, &appointment.id.to_string(), |_| false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_id() {
        let mut api = api_failing_reload(vec![]);
        api.expect_delete().never();

        let mut controller = loaded(api).await;
        cancel_appointment(&mut controller, "not-an-id", |_| true)
            .await
            .unwrap_err();
        cancel_appointment(&mut controller, &uuid::Uuid::new_v4().to_string(), |_| true)
            .await
            .unwrap_err();
    }

    #[tokio::test]
    async fn test_book_succeeds_when_reload_fails() {
        let mut api = api_failing_reload(vec![]);
        let created = appointment_at("Jane", at(4, 10, 0), 60);
        api.expect_create()
            .withf(|request| {
                request.start == Some(at(4, 10, 0))
                    && request.duration == Some(60)
                    && request.service_type == Some(ServiceType::Coloring)
                    && request.phone.as_deref() == Some("0151 2345 (Anna)")
            })
            .times(1)
            .returning(move |_| Ok(created.clone()));

        let mut controller = loaded(api).await;
        book_slot(&mut controller, book_args(at(4, 10, 0), 60))
            .await
            .unwrap();
        assert!(controller.form().is_none());
    }

    #[tokio::test]
    async fn test_book_rejects_taken_slot_and_odd_duration() {
        let mut api = api_failing_reload(vec![appointment_at("Maria", at(4, 10, 0), 60)]);
        api.expect_create().never();

        let mut controller = loaded(api).await;
        book_slot(&mut controller, book_args(at(4, 10, 30), 30))
            .await
            .unwrap_err();
        book_slot(&mut controller, book_args(at(4, 12, 0), 50))
            .await
            .unwrap_err();
        assert!(controller.form().is_none());
    }

    #[tokio::test]
    async fn test_edit_reports_rejection() {
        let appointment = appointment_at("Jane", at(4, 9, 0), 30);
        let mut api = api_failing_reload(vec![appointment.clone()]);
        api.expect_update()
            .withf(|_, request| request.title.as_deref() == Some("Jane Doe"))
            .times(1)
            .returning(|_, _| Err(rejected(400, "Appointments must lie between 8:00 and 18:00")));

        let mut controller = loaded(api).await;
        edit_appointment(&mut controller, edit_args(appointment.id.to_string()))
            .await
            .unwrap_err();
    }
}
