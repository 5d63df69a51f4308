use crate::{
    business_rules::{BusinessRules, BusinessRulesError},
    calendar::{CalendarView, NavigateAction},
    configuration::Configuration,
    types::{parse_wall_clock, ServiceType},
};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "salon_calendar", version, about = "Booking calendar for a hair salon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the appointment API
    Serve(ServeArgs),
    /// Print the calendar grid
    Calendar(CalendarArgs),
    /// Book a new appointment
    Book(BookArgs),
    /// Change an existing appointment
    Edit(EditArgs),
    /// Delete an appointment
    Cancel(CancelArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Keeps appointments in memory when omitted
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// JSON file with closed weekdays and opening hours
    #[arg(long, env = "BUSINESS_RULES")]
    pub business_rules: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    #[arg(long, env = "SALON_CALENDAR_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,
    #[arg(long, env = "BUSINESS_RULES")]
    pub business_rules: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub client: ClientArgs,
    #[arg(long, value_enum, default_value_t = CalendarView::Day)]
    pub view: CalendarView,
    /// Defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_enum)]
    pub step: Option<NavigateAction>,
}

#[derive(Debug, Clone, Args)]
pub struct BookArgs {
    #[command(flatten)]
    pub client: ClientArgs,
    #[arg(long, value_parser = parse_wall_clock)]
    pub at: NaiveDateTime,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long, default_value = "haircut")]
    pub service: ServiceType,
    /// Minutes
    #[arg(long, default_value_t = 45)]
    pub duration: i64,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub client: ClientArgs,
    #[arg(long)]
    pub id: String,
    #[arg(long, value_parser = parse_wall_clock)]
    pub at: Option<NaiveDateTime>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub service: Option<ServiceType>,
    #[arg(long)]
    pub duration: Option<i64>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CancelArgs {
    #[command(flatten)]
    pub client: ClientArgs,
    #[arg(long)]
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn load_business_rules(path: Option<&Path>) -> Result<BusinessRules, BusinessRulesError> {
    match path {
        Some(path) => BusinessRules::from_json_file(path),
        None => Ok(BusinessRules::default()),
    }
}

#[derive(Debug, Clone)]
pub struct ConfigurationHandler {
    port: u16,
    database_url: Option<String>,
    business_rules: BusinessRules,
}

impl ConfigurationHandler {
    pub fn from_args(args: ServeArgs) -> Result<Self, BusinessRulesError> {
        Ok(Self {
            port: args.port,
            database_url: args.database_url.filter(|url| !url.trim().is_empty()),
            business_rules: load_business_rules(args.business_rules.as_deref())?,
        })
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn business_rules(&self) -> BusinessRules {
        self.business_rules.clone()
    }
}
