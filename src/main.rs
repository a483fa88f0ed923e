use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salon_karte::{
    AppState,
    auth::AuthOutcome,
    config::Config,
    models::{CustomerRecord, TreatmentRecord, treatment::DATE_FORMAT},
    repositories::ColumnUpdates,
    services::PhotoUpload,
};

#[derive(Parser)]
#[command(name = "salon-karte")]
#[command(version)]
#[command(about = "Salon customer and treatment records kept in a spreadsheet")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Cache TTL (overrides config file), e.g. "30s"
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    cache_ttl: Option<std::time::Duration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Customer records
    #[command(subcommand)]
    Customers(CustomerCommand),
    /// Treatment records
    #[command(subcommand)]
    Treatments(TreatmentCommand),
    /// Log in by password or face image
    #[command(subcommand)]
    Login(LoginCommand),
}

#[derive(Subcommand)]
enum CustomerCommand {
    /// List customers, optionally filtered by name or furigana
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one customer with their treatment history
    Show { name: String },
    Add(NewCustomer),
    /// Update columns of the first customer with this name
    Update {
        name: String,
        /// Column=Value, repeatable
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },
    /// Delete the first customer with this name
    Delete { name: String },
}

#[derive(Args)]
struct NewCustomer {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    furigana: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Subcommand)]
enum TreatmentCommand {
    /// List treatments, optionally filtered by space-separated keywords
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    Add(NewTreatment),
    /// Update columns of the first treatment for this customer
    Update {
        customer: String,
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },
    /// Delete the first treatment for this customer
    Delete { customer: String },
}

#[derive(Args)]
struct NewTreatment {
    #[arg(long)]
    customer: String,
    #[arg(long)]
    text: String,
    /// YYYY-MM-DD, defaults to today
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    memo: String,
    /// Photo to upload alongside the treatment
    #[arg(long)]
    photo: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum LoginCommand {
    /// Password login; the password is read from SALON_KARTE_PASSWORD
    Password {
        #[arg(long)]
        email: String,
    },
    /// Face login with an image file
    Face { image: std::path::PathBuf },
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(column, value)| (column.trim().to_string(), value.to_string()))
        .filter(|(column, _)| !column.is_empty())
        .ok_or_else(|| format!("expected Column=Value, got '{raw}'"))
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| format!("{raw}: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn updates(pairs: Vec<(String, String)>) -> ColumnUpdates {
    pairs.into_iter().collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("salon_karte={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);
    if let Some(ttl) = cli.cache_ttl {
        config.cache.ttl = ttl;
    }

    let state = AppState::from_config(&config).await?;

    match cli.command {
        Command::Customers(command) => run_customers(&state, command).await,
        Command::Treatments(command) => run_treatments(&state, command).await,
        Command::Login(command) => run_login(&state, command).await,
    }
}

async fn run_customers(state: &AppState, command: CustomerCommand) -> Result<()> {
    let directory = &state.directory;
    match command {
        CustomerCommand::List { search } => {
            print_json(&directory.search(search.as_deref().unwrap_or("")).await?)
        }
        CustomerCommand::Show { name } => print_json(&directory.details(&name).await?),
        CustomerCommand::Add(new) => {
            let customer = CustomerRecord::new(new.name)
                .with_furigana(new.furigana)
                .with_phone(new.phone)
                .with_address(new.address)
                .with_note(new.note);
            directory.add(&customer).await?;
            print_json(&customer)
        }
        CustomerCommand::Update { name, set } => {
            print_json(&directory.update(&name, &updates(set)).await?)
        }
        CustomerCommand::Delete { name } => {
            directory.remove(&name).await?;
            info!("Deleted customer '{}'", name);
            Ok(())
        }
    }
}

async fn run_treatments(state: &AppState, command: TreatmentCommand) -> Result<()> {
    let log = &state.treatment_log;
    match command {
        TreatmentCommand::List { search } => {
            print_json(&log.search(search.as_deref().unwrap_or("")).await?)
        }
        TreatmentCommand::Add(new) => {
            let date = new
                .date
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let treatment = TreatmentRecord::new(new.customer, new.text, date).with_memo(new.memo);
            let photo = match new.photo {
                Some(path) => Some(PhotoUpload {
                    bytes: tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read photo {}", path.display()))?,
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "photo".to_string()),
                }),
                None => None,
            };
            print_json(&log.record(treatment, photo).await?)
        }
        TreatmentCommand::Update { customer, set } => {
            print_json(&log.update(&customer, &updates(set)).await?)
        }
        TreatmentCommand::Delete { customer } => {
            log.remove(&customer).await?;
            info!("Deleted first treatment for '{}'", customer);
            Ok(())
        }
    }
}

async fn run_login(state: &AppState, command: LoginCommand) -> Result<()> {
    let outcome = match command {
        LoginCommand::Password { email } => {
            let password = std::env::var("SALON_KARTE_PASSWORD")
                .context("SALON_KARTE_PASSWORD is not set")?;
            state.auth.password_login(&email, &password).await?
        }
        LoginCommand::Face { image } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            state.auth.face_login(bytes).await?
        }
    };

    match outcome {
        AuthOutcome::Authenticated(identity) => print_json(&identity),
        AuthOutcome::Failed => bail!("Login failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Phone=03-1234=5").unwrap(),
            ("Phone".to_string(), "03-1234=5".to_string())
        );
        assert!(parse_assignment("Phone").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "salon-karte",
            "customers",
            "update",
            "Sato",
            "--set",
            "Phone=0311112222",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Customers(CustomerCommand::Update { .. })
        ));
    }
}
