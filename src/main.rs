use anyhow::{bail, Context, Result};
use cardology_forecast::{
    describe_card, quick_answer, AppConfig, CardReading, CardRepository, DirectorySource,
    ReadingRequest, TableKind,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cardology", about = "Birth card and yearly forecast lookups")]
struct Cli {
    /// Directory holding the CSV tables (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct BirthArgs {
    #[arg(long, default_value = "")]
    name: String,

    #[arg(long)]
    month: u32,

    #[arg(long)]
    day: u32,

    #[arg(long)]
    year: i32,
}

impl BirthArgs {
    fn request(&self) -> ReadingRequest {
        ReadingRequest::new(self.name.clone(), self.month, self.day, self.year)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full reading: birth card, forecast, current period
    Reading {
        #[command(flatten)]
        birth: BirthArgs,

        /// Print the reading as JSON
        #[arg(long)]
        json: bool,
    },

    /// Birth card for a calendar day
    BirthCard {
        #[arg(long)]
        month: u32,

        #[arg(long)]
        day: u32,
    },

    /// Activation and profile for a card ("K♥", "10 ♠", "Queen of Diamonds")
    Card {
        card: String,
    },

    /// Answer a simple question from a reading
    Ask {
        #[command(flatten)]
        birth: BirthArgs,

        question: String,
    },

    /// Verify the reference tables load and cover every birthday
    Check,
}

/// Filter used when RUST_LOG is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(default_filter(true))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(false)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_repository(cli: &Cli) -> Result<CardRepository<DirectorySource>> {
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    let source = DirectorySource::new(&config.data_dir).with_files(config.files.clone());
    Ok(CardRepository::new(source).with_rule(config.current_period_rule))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let repo = open_repository(&cli)?;

    match &cli.command {
        Commands::Reading { birth, json } => cmd_reading(&repo, birth, *json).await,
        Commands::BirthCard { month, day } => cmd_birth_card(&repo, *month, *day).await,
        Commands::Card { card } => cmd_card(&repo, card).await,
        Commands::Ask { birth, question } => cmd_ask(&repo, birth, question).await,
        Commands::Check => cmd_check(&repo).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_reading(
    repo: &CardRepository<DirectorySource>,
    birth: &BirthArgs,
    json: bool,
) -> Result<()> {
    let reading = repo.reading(&birth.request()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        print_reading(&reading);
    }
    Ok(())
}

fn print_reading(reading: &CardReading) {
    let who = if reading.name.is_empty() { "You" } else { reading.name.as_str() };

    println!("🃏 Cardology Reading - {}", who);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Born: {}  (age {})", reading.birth_date, reading.age);

    if reading.birth_card.is_unknown() {
        println!("\n⚠️  No birth card found for this date");
        return;
    }

    println!(
        "   Birth card: {} ({})",
        reading.birth_card.card, reading.birth_card.name
    );
    if !reading.birth_card_activation.is_empty() {
        println!("   {}", reading.birth_card_activation);
    }

    if reading.enriched.periods.is_empty() {
        println!("\n⚠️  No forecast found for age {}", reading.age);
        return;
    }

    println!("\n📅 Forecast for age {}:", reading.age);
    for period in &reading.enriched.periods {
        let marker = if period.is_current { "▶" } else { " " };
        let started = period.formatted_start_date.as_deref().unwrap_or("");
        println!(
            "  {} {:<12} {:<5} {}",
            marker,
            period.period_name.label(),
            period.card,
            started
        );
    }

    if let Some(current) = reading.enriched.current() {
        println!(
            "\n✓ Current period: {} ({})",
            current.period_name.label(),
            describe_card(&current.card)
        );
        if !current.activation.is_empty() {
            println!("   {}", current.activation);
        }
    }
}

async fn cmd_birth_card(repo: &CardRepository<DirectorySource>, month: u32, day: u32) -> Result<()> {
    let birth_card = repo.birth_card(month, day).await?;
    if birth_card.is_unknown() {
        println!("❌ No birth card for month {} day {}", month, day);
    } else {
        println!("✓ {} ({})", birth_card.card, birth_card.name);
    }
    Ok(())
}

async fn cmd_card(repo: &CardRepository<DirectorySource>, card: &str) -> Result<()> {
    let details = repo.card_details(card).await?;

    match &details.name {
        Some(name) => println!("🃏 {} ({})", details.card, name),
        None => println!("❓ {} is not a recognized card", details.card),
    }
    if !details.activation.is_empty() {
        println!("\n⚡ Activation:\n   {}", details.activation);
    }
    let profile = &details.profile;
    for (label, text) in [
        ("Description", &profile.description),
        ("Zone of Genius", &profile.zone_of_genius),
        ("How to Motivate", &profile.how_to_motivate),
    ] {
        if let Some(text) = text {
            println!("\n{}:\n   {}", label, text);
        }
    }
    Ok(())
}

async fn cmd_ask(
    repo: &CardRepository<DirectorySource>,
    birth: &BirthArgs,
    question: &str,
) -> Result<()> {
    let reading = repo.reading(&birth.request()).await?;
    match quick_answer(&reading, question) {
        Some(answer) => println!("{}", answer),
        None => println!("🤷 No quick answer for that question"),
    }
    Ok(())
}

async fn cmd_check(repo: &CardRepository<DirectorySource>) -> Result<()> {
    println!("🔍 Checking reference tables in {}", repo.source().dir().display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for kind in TableKind::ALL {
        println!("   {:<18} {}", kind.name(), repo.source().path_for(kind).display());
    }

    let report = repo.coverage_report().await?;

    println!("\n📊 Rows loaded:");
    println!("   BirthdateToCard:  {}", report.birthdate_rows);
    println!("   CardActivities:   {}", report.activation_rows);
    println!("   YearlyForecasts:  {}", report.forecast_rows);
    println!("   PlanetaryPeriods: {}", report.planetary_rows);
    println!("   CardProfiles:     {}", report.profile_rows);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.is_complete() {
        println!("✅ All 366 birthdays covered");
        return Ok(());
    }

    if !report.missing_birth_cards.is_empty() {
        println!(
            "❌ {} birthdays without a birth card: {}",
            report.missing_birth_cards.len(),
            report.missing_birth_cards.join(", ")
        );
    }
    if !report.missing_start_dates.is_empty() {
        println!(
            "❌ {} birthdays without planetary start dates: {}",
            report.missing_start_dates.len(),
            report.missing_start_dates.join(", ")
        );
    }
    bail!("reference data is incomplete")
}
