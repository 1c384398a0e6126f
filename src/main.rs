use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use car_tco::{
    amortize, load_pricing, load_vehicles, recalc_all, schedule, EvaluatedVehicle, Horizon,
    PricingConfig, SortDirection, SortKey, SortState, VehicleFilter, VehicleType,
};

#[derive(Parser, Debug)]
#[command(name = "car-tco", version, about = "Total cost of ownership for candidate cars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a list of vehicles and print the comparison
    Evaluate {
        /// Vehicles file (.json or .csv)
        #[arg(short, long)]
        vehicles: PathBuf,

        /// Pricing file (.toml or .json)
        #[arg(short, long, env = "CAR_TCO_PRICING_FILE")]
        pricing: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Sort column, e.g. tco_per_month_5y, model, estimated_purchase_price
        #[arg(short, long, default_value = "tco_per_month_8y")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Only these vehicle types (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Substring of the model name
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long)]
        year_min: Option<i32>,

        #[arg(long)]
        year_max: Option<i32>,

        /// Fill missing running costs and tire prices with estimates
        #[arg(long)]
        estimate: bool,
    },

    /// Show the annuity for a loan
    Amortize {
        /// Amount borrowed (SEK)
        #[arg(long)]
        principal: f64,

        /// Annual interest rate in percent
        #[arg(long)]
        rate: f64,

        /// Term in years
        #[arg(long)]
        years: f64,

        /// Print the month-by-month schedule
        #[arg(long)]
        schedule: bool,
    },

    /// Print the effective pricing configuration as TOML
    Pricing {
        #[arg(short, long, env = "CAR_TCO_PRICING_FILE")]
        pricing: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            vehicles,
            pricing,
            format,
            sort,
            desc,
            types,
            query,
            year_min,
            year_max,
            estimate,
        } => {
            let filter = VehicleFilter {
                query,
                year_min,
                year_max,
                types: types.iter().map(|t| VehicleType::normalize(t)).collect(),
                ..VehicleFilter::default()
            };
            let key: SortKey = sort.parse().map_err(|e: String| anyhow!(e))?;
            let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };

            run_evaluate(
                &vehicles,
                pricing.as_deref(),
                format,
                &filter,
                SortState::new(key, direction),
                estimate,
            )?;
        }
        Commands::Amortize {
            principal,
            rate,
            years,
            schedule: show_schedule,
        } => run_amortize(principal, rate, years, show_schedule),
        Commands::Pricing { pricing } => {
            let config = effective_pricing(pricing.as_deref())?;
            let text = toml::to_string_pretty(&config).context("failed to render pricing")?;
            print!("{}", text);
        }
    }

    Ok(())
}

fn effective_pricing(path: Option<&std::path::Path>) -> Result<PricingConfig> {
    let mut pricing = load_pricing(path).context("failed to load pricing")?;
    if pricing.valuation_date.is_none() {
        pricing.valuation_date = Some(chrono::Local::now().date_naive());
    }
    Ok(pricing)
}

fn run_evaluate(
    vehicles_path: &std::path::Path,
    pricing_path: Option<&std::path::Path>,
    format: OutputFormat,
    filter: &VehicleFilter,
    sort: SortState,
    estimate: bool,
) -> Result<()> {
    let mut pricing = effective_pricing(pricing_path)?;
    let mut vehicles = load_vehicles(vehicles_path)
        .with_context(|| format!("failed to load vehicles from {}", vehicles_path.display()))?;

    if estimate {
        pricing.estimate_missing_costs = true;
        let year = pricing.valuation_year();
        vehicles = vehicles.iter().map(|v| v.with_estimates(year)).collect();
    }

    let evaluated = recalc_all(&vehicles, &pricing);
    let mut rows = filter.apply(&evaluated);
    sort.sort(&mut rows);

    tracing::info!(
        total = evaluated.len(),
        shown = rows.len(),
        sort = %sort.key,
        direction = sort.direction.as_str(),
        "evaluation done"
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => print_table(&rows),
    }

    Ok(())
}

fn print_table(rows: &[&EvaluatedVehicle]) {
    println!(
        "{:<28} {:<6} {:>5} {:>10} {:>10} {:>10} {:>9} {:>9} {:>9}",
        "Model", "Type", "Year", "Price", "Energy/yr", "Running/yr", "3y/mo", "5y/mo", "8y/mo"
    );
    println!("{}", "─".repeat(104));

    for e in rows {
        let v = &e.vehicle;
        let d = &e.derived;
        println!(
            "{:<28} {:<6} {:>5} {:>10.0} {:>10.0} {:>10.0} {:>9.0} {:>9.0} {:>9.0}",
            truncate(&v.model, 28),
            v.vehicle_type.as_str(),
            v.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            v.estimated_purchase_price,
            d.energy_fuel_year,
            d.recurring_year,
            d.tco_per_month(Horizon::Three),
            d.tco_per_month(Horizon::Five),
            d.tco_per_month(Horizon::Eight),
        );
    }

    if rows.is_empty() {
        println!("(no vehicles match the filters)");
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn run_amortize(principal: f64, rate: f64, years: f64, show_schedule: bool) {
    let plan = amortize(principal, rate, years);

    println!("Principal:       {:>12.0} SEK", plan.principal);
    println!("Term:            {:>12} months", plan.months);
    println!("Monthly payment: {:>12.2} SEK", plan.monthly_payment);
    println!("Total paid:      {:>12.2} SEK", plan.total_paid);
    println!("Total interest:  {:>12.2} SEK", plan.total_interest);

    if show_schedule {
        println!();
        println!("{:>5} {:>12} {:>12} {:>12} {:>14}", "Month", "Payment", "Interest", "Principal", "Balance");
        for row in schedule(principal, rate, years) {
            println!(
                "{:>5} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                row.month, row.payment, row.interest, row.principal, row.balance
            );
        }
    }
}
