use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use muniplaces::api::{FixedDelay, FoursquareClient, NominatimGeocoder};
use muniplaces::config::{FileConfig, SearchOverrides};
use muniplaces::domain::{Category, GeocodedTable, Location};
use muniplaces::logging::init_cli_logger;
use muniplaces::pipeline::{ErrorPolicy, Failure, enumerate, geocode_names};
use muniplaces::table::{
    OutputFormat, read_locations_file, read_names_file, write_locations_file, write_records_file,
};

/// Geocode municipalities and list nearby establishments per category
///
/// Examples:
///   # Resolve coordinates for a list of names (one per line)
///   muniplaces geocode municipios.txt -o coordenadas.csv
///
///   # Search two categories around every row of a location table
///   muniplaces search coordenadas.csv --category 13065=Restaurantes --category 17069=Supermercados
///
///   # Both steps in one go, stopping at the first failure
///   muniplaces --error-policy fail-fast run municipios.txt -o establecimientos.csv
#[derive(Parser, Debug)]
#[command(name = "muniplaces")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional, auto-searches muniplaces.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// What to do when a single lookup or search fails
    #[arg(long, global = true, value_enum)]
    error_policy: Option<ErrorPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve place names to coordinates
    Geocode(GeocodeArgs),
    /// Search establishments around each row of a location table
    Search(SearchArgs),
    /// Geocode names, then search around the resolved locations
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct GeocodeOpts {
    /// Pause after each geocoding request, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Client identifier sent to the geocoding service
    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Args, Debug)]
struct SearchOpts {
    /// Search radius in meters
    #[arg(short = 'r', long)]
    radius: Option<u32>,

    /// Category to search as ID=NAME (repeatable, searched in the given order)
    #[arg(long = "category", value_parser = Category::parse_pair)]
    categories: Vec<Category>,

    /// Response field to request (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Places API key
    #[arg(long, env = "FOURSQUARE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl SearchOpts {
    fn overrides(&self) -> SearchOverrides {
        SearchOverrides {
            radius: self.radius,
            categories: self.categories.clone(),
            fields: self.fields.clone(),
            format: self.format,
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct GeocodeArgs {
    /// File with one place name per line
    names: PathBuf,

    /// Output CSV path
    #[arg(short = 'o', long, default_value = "locations.csv")]
    output: PathBuf,

    #[command(flatten)]
    geocode: GeocodeOpts,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// CSV with name, latitude and longitude in the first three columns
    locations: PathBuf,

    /// The location table has no header row
    #[arg(long)]
    no_headers: bool,

    /// Output path (defaults to establishments.<format>)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    search: SearchOpts,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// File with one place name per line
    names: PathBuf,

    /// Output path (defaults to establishments.<format>)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Also write the geocoded locations to this CSV
    #[arg(long)]
    locations_output: Option<PathBuf>,

    #[command(flatten)]
    geocode: GeocodeOpts,

    #[command(flatten)]
    search: SearchOpts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logger(cli.verbose);
    let total_start = Instant::now();

    let file_config = match cli.config {
        Some(ref config_path) => {
            if !config_path.exists() {
                bail!("Config file not found: {:?}", config_path);
            }
            FileConfig::from_path(config_path)?
        }
        None => FileConfig::load().unwrap_or_default(),
    };
    let policy = cli.error_policy.unwrap_or(file_config.error_policy);

    match cli.command {
        Command::Geocode(args) => {
            let table = run_geocode(&args.names, &args.geocode, &file_config, policy)?;
            write_locations_file(&args.output, &table)?;
            println!(
                "Wrote {} locations to {}",
                table.len(),
                args.output.display()
            );
        }
        Command::Search(args) => {
            let locations = read_locations_file(&args.locations, !args.no_headers)
                .context("Failed to read location table")?;
            run_search(locations, &args.search, args.output, &file_config, policy)?;
        }
        Command::Run(args) => {
            let table = run_geocode(&args.names, &args.geocode, &file_config, policy)?;
            if table.is_empty() {
                bail!("None of the names in {} could be geocoded", args.names.display());
            }
            if let Some(ref path) = args.locations_output {
                write_locations_file(path, &table)?;
                println!("Wrote {} locations to {}", table.len(), path.display());
            }
            run_search(
                table.into_locations(),
                &args.search,
                args.output,
                &file_config,
                policy,
            )?;
        }
    }

    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    Ok(())
}

fn run_geocode(
    names_path: &Path,
    opts: &GeocodeOpts,
    file_config: &FileConfig,
    policy: ErrorPolicy,
) -> Result<GeocodedTable> {
    let names = read_names_file(names_path).context("Failed to read place names")?;
    if names.is_empty() {
        bail!("No place names found in {}", names_path.display());
    }

    let config = file_config.resolve_geocoder(opts.user_agent.as_deref(), opts.delay_ms);
    let geocoder = NominatimGeocoder::new(
        &config.base_url,
        &config.user_agent,
        Duration::from_secs(config.timeout_secs),
    )
    .context("Failed to create geocoder")?;
    let mut pacer = FixedDelay::from_millis(config.delay_ms);

    let progress = create_bar(names.len() as u64, "Geocoding");
    let start = Instant::now();
    let report = geocode_names(&geocoder, &names, &mut pacer, policy, &progress)
        .context("Geocoding failed")?;
    progress.finish_with_message(format!(
        "Geocoded {} of {} names [{:.1}s]",
        report.table.len(),
        names.len(),
        start.elapsed().as_secs_f32()
    ));

    if !report.misses.is_empty() {
        eprintln!("No match for {} name(s):", report.misses.len());
        for name in &report.misses {
            eprintln!("  {}", name);
        }
    }
    if !report.duplicates.is_empty() {
        eprintln!(
            "Duplicate names (last lookup kept): {}",
            report.duplicates.join(", ")
        );
    }
    print_failures(&report.failures);

    Ok(report.table)
}

fn run_search(
    locations: Vec<Location>,
    opts: &SearchOpts,
    output: Option<PathBuf>,
    file_config: &FileConfig,
    policy: ErrorPolicy,
) -> Result<()> {
    let resolved = file_config.resolve_search(&opts.overrides())?;
    let (categories, settings, format) = (resolved.categories, resolved.settings, resolved.format);
    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("establishments.{}", format.extension())));

    let client = FoursquareClient::new(
        &file_config.places.base_url,
        &resolved.api_key,
        Duration::from_secs(file_config.places.timeout_secs),
    )
    .context("Failed to create places client")?;

    tracing::debug!(
        locations = locations.len(),
        categories = categories.len(),
        radius = settings.radius,
        "starting search"
    );

    let progress = create_bar((locations.len() * categories.len()) as u64, "Searching");
    let start = Instant::now();
    let report = enumerate(&client, &locations, &categories, &settings, policy, &progress)
        .context("Search failed")?;
    progress.finish_with_message(format!(
        "Found {} establishments in {} searches [{:.1}s]",
        report.records.len(),
        report.calls,
        start.elapsed().as_secs_f32()
    ));
    print_failures(&report.failures);

    write_records_file(&output, &report.records, format)?;
    println!(
        "Wrote {} records to {}",
        report.records.len(),
        output.display()
    );

    Ok(())
}

fn print_failures(failures: &[Failure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!("Skipped {} failure(s):", failures.len());
    for failure in failures {
        eprintln!("  {}", failure);
    }
}

fn create_bar(len: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.green} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
