use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use muni_compass::compare::{select_comparison_set, ComparisonSet, ValueView};
use muni_compass::config::Config;
use muni_compass::data::{DataSources, DataStore, Dataset};
use muni_compass::error::ScoringError;
use muni_compass::map::{center_points, locality_markers, municipality_layer, regimes};
use muni_compass::model::{Metric, Regime};
use muni_compass::output::{self, OutputFormat};
use muni_compass::scoring::Thresholds;
use muni_compass::search::{filter_by_minimum_thresholds, rank};
use muni_compass::tui::{self, Theme};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_DATA: i32 = 2;
const EXIT_SELECTION: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive dashboard (default if no subcommand)
    Dashboard,
    /// Rank every municipality by opportunity index
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Compare up to three municipalities side by side
    Compare {
        /// Municipality names, exactly as in the data file
        names: Vec<String>,
        /// Show per-1000 rates or values normalized to the table maximum
        #[arg(long, value_enum, default_value_t)]
        view: ValueView,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Municipalities meeting minimum rates per 1000 inhabitants
    ///
    /// Without any --min-* flag the search thresholds from the config file apply.
    Search {
        #[arg(long)]
        min_schools: Option<f64>,
        #[arg(long)]
        min_housing: Option<f64>,
        #[arg(long)]
        min_companies: Option<f64>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Municipality coordinates colored by one metric
    Map {
        #[arg(long, value_enum, default_value_t = Metric::OpportunityIndex)]
        metric: Metric,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Educational centers per locality, grouped by regime
    Centers {
        /// Regime as written in the data file, e.g. "púb." (all regimes if omitted)
        #[arg(long)]
        regime: Option<String>,
        /// List individual centers instead of per-locality markers
        #[arg(long)]
        detail: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Interactive setup of the config file
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "muni-compass")]
#[command(
    about = "Compare municipalities by schools, housing and companies per capita",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/muni-compass/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Municipality indicators CSV (overrides the config file)
    #[arg(long, global = true)]
    municipalities: Option<PathBuf>,

    /// Educational centers CSV (overrides the config file)
    #[arg(long, global = true)]
    centers: Option<PathBuf>,

    /// Dashboard color theme
    #[arg(long, value_enum, default_value_t, global = true)]
    theme: Theme,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    muni_compass::logging::init(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Dashboard);
    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = command {
        if let Err(e) = muni_compass::config::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load and validate config
    let config = match muni_compass::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if let Err(errors) = muni_compass::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let sources = DataSources {
        municipalities: cli.municipalities.unwrap_or_else(|| config.data.municipalities.clone()),
        centers: cli.centers.unwrap_or_else(|| config.data.centers.clone()),
    };

    let start_time = Instant::now();
    let store = match DataStore::open(sources, config.scoring.weights) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to load data: {}", e);
            std::process::exit(EXIT_DATA);
        }
    };
    let dataset = store.dataset();
    log::info!(
        "Loaded {} municipalities and {} centers in {:?}",
        dataset.municipalities.len(),
        dataset.centers.len(),
        start_time.elapsed()
    );

    let code = match command {
        Commands::Dashboard => {
            let theme = tui::resolve_theme(cli.theme);
            let app = tui::App::new(dataset, config, theme);
            match tui::run_tui(app, store).await {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    eprintln!("Dashboard error: {:#}", e);
                    EXIT_FAILURE
                }
            }
        }
        Commands::List { format } => run_list(&dataset, format),
        Commands::Compare {
            names,
            view,
            format,
        } => {
            run_compare(&dataset, &config, &names, view, format)
        }
        Commands::Search {
            min_schools,
            min_housing,
            min_companies,
            format,
        } => {
            let flags = Thresholds {
                schools_per_1000: min_schools,
                housing_per_1000: min_housing,
                companies_per_1000: min_companies,
            };
            let thresholds = if flags.is_empty() { config.search } else { flags };
            run_search(&dataset, &thresholds, format)
        }
        Commands::Map { metric, format } => run_map(&dataset, metric, format),
        Commands::Centers {
            regime,
            detail,
            format,
        } => {
            run_centers(&dataset, &config, regime, detail, format)
        }
        Commands::Init => EXIT_SUCCESS,
    };

    std::process::exit(code);
}

/// Print `text`, or report a serialization failure.
fn emit(text: anyhow::Result<String>) -> i32 {
    match text {
        Ok(text) => {
            if !text.is_empty() {
                println!("{}", text);
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Output error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn run_list(dataset: &Dataset, format: OutputFormat) -> i32 {
    let mut rows: Vec<_> = dataset.municipalities.rows().iter().collect();
    rank(&mut rows);

    emit(match format {
        OutputFormat::Table => Ok(output::format_ranking_table(&rows, output::should_use_colors())),
        OutputFormat::Tsv => Ok(output::format_ranking_tsv(&rows)),
        OutputFormat::Json => output::format_json(&rows),
    })
}

fn run_compare(
    dataset: &Dataset,
    config: &Config,
    names: &[String],
    view: ValueView,
    format: OutputFormat,
) -> i32 {
    let options = config.comparison.options();
    let selection = match select_comparison_set(&dataset.municipalities, names, &options) {
        Ok(ComparisonSet::Selected(selection)) => selection,
        Ok(ComparisonSet::Empty) => {
            eprintln!("Name between 1 and {} municipalities to compare.", options.max_count);
            return EXIT_SELECTION;
        }
        Err(e @ ScoringError::TooManySelected { .. }) => {
            eprintln!("Selection error: {}", e);
            return EXIT_SELECTION;
        }
        Err(e) => {
            eprintln!("Config error: {}", e);
            return EXIT_CONFIG;
        }
    };

    if selection.is_empty() {
        eprintln!("No municipality matched: {}", selection.unmatched.join(", "));
        return EXIT_SELECTION;
    }
    for name in selection.low_reliability_names() {
        log::warn!("{} has fewer than {} inhabitants", name, options.low_population_threshold);
    }

    emit(match format {
        OutputFormat::Table => {
            Ok(output::format_comparison(&selection, view, output::should_use_colors()))
        }
        OutputFormat::Tsv => Ok(output::format_comparison_tsv(&selection, view)),
        OutputFormat::Json => output::format_json(&serde_json::json!({
            "rows": &selection.rows,
            "unmatched": &selection.unmatched,
            "summary": selection.summary(),
        })),
    })
}

fn run_search(dataset: &Dataset, thresholds: &Thresholds, format: OutputFormat) -> i32 {
    let rows = match filter_by_minimum_thresholds(dataset.municipalities.rows(), thresholds) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Invalid threshold: {}", e);
            return EXIT_CONFIG;
        }
    };
    log::debug!(
        "{} of {} municipalities meet the thresholds",
        rows.len(),
        dataset.municipalities.len()
    );

    emit(match format {
        OutputFormat::Table => Ok(output::format_ranking_table(&rows, output::should_use_colors())),
        OutputFormat::Tsv => Ok(output::format_ranking_tsv(&rows)),
        OutputFormat::Json => output::format_json(&rows),
    })
}

fn run_map(dataset: &Dataset, metric: Metric, format: OutputFormat) -> i32 {
    let layer = municipality_layer(&dataset.municipalities, metric);

    emit(match format {
        OutputFormat::Table => Ok(output::format_layer(&layer, output::should_use_colors())),
        OutputFormat::Tsv => Ok(output::format_layer_tsv(&layer)),
        OutputFormat::Json => output::format_json(&layer),
    })
}

fn run_centers(
    dataset: &Dataset,
    config: &Config,
    regime: Option<String>,
    detail: bool,
    format: OutputFormat,
) -> i32 {
    let selected = match regime {
        Some(raw) => vec![Regime::parse(&raw)],
        None => regimes(&dataset.centers),
    };
    let use_colors = output::should_use_colors();

    let mut sections = Vec::new();
    let mut json = Vec::new();
    for regime in &selected {
        let text = if detail {
            let points = center_points(&dataset.centers, regime);
            match format {
                OutputFormat::Table => output::format_center_points(&points, use_colors),
                OutputFormat::Tsv => output::format_center_points_tsv(&points),
                OutputFormat::Json => {
                    json.push(serde_json::json!({
                        "regime": regime.source_label(),
                        "centers": points
                    }));
                    continue;
                }
            }
        } else {
            let markers = locality_markers(&dataset.centers, regime, &config.legend);
            match format {
                OutputFormat::Table => output::format_locality_markers(&markers, use_colors),
                OutputFormat::Tsv => output::format_locality_markers_tsv(&markers),
                OutputFormat::Json => {
                    json.push(serde_json::json!({
                        "regime": regime.source_label(),
                        "localities": markers
                    }));
                    continue;
                }
            }
        };

        if format == OutputFormat::Tsv {
            // Prefix each line with the regime so sections stay separable
            sections.extend(
                text.lines()
                    .map(|line| format!("{}\t{}", regime.source_label(), line)),
            );
        } else {
            sections.push(format!("{} ({})\n{}", regime.label(), regime.source_label(), text));
        }
    }

    if format == OutputFormat::Json {
        return emit(output::format_json(&json));
    }
    let separator = if format == OutputFormat::Tsv { "\n" } else { "\n\n" };
    emit(Ok(sections.join(separator)))
}
