//! Gridiron CLI
//!
//! Season feature extraction and online linear training for college football results.

use clap::{Parser, Subcommand};
use gridiron::features::ExtractorKind;
use gridiron::training::LossFunction;
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "College football win/loss prediction from season-average statistics", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Replay one season and summarize its feature samples
    Extract {
        /// Season number (its data lives in <data_dir>/<season>-data)
        #[arg(long)]
        season: u32,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Order teams by their season total of one statistic
    Rank {
        #[arg(long)]
        season: u32,
        /// Statistic name, e.g. "rush yard-off" or "wins-off"
        #[arg(long)]
        stat: String,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Train the linear classifier on the configured seasons
    Train {
        /// Loss function (logistic, hinge or squared)
        #[arg(long)]
        loss: Option<LossFunction>,
        /// Feature extractor (paired or difference)
        #[arg(long)]
        extractor: Option<ExtractorKind>,
        #[arg(long)]
        init_step_size: Option<f64>,
        #[arg(long)]
        step_size_reduction: Option<f64>,
        /// Override number of rounds
        #[arg(long)]
        rounds: Option<usize>,
        #[arg(long)]
        regularization: Option<f64>,
        /// Start from the hand-tuned settings instead of the config file
        #[arg(long)]
        tuned: bool,
        /// Where to write the learned weights
        #[arg(long)]
        weights: Option<String>,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Extract { season, format } => commands::extract(&config, season, format),
        Commands::Rank {
            season,
            stat,
            format,
        } => commands::rank(&config, season, &stat, format),
        Commands::Train {
            loss,
            extractor,
            init_step_size,
            step_size_reduction,
            rounds,
            regularization,
            tuned,
            weights,
        } => {
            let mut training = if tuned {
                gridiron::TrainingConfig::tuned()
            } else {
                config.training.clone()
            };
            if let Some(loss) = loss {
                training.loss = loss;
            }
            if let Some(extractor) = extractor {
                training.extractor = extractor;
            }
            if let Some(step) = init_step_size {
                training.init_step_size = step;
            }
            if let Some(reduction) = step_size_reduction {
                training.step_size_reduction = reduction;
            }
            if let Some(rounds) = rounds {
                training.num_rounds = rounds;
            }
            if let Some(lambda) = regularization {
                training.regularization = lambda;
            }
            let mut config = config.clone();
            config.training = training;
            if let Some(path) = weights {
                config.output.weights_path = path.into();
            }
            commands::train(&config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use gridiron::data::{load_examples, SeasonSource, SeasonSummary};
    use gridiron::features::FactorCatalog;
    use gridiron::predict::{write_weights, LinearPredictor};
    use gridiron::training::OnlineGradientLearner;

    fn load_catalog(config: &Config) -> Result<FactorCatalog> {
        FactorCatalog::load(
            &config.data.offensive_factors,
            &config.data.defensive_factors,
            config.layout.first_stat_column,
        )
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.data_dir)?;
        println!("Created {}/ directory", config.data.data_dir.display());

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Put each season's {} and {} under {}/<season>-data/",
            config.data.statistics_file,
            config.data.schedule_file,
            config.data.data_dir.display()
        );
        println!("  3. Run 'gridiron extract --season 5' to check a season");
        println!("  4. Run 'gridiron train' to train the classifier");

        Ok(())
    }

    pub fn extract(config: &Config, season: u32, format: OutputFormat) -> Result<()> {
        let catalog = load_catalog(config)?;
        let accumulator =
            SeasonSource::new(&config.data, season).accumulate(&catalog, &config.layout)?;
        let summary = SeasonSummary::of(season, &accumulator);

        match format {
            OutputFormat::Table => {
                println!("Season {}", summary.season);
                println!("───────────────────────────────");
                println!("  Games:    {}", summary.games);
                println!("  Samples:  {}", summary.samples);
                println!("  Dropped:  {}", summary.dropped);
                println!("  Win share: {:.1}%", summary.win_share * 100.0);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }

        Ok(())
    }

    pub fn rank(config: &Config, season: u32, stat: &str, format: OutputFormat) -> Result<()> {
        let catalog = load_catalog(config)?;
        let accumulator =
            SeasonSource::new(&config.data, season).accumulate(&catalog, &config.layout)?;
        let ranked = accumulator.rank_teams(stat);

        match format {
            OutputFormat::Table => {
                println!("{:>6}  {:>8}  {}", "Rank", "Team", stat);
                for (i, (team, value)) in ranked.iter().enumerate() {
                    println!("{:>6}  {:>8}  {}", i + 1, team, value);
                }
            }
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = ranked
                    .iter()
                    .map(|(team, value)| {
                        serde_json::json!({ "team": team.0, "stat": stat, "value": value })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }

        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let training = &config.training;
        let learner_config = training.learner_config();
        learner_config.validate()?;

        let catalog = load_catalog(config)?;
        let train = load_examples(
            &config.data,
            &catalog,
            &config.layout,
            &config.data.train_seasons,
        )?;

        let mut validation = Vec::new();
        let mut validation_ranges = Vec::new();
        for &season in &config.data.validation_seasons {
            let start = validation.len();
            validation.extend(load_examples(
                &config.data,
                &catalog,
                &config.layout,
                &[season],
            )?);
            validation_ranges.push((season, start..validation.len()));
        }

        println!(
            "Training with {} loss on {} features, {} train / {} validation samples",
            training.loss,
            training.extractor,
            train.len(),
            validation.len()
        );

        let mut learner = OnlineGradientLearner::new(training.extractor);
        let model = learner.learn(&train, &validation, training.loss, &learner_config)?;

        write_weights(&config.output.weights_path, &model.weights)?;

        let predictor = LinearPredictor::new(model.weights, training.extractor);
        println!("\nTraining complete!");
        println!("  Features:       {}", predictor.weights().len());
        if let Some(last) = model.history.last() {
            println!("  Train error:    {:.4}", last.train_error);
            println!("  Val error:      {:.4}", last.validation_error);
        }
        if let Some(best) = model.history.best_validation_round() {
            println!(
                "  Best round:     {} (val error {:.4})",
                best.round, best.validation_error
            );
        }
        for (season, range) in validation_ranges {
            let examples = &validation[range];
            let accuracy = predictor.accuracy(examples.iter().map(|e| (&e.input, e.label)));
            println!(
                "  Season {:>2}:      {:.1}% of {} games",
                season,
                accuracy * 100.0,
                examples.len()
            );
        }
        println!("  Weights:        {}", config.output.weights_path.display());

        Ok(())
    }
}
