//! La Quiniela prediction CLI
//!
//! Trains an outcome classifier on stored La Liga matches and predicts the
//! 1 / X / 2 result of every fixture in a matchday.

use clap::{Parser, Subcommand};
use quiniela::data::season::parse_seasons;
use quiniela::data::SeasonScope;
use quiniela::{Config, Result};
use std::fs::File;
use std::io::Write;

#[derive(Parser)]
#[command(name = "quiniela")]
#[command(about = "La Liga quiniela outcome prediction", long_about = None)]
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
    /// Train a model on historical matches
    Train {
        /// Seasons to train on: "all", "2010-2011,2012-2013" or "2004:2010"
        #[arg(long = "training_seasons", default_value = "all", value_parser = season_scope)]
        training_seasons: SeasonScope,
        /// File name of the model inside the models directory
        #[arg(long = "model_name", default_value = "my_quiniela.model")]
        model_name: String,
    },
    /// Predict every fixture of a matchday
    Predict {
        /// Season, e.g. 2021-2022
        season: String,
        /// Division (1 or 2)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        division: u8,
        /// Matchday to predict
        matchday: u32,
        /// File name of the model inside the models directory
        #[arg(long = "model_name", default_value = "my_quiniela.model")]
        model_name: String,
    },
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show database status
    Status,
}

impl Commands {
    fn task_name(&self) -> &'static str {
        match self {
            Commands::Train { .. } => "train",
            Commands::Predict { .. } => "predict",
            Commands::Data { .. } => "data",
            Commands::Init => "init",
        }
    }
}

fn season_scope(value: &str) -> std::result::Result<SeasonScope, String> {
    parse_seasons(value).map_err(|e| e.to_string())
}

/// Log lines go to stderr and to the run's log file
struct LogSink {
    file: Option<File>,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        std::io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        std::io::stderr().flush()
    }
}

fn init_logging(config: &Config, task: &str, verbose: bool) {
    let started = chrono::Local::now();
    let file = std::fs::create_dir_all(&config.data.logs_dir)
        .and_then(|_| {
            File::create(
                std::path::Path::new(&config.data.logs_dir).join(format!(
                    "{}_{}.log",
                    task,
                    started.format("%Y-%m-%d_%H-%M-%S")
                )),
            )
        })
        .map_err(|e| eprintln!("Could not create log file in {}: {}", config.data.logs_dir, e))
        .ok();

    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(LogSink { file })))
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Load or create config
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

    init_logging(&config, cli.command.task_name(), cli.verbose);

    let result = match cli.command {
        Commands::Train {
            training_seasons,
            model_name,
        } => commands::train(&config, &training_seasons, &model_name),
        Commands::Predict {
            season,
            division,
            matchday,
            model_name,
        } => commands::predict(&config, &season, division, matchday, &model_name),
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use quiniela::data::Database;
    use quiniela::predict::{render_report, run_predict, run_train};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        if let Some(parent) = std::path::Path::new(&config.data.database_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&config.data.models_dir)?;
        std::fs::create_dir_all(&config.data.logs_dir)?;
        println!(
            "Created {}, {} and {} directories",
            std::path::Path::new(&config.data.database_path)
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            config.data.models_dir,
            config.data.logs_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Load the Matches table into {}",
            config.data.database_path
        );
        println!("  3. Run 'quiniela train' to train the model");
        println!("  4. Run 'quiniela predict 2021-2022 1 3' to predict a matchday");

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:        {}", config.data.database_path);
        println!("  Matches:     {}", stats.match_count);
        println!("  Seasons:     {}", stats.season_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_season, stats.latest_season) {
            println!("  Range:       {} to {}", earliest, latest);
        }
        println!("  Predictions: {}", stats.prediction_count);

        Ok(())
    }

    pub fn train(config: &Config, scope: &SeasonScope, model_name: &str) -> Result<()> {
        let path = run_train(config, scope, model_name)?;
        println!("Model successfully trained and saved in {}", path.display());
        Ok(())
    }

    pub fn predict(
        config: &Config,
        season: &str,
        division: u8,
        matchday: u32,
        model_name: &str,
    ) -> Result<()> {
        let predictions = run_predict(config, season, division, matchday, model_name)?;
        print!("{}", render_report(season, division, matchday, &predictions));
        Ok(())
    }
}
