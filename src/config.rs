use clap::Parser;

use crate::scrapers::ScrapeParams;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Multi-source job posting aggregation service")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// Cron expression for the periodic scrape (seconds field first)
    #[arg(long, env = "SCRAPE_SCHEDULE", default_value = "0 0 */6 * * *")]
    pub scrape_schedule: String,

    /// Default search keywords for scheduled scrapes
    #[arg(long, env = "SCRAPE_KEYWORDS", default_value = "software engineer")]
    pub scrape_keywords: String,

    /// Default search location for scheduled scrapes
    #[arg(long, env = "SCRAPE_LOCATION", default_value = "India")]
    pub scrape_location: String,

    /// Per-source cap on extracted records
    #[arg(long, env = "SCRAPE_MAX_RESULTS", default_value = "50")]
    pub scrape_max_results: usize,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the API server and scheduler (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run one scrape pass and exit
    Scrape {
        /// Restrict to a single source (all sources when omitted)
        #[arg(long)]
        source: Option<String>,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn scrape_params(&self) -> ScrapeParams {
        ScrapeParams {
            keywords: self.scrape_keywords.clone(),
            location: self.scrape_location.clone(),
            max_results: self.scrape_max_results,
        }
    }
}
