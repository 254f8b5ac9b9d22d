use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use disqus_export::{
    config::validate_directory, export_forum, Client, Config, Credentials, Interfaces, RetryPolicy,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Download all comments of a Disqus forum by iterating through all comments
/// in all threads. The output is stored as JSON objects, one file per thread.
/// Whenever the API reports an exceeded request quota the program sleeps and
/// tries again.
#[derive(Parser, Debug)]
#[command(name = "disqus-export", version)]
struct Args {
    /// The OAuth API secret provided by Disqus.
    #[arg(short, long, env = "DISQUS_API_SECRET", hide_env_values = true)]
    secret: String,

    /// The OAuth API key provided by Disqus.
    #[arg(short, long, env = "DISQUS_API_KEY")]
    key: String,

    /// The name of the forum that will be exported.
    #[arg(short, long)]
    forum: String,

    /// The directory where output will be stored.
    #[arg(short, long, default_value = "./")]
    dir: PathBuf,

    /// The seconds to sleep after the request quota is exceeded.
    #[arg(short = 't', long = "sleeptime", default_value_t = 300)]
    sleep_time: u64,

    /// The interface description of the API.
    #[arg(short, long, default_value = "interfaces.json")]
    interfaces: PathBuf,

    /// Treat every API error as an exceeded quota and retry it.
    #[arg(long)]
    retry_any_api_error: bool,

    /// Minimum number of milliseconds between two requests.
    #[arg(long, value_name = "MS")]
    request_interval: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        if self.retry_any_api_error {
            RetryPolicy::AnyApiError
        } else {
            RetryPolicy::RateLimitOnly
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(args.level())
        .env()
        .init()
        .context("could not set up logging")?;

    let directory = validate_directory(&args.dir).await?;
    let interfaces = Interfaces::load(&args.interfaces)
        .await
        .with_context(|| format!("reading {}", args.interfaces.display()))?;

    let config = Config::new(args.forum.clone(), directory)
        .sleep_time(Duration::from_secs(args.sleep_time))
        .retry_policy(args.retry_policy());

    let credentials = Credentials {
        api_key: args.key.clone(),
        api_secret: args.secret.clone(),
    };
    let client = Client::new(
        credentials,
        interfaces,
        args.request_interval.map(Duration::from_millis),
    );

    log::info!("exporting forum '{}' to {}", config.forum, config.directory.display());
    export_forum(&client, &config)
        .await
        .with_context(|| format!("exporting forum '{}'", config.forum))?;
    log::info!("export of '{}' complete", config.forum);

    Ok(())
}
