use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info, warn};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

use culearn_grades::cli::Args;
use culearn_grades::config::{Config, FailurePolicy};
use culearn_grades::utils::diff::{diff_grades, format_diff, load_previous};
use culearn_grades::utils::http::PortalClient;
use culearn_grades::utils::output::{ConsoleSink, JsonFileSink, ResultSink};
use culearn_grades::utils::prompt::{CredentialSource, EnvCredentials, TerminalPrompt};
use culearn_grades::utils::scrape::Scraper;

// Everything is sequential, a single-threaded runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Loads environment variables from a `.env` file, if present.
    dotenv().ok();
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = config.log_level.parse().unwrap_or(LevelFilter::Info);
    if let Err(e) = TermLogger::init(level, simplelog::Config::default(), TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Failed to set up logging: {}", e);
    }

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, mut config: Config) -> Result<()> {
    if let Some(secs) = args.timeout {
        config.login_timeout = Duration::from_secs(secs);
    }
    if args.abort_on_error {
        config.on_course_error = FailurePolicy::Abort;
    }

    let client = PortalClient::new()?;
    let scraper = Scraper::new(&client, &config);

    let mut prompt = TerminalPrompt::new();
    let mut env_credentials;
    let source: &mut dyn CredentialSource = if args.non_interactive {
        let username = config.username.clone().context("CULEARN_USERNAME is not set")?;
        let password = config.password.clone().context("CULEARN_PASSWORD is not set")?;
        env_credentials = EnvCredentials::new(username, password, args.verbose);
        &mut env_credentials
    } else {
        &mut prompt
    };

    // Flags win over the interactive question, which comes after the login.
    let verbose = if args.verbose || args.quiet || args.non_interactive {
        Some(args.verbose)
    } else {
        None
    };

    info!("Start scrape");
    let report = scraper.run(source, verbose, &mut [&mut ConsoleSink]).await?;

    if !report.instructor_views.is_empty() {
        info!("Skipped courses you teach: {}", report.instructor_views.join(", "));
    }
    for (id, e) in &report.failures {
        warn!("Course {} was not collected: {}", id, e);
    }

    // Compares the fresh grades with a previous export, if one was given.
    if let Some(path) = &args.compare {
        match load_previous(path)? {
            Some(previous) => {
                let diffs = diff_grades(&previous, &report.result);
                if diffs.is_empty() {
                    info!("No new grades since {}", path.display());
                }
                for diff in &diffs {
                    println!("{}", format_diff(diff));
                }
            }
            None => info!("{} is missing or empty, nothing to compare", path.display()),
        }
    }

    let target = if args.no_save {
        None
    } else if args.output.is_some() || args.non_interactive {
        args.output.clone()
    } else {
        prompt.save_target()?
    };
    if let Some(name) = target {
        JsonFileSink::new(&name).emit(&report.result, false)?;
    }

    info!("Finish scrape");
    Ok(())
}
