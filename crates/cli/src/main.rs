mod dashboard;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use semadvisor_core::config::Config;
use semadvisor_core::error::AdvisorError;
use semadvisor_core::report::Report;
use semadvisor_core::request::{CustomerId, DateRange, ReportRequest};
use semadvisor_core::source::{AdsDataSource, GoogleAdsClient, SnapshotSource};
use semadvisor_core::{advise, FetchError};

use dashboard::PromptAborted;
use render::{print_aborted, print_banner, print_failure, print_invalid, style, write_report};

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID: u8 = 2;
const EXIT_ABORTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "semadvisor",
    version,
    about = "Search campaign strategy advisor for Google Ads accounts"
)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch account data and print tables plus recommendations
    Recommend {
        #[command(flatten)]
        target: TargetArgs,

        /// Replay a saved account snapshot instead of calling the API
        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write the report into this directory
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },
    /// Interactive prompt for customer ID and date range
    Dashboard {
        #[arg(long)]
        snapshot: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Pull live data and save it as a snapshot file
    Fetch {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// 10-digit Google Ads customer ID (no dashes)
    #[arg(long)]
    customer_id: String,

    #[arg(long)]
    start_date: Option<NaiveDate>,

    #[arg(long)]
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    All,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let res = match cli.cmd {
        Commands::Recommend {
            target,
            snapshot,
            config,
            out,
            output_format,
        } => {
            let cfg = load_config(config.as_deref());
            run_recommend(
                &target,
                &cfg,
                snapshot.as_deref(),
                out.as_deref(),
                &output_format,
            )
        }
        Commands::Dashboard { snapshot, config } => {
            let cfg = load_config(config.as_deref());
            run_dashboard(&cfg, snapshot.as_deref())
        }
        Commands::Fetch {
            target,
            config,
            out,
        } => {
            let cfg = load_config(config.as_deref());
            run_fetch(&target, &cfg, &out)
        }
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report_error(&e)),
    }
}

/// Prints the error the way its kind calls for and picks the exit status.
fn report_error(e: &anyhow::Error) -> u8 {
    if let Some(aborted) = e.downcast_ref::<PromptAborted>() {
        print_aborted(aborted);
        return EXIT_ABORTED;
    }
    match e.downcast_ref::<AdvisorError>() {
        Some(inner) if inner.is_validation() => {
            print_invalid(inner);
            EXIT_INVALID
        }
        _ => {
            print_failure(e);
            EXIT_FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "semadvisor=info,semadvisor_core=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(p) => Config::load(p).map(Some),
        None => Config::discover(),
    };
    match loaded {
        Ok(cfg) => cfg.unwrap_or_default(),
        Err(e) => {
            eprintln!(
                "{}{}warning:{} failed to load config: {:#}",
                style().bold,
                style().yellow,
                style().reset,
                e
            );
            Config::default()
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_request(
    target: &TargetArgs,
    cfg: &Config,
    today: NaiveDate,
) -> Result<ReportRequest, AdvisorError> {
    let customer_id = CustomerId::parse(&target.customer_id)?;
    let date_range =
        DateRange::resolve(target.start_date, target.end_date, today, cfg.window_days())?;
    Ok(ReportRequest::new(customer_id, date_range))
}

fn build_source(cfg: &Config, snapshot: Option<&Path>) -> Result<Box<dyn AdsDataSource>, FetchError> {
    match snapshot {
        Some(p) => Ok(Box::new(SnapshotSource::load(p)?)),
        None => {
            let ads = cfg.google_ads.clone().with_env_overrides();
            Ok(Box::new(GoogleAdsClient::from_config(&ads)?))
        }
    }
}

fn fetch_and_advise(
    cfg: &Config,
    snapshot: Option<&Path>,
    request: &ReportRequest,
) -> anyhow::Result<Report> {
    let source = build_source(cfg, snapshot).map_err(AdvisorError::from)?;
    let s = style();
    eprintln!(
        "  {dim}Fetching data for customer{reset} {bold}{}{reset}{dim}...{reset}\n",
        request.customer_id,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    Ok(advise(source.as_ref(), request)?)
}

fn run_recommend(
    target: &TargetArgs,
    cfg: &Config,
    snapshot: Option<&Path>,
    out: Option<&Path>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let request = resolve_request(target, cfg, today())?;

    print_banner();

    let report = fetch_and_advise(cfg, snapshot, &request)?;

    let stdout = std::io::stdout();
    write_report(&mut stdout.lock(), &report).context("write report to stdout")?;

    if let Some(out) = out {
        write_report_files(&report, out, output_format)?;
    }

    Ok(())
}

fn write_report_files(
    report: &Report,
    out: &Path,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("create out dir {}", out.display()))?;

    let write_json = matches!(output_format, OutputFormat::Json | OutputFormat::All);
    let write_md = matches!(output_format, OutputFormat::Markdown | OutputFormat::All);

    let s = style();
    if write_json {
        let json_path = out.join("report.json");
        let json = serde_json::to_vec_pretty(report).context("serialize report json")?;
        std::fs::write(&json_path, json)
            .with_context(|| format!("write {}", json_path.display()))?;
        eprintln!(
            "  {green}\u{2192}{reset} {dim}{}{reset}",
            json_path.display(),
            green = s.green,
            dim = s.dim,
            reset = s.reset
        );
    }

    if write_md {
        let md_path = out.join("report.md");
        std::fs::write(&md_path, report.to_markdown())
            .with_context(|| format!("write {}", md_path.display()))?;
        eprintln!(
            "  {green}\u{2192}{reset} {dim}{}{reset}",
            md_path.display(),
            green = s.green,
            dim = s.dim,
            reset = s.reset
        );
    }

    info!(out = %out.display(), "report files written");
    Ok(())
}

fn run_dashboard(cfg: &Config, snapshot: Option<&Path>) -> anyhow::Result<()> {
    print_banner();

    loop {
        let request = dashboard::prompt_request(today(), cfg.window_days())?;

        if dashboard::confirm_fetch()? {
            // failures are shown and the session continues
            match fetch_and_advise(cfg, snapshot, &request) {
                Ok(report) => {
                    let stdout = std::io::stdout();
                    write_report(&mut stdout.lock(), &report)
                        .context("write report to stdout")?;
                }
                Err(e) => print_failure(&e),
            }
        }

        if !dashboard::confirm_another()? {
            return Ok(());
        }
    }
}

fn run_fetch(target: &TargetArgs, cfg: &Config, out: &Path) -> anyhow::Result<()> {
    let request = resolve_request(target, cfg, today())?;

    let ads = cfg.google_ads.clone().with_env_overrides();
    let client = GoogleAdsClient::from_config(&ads).map_err(AdvisorError::from)?;
    let snapshot = client
        .fetch_snapshot(&request)
        .map_err(AdvisorError::from)?;

    let json = serde_json::to_vec_pretty(&snapshot).context("serialize snapshot json")?;
    std::fs::write(out, json).with_context(|| format!("write {}", out.display()))?;

    let s = style();
    eprintln!(
        "  {green}saved{reset} {} campaigns, {} keywords {dim}\u{2192} {}{reset}",
        snapshot.campaigns.len(),
        snapshot.keywords.len(),
        out.display(),
        green = s.green,
        dim = s.dim,
        reset = s.reset
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str, start: Option<&str>, end: Option<&str>) -> TargetArgs {
        TargetArgs {
            customer_id: id.to_string(),
            start_date: start.map(|s| s.parse().unwrap()),
            end_date: end.map(|s| s.parse().unwrap()),
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn resolve_request_without_dates_is_unbounded() {
        let req = resolve_request(&target("1234567890", None, None), &Config::default(), d("2024-06-01"))
            .unwrap();
        assert_eq!(req.date_range, None);
    }

    #[test]
    fn resolve_request_defaults_start_from_window() {
        let cfg = Config {
            default_window_days: Some(7),
            ..Config::default()
        };
        let req = resolve_request(&target("1234567890", None, Some("2024-06-10")), &cfg, d("2024-06-30"))
            .unwrap();
        let range = req.date_range.unwrap();
        assert_eq!(range.start(), d("2024-06-03"));
        assert_eq!(range.end(), d("2024-06-10"));
    }

    #[test]
    fn resolve_request_rejects_bad_input() {
        let err = resolve_request(&target("12345", None, None), &Config::default(), d("2024-06-01"))
            .unwrap_err();
        assert!(err.is_validation());

        let err = resolve_request(
            &target("1234567890", Some("2024-06-05"), Some("2024-06-01")),
            &Config::default(),
            d("2024-06-10"),
        )
        .unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidDateRange { .. }));
    }

    #[test]
    fn errors_map_to_exit_codes() {
        let aborted = anyhow::Error::new(PromptAborted::from(dialoguer::Error::IO(
            std::io::Error::from(std::io::ErrorKind::Interrupted),
        )));
        assert_eq!(report_error(&aborted), EXIT_ABORTED);

        let invalid = anyhow::Error::new(CustomerId::parse("12345").unwrap_err());
        assert_eq!(report_error(&invalid), EXIT_INVALID);

        let upstream = anyhow::Error::new(AdvisorError::from(FetchError::MissingCredential(
            "refresh_token",
        )));
        assert_eq!(report_error(&upstream), EXIT_FAILURE);
    }

    #[test]
    fn missing_credentials_are_not_validation_errors() {
        let err = build_source(&Config::default(), None).err().unwrap();
        assert!(matches!(err, FetchError::MissingCredential(_)));
        assert!(!AdvisorError::from(err).is_validation());
    }
}
