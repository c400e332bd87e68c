//! `pkgcite` command-line tool.

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Parser};
use itertools::Itertools;
use pkgcite::fetch::{FetchConfig, Registry, fetch_all};
use pkgcite::request::{canonical_name, pin_installed, read_freeze, read_requests};
use pkgcite::{OutputFormat, PackageRequest, parse_request, write_items};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Fallback for `--date-accessed`.
const DATE_ACCESSED_VAR: &str = "PKGCITE_DATE_ACCESSED";

#[derive(Parser, Debug)]
#[command(
    name = "pkgcite",
    version,
    about = "Generate CSL-JSON citations for software packages",
    long_about = "Generate CSL-JSON citations for software packages.\n\n\
                  Packages are given as `name` or `name==version`. Citations are\n\
                  built from the metadata published on PyPI or crates.io.\n\n\
                  For PyPI, an unversioned package is cited at the version\n\
                  `pip freeze` reports as installed, when there is one."
)]
struct Cli {
    /// Packages to cite. `-` reads newline-separated packages from stdin.
    #[arg(value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Registry the packages are published on.
    #[arg(
        short = 'r',
        long = "repo",
        alias = "registry",
        default_value = "pypi",
        value_name = "pypi|crates"
    )]
    registry: Registry,

    /// Cite every package reported by `pip freeze` (pypi only).
    #[arg(short = 'a', long = "all-python")]
    all_python: bool,

    /// Python interpreter used to run `pip freeze`.
    #[arg(long, default_value = "python3", value_name = "PATH")]
    python: String,

    /// Read newline-separated packages from a file (`-` for stdin).
    #[arg(short, long = "infile", value_name = "FILE")]
    infile: Vec<PathBuf>,

    /// Write citations to a file instead of stdout.
    #[arg(short, long = "outfile", value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "csl-json/pretty")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Date the packages were accessed [default: $PKGCITE_DATE_ACCESSED, then today].
    #[arg(short = 'd', long = "date-accessed", value_name = "YYYY-MM-DD")]
    date_accessed: Option<NaiveDate>,

    /// Fetch one package at a time.
    #[arg(long)]
    sequential: bool,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    timeout: u64,
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Log to stderr. `RUST_LOG` applies when no `-v` is given.
fn init_logging(verbose: u8) {
    let level = level_filter(verbose).to_string().to_lowercase();
    let from_level = || EnvFilter::new(format!("warn,pkgcite={}", level));
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| from_level())
    } else {
        from_level()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Reads stdin at most once. Later reads give nothing.
struct Stdin {
    used: bool,
}

impl Stdin {
    fn read(&mut self) -> anyhow::Result<String> {
        if self.used {
            tracing::warn!("stdin (`-`) was already read, skipping");
            return Ok(String::new());
        }
        self.used = true;
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read packages from stdin")?;
        Ok(text)
    }
}

fn collect_requests(cli: &Cli) -> anyhow::Result<Vec<PackageRequest>> {
    let mut stdin = Stdin { used: false };
    let mut requests = Vec::new();
    for token in &cli.packages {
        if token == "-" {
            requests.extend(read_requests(&stdin.read()?));
        } else {
            requests.extend(parse_request(token));
        }
    }
    for path in &cli.infile {
        let text = if path.as_os_str() == "-" {
            stdin.read()?
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        };
        requests.extend(read_requests(&text));
    }
    Ok(requests.into_iter().unique().collect())
}

/// Packages installed for `python`, as reported by `pip freeze`.
fn pip_freeze(python: &str) -> anyhow::Result<Vec<PackageRequest>> {
    tracing::debug!(python, "running pip freeze");
    let output = Command::new(python)
        .args(["-m", "pip", "freeze"])
        .output()
        .with_context(|| format!("failed to run `{} -m pip freeze`", python))?;
    if !output.status.success() {
        bail!(
            "`{} -m pip freeze` failed: {}",
            python,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(read_freeze(&String::from_utf8_lossy(&output.stdout)))
}

/// Add installed packages for `--all-python` and pin unversioned PyPI
/// requests to their installed versions.
fn resolve_installed(
    cli: &Cli,
    requests: Vec<PackageRequest>,
    freeze: impl FnOnce() -> anyhow::Result<Vec<PackageRequest>>,
) -> anyhow::Result<Vec<PackageRequest>> {
    if cli.registry != Registry::Pypi {
        if cli.all_python {
            bail!("--all-python requires the pypi registry");
        }
        return Ok(requests);
    }
    let needs_freeze = cli.all_python || requests.iter().any(|r| r.version.is_none());
    if !needs_freeze {
        return Ok(requests);
    }
    let installed = match freeze() {
        Ok(installed) => installed,
        Err(error) if !cli.all_python => {
            tracing::warn!(%error, "installed versions unavailable, citing latest releases");
            return Ok(requests);
        }
        Err(error) => return Err(error),
    };
    let mut requests = pin_installed(requests, &installed);
    if cli.all_python {
        requests.extend(installed);
    }
    Ok(requests.into_iter().unique_by(|r| canonical_name(&r.name)).collect())
}

fn date_accessed(cli: &Cli) -> anyhow::Result<NaiveDate> {
    if let Some(date) = cli.date_accessed {
        return Ok(date);
    }
    match std::env::var(DATE_ACCESSED_VAR) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} is not a YYYY-MM-DD date: {:?}", DATE_ACCESSED_VAR, value)),
        Err(_) => Ok(Utc::now().date_naive()),
    }
}

/// Returns whether every package was cited.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let requests = resolve_installed(cli, collect_requests(cli)?, || pip_freeze(&cli.python))?;
    if requests.is_empty() {
        tracing::warn!("no packages to cite");
    }
    let accessed = date_accessed(cli)?;
    let config = FetchConfig {
        parallel: !cli.sequential,
        timeout: Duration::from_secs(cli.timeout),
    };
    let fetcher = cli
        .registry
        .fetcher(&config)
        .context("failed to create HTTP client")?;

    tracing::info!(registry = %cli.registry, count = requests.len(), %accessed, "citing packages");
    let mut items = Vec::new();
    let mut failed = 0usize;
    for (request, result) in fetch_all(fetcher.as_ref(), &requests, accessed, config.parallel) {
        match result {
            Ok(item) => items.push(item),
            Err(error) => {
                tracing::error!(package = %request, %error, "could not cite package");
                failed += 1;
            }
        }
    }

    match &cli.outfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_items(&items, cli.format, BufWriter::new(file))?;
        }
        None => write_items(&items, cli.format, io::stdout().lock())?,
    }

    if failed > 0 {
        tracing::warn!(failed, cited = items.len(), "some packages could not be cited");
    }
    Ok(failed == 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pkgcite", "requests"]).unwrap();
        assert_eq!(cli.packages, ["requests"]);
        assert_eq!(cli.registry, Registry::Pypi);
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.sequential);
        assert_eq!(cli.date_accessed, None);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "pkgcite", "-r", "crates", "-f", "csl-json/lines", "-vv", "-d", "2024-01-31",
            "--sequential", "-i", "a.txt", "-i", "b.txt", "-o", "out.json", "serde",
        ])
        .unwrap();
        assert_eq!(cli.registry, Registry::Crates);
        assert_eq!(cli.format, OutputFormat::Lines);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.date_accessed, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert!(cli.sequential);
        assert_eq!(cli.infile, [PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(cli.outfile, Some(PathBuf::from("out.json")));
    }

    #[rstest]
    #[case(&["pkgcite", "-r", "cran"])]
    #[case(&["pkgcite", "-f", "bibtex"])]
    #[case(&["pkgcite", "-d", "31/01/2024"])]
    fn test_invalid_values(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case(0, LevelFilter::WARN)]
    #[case(1, LevelFilter::INFO)]
    #[case(2, LevelFilter::DEBUG)]
    #[case(3, LevelFilter::TRACE)]
    #[case(9, LevelFilter::TRACE)]
    fn test_level_filter(#[case] verbose: u8, #[case] expected: LevelFilter) {
        assert_eq!(level_filter(verbose), expected);
    }

    #[test]
    fn test_collect_requests_dedupes_and_skips_invalid() {
        let cli = Cli::try_parse_from(["pkgcite", "numpy", "numpy", "-e", "requests==2.0"]);
        // `-e` is not a flag
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["pkgcite", "numpy", "numpy", "not valid", "requests==2.0"])
            .unwrap();
        assert_eq!(
            collect_requests(&cli).unwrap(),
            vec![
                PackageRequest::new("numpy"),
                PackageRequest::new("requests").with_version("2.0"),
            ]
        );
    }

    #[test]
    fn test_stdin_read_twice_is_empty() {
        let mut stdin = Stdin { used: true };
        assert_eq!(stdin.read().unwrap(), "");
    }

    #[rstest]
    #[case(&["pkgcite", "--repo", "crates", "serde"])]
    #[case(&["pkgcite", "-r", "crates", "serde"])]
    #[case(&["pkgcite", "--registry", "crates", "serde"])]
    fn test_repo_selector(#[case] args: &[&str]) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.registry, Registry::Crates);
        assert_eq!(cli.packages, ["serde"]);
    }

    fn installed() -> anyhow::Result<Vec<PackageRequest>> {
        Ok(read_freeze("Django==5.0.2\nnumpy==1.26.4\n"))
    }

    #[test]
    fn test_unversioned_pypi_uses_installed_version() {
        let cli = Cli::try_parse_from(["pkgcite", "django", "numpy==2.0.0", "requests"]).unwrap();
        let requests = resolve_installed(&cli, collect_requests(&cli).unwrap(), installed).unwrap();
        assert_eq!(
            requests,
            vec![
                PackageRequest::new("django").with_version("5.0.2"),
                PackageRequest::new("numpy").with_version("2.0.0"),
                PackageRequest::new("requests"),
            ]
        );
    }

    #[test]
    fn test_all_python_adds_installed_packages() {
        let cli = Cli::try_parse_from(["pkgcite", "-a", "requests==2.31.0", "numpy"]).unwrap();
        let requests = resolve_installed(&cli, collect_requests(&cli).unwrap(), installed).unwrap();
        assert_eq!(
            requests,
            vec![
                PackageRequest::new("requests").with_version("2.31.0"),
                PackageRequest::new("numpy").with_version("1.26.4"),
                PackageRequest::new("Django").with_version("5.0.2"),
            ]
        );
    }

    #[test]
    fn test_freeze_failure() {
        let failing = || -> anyhow::Result<Vec<PackageRequest>> { anyhow::bail!("no python") };
        let cli = Cli::try_parse_from(["pkgcite", "requests"]).unwrap();
        let requests = resolve_installed(&cli, collect_requests(&cli).unwrap(), failing).unwrap();
        assert_eq!(requests, vec![PackageRequest::new("requests")]);

        let cli = Cli::try_parse_from(["pkgcite", "-a"]).unwrap();
        assert!(resolve_installed(&cli, Vec::new(), failing).is_err());
    }

    #[test]
    fn test_crates_never_runs_freeze() {
        let cli = Cli::try_parse_from(["pkgcite", "-r", "crates", "serde"]).unwrap();
        let requests = resolve_installed(&cli, collect_requests(&cli).unwrap(), || {
            panic!("pip freeze should not run for crates")
        })
        .unwrap();
        assert_eq!(requests, vec![PackageRequest::new("serde")]);

        let cli = Cli::try_parse_from(["pkgcite", "-r", "crates", "-a"]).unwrap();
        assert!(resolve_installed(&cli, Vec::new(), installed).is_err());
    }

    #[test]
    fn test_explicit_date_wins() {
        let cli = Cli::try_parse_from(["pkgcite", "-d", "2020-02-29"]).unwrap();
        assert_eq!(date_accessed(&cli).unwrap(), NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    }
}
