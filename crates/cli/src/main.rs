// gstmatch - GSTR-2A vs purchase-book reconciliation from the command line

mod exit_codes;
mod matching;
mod reconcile;
mod worker;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gstmatch_io::IoError;
use gstmatch_recon::model::Ledger;
use gstmatch_recon::{ledger_from_table, ReconConfig, ReconError, ScorerKind, Side};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_CONFIG, EXIT_SUCCESS};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "gstmatch.toml";

#[derive(Parser)]
#[command(name = "gstmatch")]
#[command(about = "Match supplier names and reconcile purchase books against GSTR-2A")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors; no progress output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to gstmatch.toml (default: ./gstmatch.toml when present)
    #[arg(short, long, global = true, env = "GSTMATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Ledger inputs shared by every command that reads them.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Purchase book (CSV or workbook). A workbook holding both the books and
    /// GSTR-2A sheets may be given alone.
    pub ledger: PathBuf,

    /// GSTR-2A download (CSV or workbook), when it is a separate file
    pub returns: Option<PathBuf>,
}

/// Matching knobs that override `[matching]` in the config.
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// Minimum score (0-100) for two names to pair
    #[arg(long, value_name = "N")]
    pub threshold: Option<u8>,

    /// Score at or above which a pair is pre-confirmed
    #[arg(long, value_name = "N")]
    pub auto_confirm: Option<u8>,

    /// Similarity scorer: ratio, token_sort, jaro_winkler, levenshtein
    #[arg(long, value_parser = parse_scorer)]
    pub scorer: Option<ScorerKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair supplier names between the books and GSTR-2A
    #[command(after_help = "\
Examples:
  gstmatch match purchase.xlsx
  gstmatch match books.csv gstr2a.csv -o matches.csv
  gstmatch match books.csv gstr2a.csv --threshold 70 --scorer token_sort --json

The match table has one row per supplier name. Review it, set
'Manual Confirmation' to Yes for pairs that are the same supplier, and feed
it back with --matches.")]
    Match {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        tuning: MatchArgs,

        /// Write the match table (.csv, .xlsx or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the match table as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Rewrite books supplier names using a reviewed match table
    #[command(after_help = "\
Examples:
  gstmatch replace books.csv --matches matches.csv -o books-replaced.csv
  gstmatch replace purchase.xlsx --matches matches.xlsx -o replaced.xlsx")]
    Replace {
        /// Purchase book (CSV or workbook)
        ledger: PathBuf,

        /// Reviewed match table
        #[arg(short, long)]
        matches: PathBuf,

        /// Output file (.csv or .xlsx); every column is kept
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Reconcile tax amounts per supplier (or per invoice)
    #[command(after_help = "\
Examples:
  gstmatch reconcile purchase.xlsx -o report.xlsx
  gstmatch reconcile books.csv gstr2a.csv --matches matches.csv -o report.xlsx
  gstmatch reconcile books.csv gstr2a.csv --invoices -o invoices.csv
  gstmatch reconcile books.csv gstr2a.csv --json --fail-on-variance

Variance is GSTR-2A minus books: positive means credit available that the
books have not recorded.")]
    Reconcile {
        #[command(flatten)]
        inputs: InputArgs,

        /// Reviewed match table; confirmed pairs rename books suppliers first
        #[arg(short, long)]
        matches: Option<PathBuf>,

        /// Write the report (.xlsx, .csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reconcile per supplier and invoice number
        #[arg(long)]
        invoices: bool,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit with code 7 when any compared field has a nonzero variance
        #[arg(long)]
        fail_on_variance: bool,
    },

    /// Check a config file without running anything
    #[command(after_help = "\
Examples:
  gstmatch validate gstmatch.toml")]
    Validate {
        /// Path to the config file
        file: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  gstmatch-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let ctx = Context {
        config_path: cli.config,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Match { inputs, tuning, output, json } => {
            matching::cmd_match(&ctx, inputs, tuning, output, json)
        }
        Commands::Replace { ledger, matches, output } => {
            matching::cmd_replace(&ctx, ledger, matches, output)
        }
        Commands::Reconcile {
            inputs,
            matches,
            output,
            invoices,
            json,
            fail_on_variance,
        } => reconcile::cmd_reconcile(
            &ctx,
            inputs,
            reconcile::ReconcileArgs {
                matches,
                output,
                invoices,
                json,
                fail_on_variance,
            },
        ),
        Commands::Validate { file } => cmd_validate(&file),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("set the header names under [columns] in gstmatch.toml".to_string())
            }
            ReconError::NoMatches => Some("pass a match table with --matches".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        if let IoError::Recon(inner) = err {
            return inner.into();
        }
        let hint = match &err {
            IoError::SheetNotFound { .. } => {
                Some("set books_sheet / returns_sheet under [source] in gstmatch.toml".to_string())
            }
            IoError::NoHeaderRow { .. } => {
                Some("set header_row under [source] in gstmatch.toml".to_string())
            }
            IoError::MatchTable { .. } => {
                Some("'Manual Confirmation' must be Yes or No on every row".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// Shared setup
// ============================================================================

/// Global options every command sees.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub quiet: bool,
}

impl Context {
    /// Load the config (explicit path, else ./gstmatch.toml, else defaults)
    /// and apply command-line overrides.
    pub fn config(&self, tuning: &MatchArgs) -> Result<ReconConfig, CliError> {
        let mut config = match &self.config_path {
            Some(path) => read_config(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => read_config(Path::new(DEFAULT_CONFIG))?,
            None => ReconConfig::default(),
        };

        if let Some(t) = tuning.threshold {
            config.matching.threshold = t;
        }
        if let Some(a) = tuning.auto_confirm {
            config.matching.auto_confirm = a;
        }
        if let Some(s) = tuning.scorer {
            config.matching.scorer = s;
        }
        config.validate().map_err(|e| {
            CliError::from(e).with_hint("check --threshold / --auto-confirm against the config")
        })?;
        Ok(config)
    }

    /// Load both ledgers as typed records.
    pub fn ledgers(&self, inputs: &InputArgs, config: &ReconConfig) -> Result<(Ledger, Ledger), CliError> {
        let (books, returns) =
            gstmatch_io::load_tables(&inputs.ledger, inputs.returns.as_deref(), &config.source)?;
        let books = ledger_from_table(Side::Books, &books, &config.columns)?;
        let returns = ledger_from_table(Side::Returns, &returns, &config.columns)?;
        debug!(
            books = books.records.len(),
            returns = returns.records.len(),
            "ledgers loaded"
        );
        Ok((books, returns))
    }

    /// Progress line on stderr unless `--quiet`.
    pub fn note(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            eprintln!("{}", msg.as_ref());
        }
    }
}

fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = ReconConfig::from_toml(&text)?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn parse_scorer(s: &str) -> Result<ScorerKind, String> {
    ScorerKind::parse(s).ok_or_else(|| {
        format!("unknown scorer '{s}' (expected ratio, token_sort, jaro_winkler or levenshtein)")
    })
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(path: &Path) -> Result<(), CliError> {
    let config = read_config(path)?;
    let fields: Vec<&str> = config.reconcile.fields.iter().map(|f| f.label()).collect();
    println!("{}: ok", path.display());
    println!(
        "  matching:  threshold {}, auto-confirm {}, scorer {}",
        config.matching.threshold, config.matching.auto_confirm, config.matching.scorer
    );
    println!("  supplier:  '{}'", config.columns.supplier_name);
    println!("  gstin:     '{}'", config.columns.gstin);
    println!("  compare:   {} (presence by {})", fields.join(", "), config.reconcile.primary.label());
    println!(
        "  sheets:    '{}' / '{}', headers on row {}",
        config.source.books_sheet, config.source.returns_sheet, config.source.header_row
    );
    Ok(())
}
