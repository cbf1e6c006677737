//! `gstmatch match` and `gstmatch replace`.

use std::path::PathBuf;

use gstmatch_io::report::REPLACED_SHEET;
use gstmatch_io::{read_match_table, write_match_table};
use gstmatch_recon::matcher::{pair_count, sort_for_review};
use gstmatch_recon::model::{MatchEntry, MatchPass, MatchProgress};
use gstmatch_recon::replace::replace_in_table;
use gstmatch_recon::ReconSession;
use indicatif::{ProgressBar, ProgressStyle};

use crate::exit_codes::EXIT_OUTPUT;
use crate::{CliError, Context, InputArgs, MatchArgs};

pub fn cmd_match(
    ctx: &Context,
    inputs: InputArgs,
    tuning: MatchArgs,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let config = ctx.config(&tuning)?;
    let (books, returns) = ctx.ledgers(&inputs, &config)?;
    let mut session = ReconSession::new(config, books, returns)?;

    let bar = progress_bar(ctx.quiet);
    let mut entries = session
        .run_matching(&mut |p: MatchProgress| update_bar(&bar, p))
        .to_vec();
    bar.finish_and_clear();
    sort_for_review(&mut entries);

    if let Some(path) = &output {
        write_match_table(path, &entries)?;
        ctx.note(format!("wrote {}", path.display()));
    }

    if json {
        let text = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::new(EXIT_OUTPUT, format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else if output.is_none() {
        print_entries(&entries);
    }

    let confirmed = entries.iter().filter(|e| e.confirmed).count();
    let options = session.config().matching.options();
    ctx.note(format!(
        "{} names: {} paired at score >= {}, {} pre-confirmed at >= {}, {} unmatched",
        entries.len(),
        pair_count(&entries),
        options.threshold,
        confirmed,
        options.auto_confirm,
        entries.iter().filter(|e| !e.is_pair()).count(),
    ));
    Ok(())
}

pub fn cmd_replace(
    ctx: &Context,
    ledger: PathBuf,
    matches: PathBuf,
    output: PathBuf,
) -> Result<(), CliError> {
    let config = ctx.config(&MatchArgs::default())?;
    let source = &config.source;
    let table = gstmatch_io::load_table(&ledger, &source.books_sheet, source.header_row, true)?;
    let entries = read_match_table(&matches)?;

    let replaced = replace_in_table(&table, &config.columns.supplier_name, &entries)?;
    gstmatch_io::write_table(&output, REPLACED_SHEET, &replaced)?;

    let confirmed = entries.iter().filter(|e| e.confirmed && e.is_pair()).count();
    ctx.note(format!(
        "applied {confirmed} confirmed pairs to {} rows; wrote {}",
        replaced.rows.len(),
        output.display()
    ));
    Ok(())
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    bar.set_prefix("matching");
    bar
}

fn update_bar(bar: &ProgressBar, p: MatchProgress) {
    bar.set_length(p.total as u64);
    bar.set_position(p.done as u64);
    bar.set_message(match p.pass {
        MatchPass::ReturnsToBooks => "GSTR-2A -> books",
        MatchPass::BooksToReturns => "books -> GSTR-2A",
    });
}

fn print_entries(entries: &[MatchEntry]) {
    let width = entries
        .iter()
        .filter_map(|e| e.returns_name.as_deref())
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("GSTR-2A".len());

    println!("{:<width$}  Books / score / confirmed", "GSTR-2A");
    for e in entries {
        println!(
            "{:<width$}  {} / {} / {}",
            e.returns_name.as_deref().unwrap_or("-"),
            e.books_name.as_deref().unwrap_or("-"),
            e.score,
            if e.confirmed { "Yes" } else { "No" },
        );
    }
}
