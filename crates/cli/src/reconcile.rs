//! `gstmatch reconcile` - supplier or invoice level variance.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gstmatch_io::report::format_paise;
use gstmatch_io::{read_match_table, write_invoice_report, write_report};
use gstmatch_recon::model::{InvoiceReconResult, MatchEntry, Presence, ReconMeta, TaxField};
use gstmatch_recon::{ReconResult, ReconSession};
use serde::Serialize;

use crate::exit_codes::{EXIT_OUTPUT, EXIT_VARIANCE};
use crate::worker::Worker;
use crate::{CliError, Context, InputArgs, MatchArgs};

pub struct ReconcileArgs {
    pub matches: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub invoices: bool,
    pub json: bool,
    pub fail_on_variance: bool,
}

enum Outcome {
    Suppliers(ReconResult),
    Invoices(InvoiceReconResult),
}

pub fn cmd_reconcile(ctx: &Context, inputs: InputArgs, args: ReconcileArgs) -> Result<(), CliError> {
    let config = ctx.config(&MatchArgs::default())?;
    let (books, returns) = ctx.ledgers(&inputs, &config)?;
    let mut session = ReconSession::new(config, books, returns)?;

    if let Some(path) = &args.matches {
        let entries = read_match_table(path)?;
        ctx.note(format!(
            "using {} confirmed pairs from {}",
            entries.iter().filter(|e| e.confirmed && e.is_pair()).count(),
            path.display()
        ));
        session.set_matches(entries);
    }

    let invoices = args.invoices;
    let worker = Worker::new(1)?;
    let handle = worker.submit(move || {
        let outcome = if invoices {
            Outcome::Invoices(session.reconcile_invoices())
        } else {
            Outcome::Suppliers(session.reconcile())
        };
        (outcome, session.matches().map(<[MatchEntry]>::to_vec))
    });
    let (outcome, matches) = handle.wait_with_spinner("reconciling", !ctx.quiet)?;

    let has_variance = match &outcome {
        Outcome::Suppliers(result) => {
            if let Some(path) = &args.output {
                write_report(path, result, matches.as_deref())?;
                ctx.note(format!("wrote {}", path.display()));
            }
            if args.json {
                print_json(result)?;
            }
            if !ctx.quiet {
                print_supplier_summary(result);
            }
            result.summary.variance_totals.values().any(|v| *v != 0)
        }
        Outcome::Invoices(result) => {
            if let Some(path) = &args.output {
                write_invoice_report(path, result)?;
                ctx.note(format!("wrote {}", path.display()));
            }
            if args.json {
                print_json(result)?;
            }
            if !ctx.quiet {
                print_invoice_summary(result);
            }
            result.rows.iter().any(|r| r.variance.values().any(|v| *v != 0))
        }
    };

    if args.fail_on_variance && has_variance {
        return Err(CliError::new(EXIT_VARIANCE, "variance found between books and GSTR-2A"));
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_OUTPUT, format!("JSON serialization error: {e}")))?;
    println!("{text}");
    Ok(())
}

fn print_meta(meta: &ReconMeta) {
    if !meta.gstin_available {
        eprintln!("note: GSTIN column missing; suppliers grouped by name only");
    }
}

fn print_supplier_summary(result: &ReconResult) {
    let s = &result.summary;
    print_meta(&result.meta);
    eprintln!(
        "{} suppliers: {} on both sides, {} only in GSTR-2A, {} only in books",
        s.total_entities, s.both, s.returns_only, s.books_only
    );
    eprintln!(
        "  {:<16} {:>14} {:>14} {:>14}",
        "field", "books", "GSTR-2A", "variance"
    );
    for field in &result.meta.fields {
        let get = |m: &BTreeMap<TaxField, i64>| format_paise(m.get(field).copied().unwrap_or(0));
        eprintln!(
            "  {:<16} {:>14} {:>14} {:>14}",
            field.label(),
            get(&s.books_totals),
            get(&s.returns_totals),
            get(&s.variance_totals),
        );
    }
}

fn print_invoice_summary(result: &InvoiceReconResult) {
    print_meta(&result.meta);
    let count = |p: Presence| result.rows.iter().filter(|r| r.presence == p).count();
    let differing = result
        .rows
        .iter()
        .filter(|r| r.variance.values().any(|v| *v != 0))
        .count();
    eprintln!(
        "{} invoices: {} on both sides, {} only in GSTR-2A, {} only in books, {} with a variance",
        result.rows.len(),
        count(Presence::Both),
        count(Presence::ReturnsOnly),
        count(Presence::BooksOnly),
        differing,
    );
}
