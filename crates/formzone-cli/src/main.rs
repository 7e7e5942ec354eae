//! `formzone` command-line tool
//!
//! Inspects a project's columns, validates batches and drives the
//! escalation workflow without the interactive surface.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use formzone_core::{spawn_validation, Batch, EscalationOutcome, Project, QcStrategy};
use formzone_ledger::Comment;
use formzone_schema::{COMMENTS_COLUMN, DOCUMENT_KEY_COLUMN};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn project_arg() -> Arg {
    Arg::new("project")
        .long("project")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Project folder")
}

fn batch_arg() -> Arg {
    Arg::new("batch")
        .long("batch")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Clean batch file; the review file sits beside it")
}

fn document_arg() -> Arg {
    Arg::new("document")
        .long("document")
        .required(true)
        .help("Document key (tiff_path)")
}

fn cli() -> Command {
    Command::new("formzone")
        .version(formzone_core::VERSION)
        .about("Scanned survey form digitization")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("columns")
                .about("Print the resolved batch header")
                .arg(project_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate every record of a batch and merge the findings")
                .arg(project_arg())
                .arg(batch_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("escalate")
                .about("Attach an escalated comment and move the record under review")
                .arg(project_arg())
                .arg(batch_arg())
                .arg(document_arg())
                .arg(
                    Arg::new("page")
                        .long("page")
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("Page the comment refers to"),
                )
                .arg(Arg::new("field").long("field").required(true).help("Field name"))
                .arg(
                    Arg::new("message")
                        .long("message")
                        .required(true)
                        .help("Comment text"),
                ),
        )
        .subcommand(
            Command::new("de-escalate")
                .about("Clear escalation flags and return the record to the clean dataset")
                .arg(project_arg())
                .arg(batch_arg())
                .arg(document_arg()),
        )
        .subcommand(
            Command::new("comments")
                .about("Print every comment of a batch, by page and field")
                .arg(project_arg())
                .arg(batch_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

fn str_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}

fn open_project(args: &ArgMatches) -> Result<Project> {
    let root = path_arg(args, "project")?;
    Project::open(root).with_context(|| format!("opening project {}", root.display()))
}

fn open_batch(project: &Project, args: &ArgMatches) -> Result<Batch> {
    let path = path_arg(args, "batch")?;
    let (batch, report) = project
        .open_batch(path)
        .with_context(|| format!("opening batch {}", path.display()))?;
    if report.needs_save() {
        info!(
            settled = report.duplicates.len(),
            moved = report.moved_to_review.len(),
            "batch repaired on open; saving"
        );
        batch.save()?;
    }
    Ok(batch)
}

fn columns(args: &ArgMatches) -> Result<()> {
    let project = open_project(args)?;
    println!("{DOCUMENT_KEY_COLUMN}");
    for column in project.columns() {
        println!("{column}");
    }
    println!("{COMMENTS_COLUMN}");
    Ok(())
}

async fn validate(args: &ArgMatches) -> Result<()> {
    let project = Arc::new(open_project(args)?);
    let batch = Arc::new(open_batch(&project, args)?);
    let handle = spawn_validation(project, batch);

    let mut progress = handle.progress();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let now = *progress.borrow_and_update();
            debug!(done = now.done, total = now.total, "validation progress");
        }
    });
    let report = handle.join().await?;
    watcher.await.context("progress watcher failed")?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Records:   {}", report.records);
        println!("Validated: {}", report.validated);
        println!("Comments added: {}", report.added);
        if report.cancelled {
            println!("Run was cancelled");
        }
        for failure in &report.failures {
            println!("Rule {} ({}) skipped: {}", failure.index, failure.strategy, failure.error);
        }
    }
    Ok(())
}

fn escalate(args: &ArgMatches) -> Result<()> {
    let project = open_project(args)?;
    let batch = open_batch(&project, args)?;
    let document = str_arg(args, "document")?;
    let page = *args.get_one::<u32>("page").context("--page is required")?;
    let comment = Comment::new(page, str_arg(args, "field")?, str_arg(args, "message")?);

    match QcStrategy::new(&project, &batch).escalate(document, comment)? {
        EscalationOutcome::Moved => println!("{document}: moved under review"),
        EscalationOutcome::AlreadyUnderReview => println!("{document}: already under review; comment added"),
    }
    Ok(())
}

fn deescalate(args: &ArgMatches) -> Result<()> {
    let project = open_project(args)?;
    let batch = open_batch(&project, args)?;
    let document = str_arg(args, "document")?;
    let cleared = QcStrategy::new(&project, &batch).deescalate(document)?;
    println!("{document}: returned to clean ({cleared} escalation flag(s) cleared)");
    Ok(())
}

fn comments(args: &ArgMatches) -> Result<()> {
    let project = open_project(args)?;
    let batch = open_batch(&project, args)?;
    let checklist = QcStrategy::new(&project, &batch).comment_checklist();
    if checklist.is_empty() {
        println!("No comments");
    }
    for entry in checklist {
        println!("{} [{}] {}", entry.document, entry.state, entry.comment);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("columns", args)) => columns(args),
        Some(("validate", args)) => validate(args).await,
        Some(("escalate", args)) => escalate(args),
        Some(("de-escalate", args)) => deescalate(args),
        Some(("comments", args)) => comments(args),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn escalate_requires_all_comment_parts() {
        let parsed = cli().try_get_matches_from([
            "formzone", "escalate", "--project", "p", "--batch", "b.csv", "--document", "a.tif",
            "--page", "1", "--field", "name",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn page_must_be_numeric() {
        let parsed = cli().try_get_matches_from([
            "formzone", "escalate", "--project", "p", "--batch", "b.csv", "--document", "a.tif",
            "--page", "two", "--field", "name", "--message", "m",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn log_json_is_accepted_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["formzone", "columns", "--project", "p", "--log-json"])
            .unwrap();
        assert!(matches.get_flag("log-json"));
    }
}
