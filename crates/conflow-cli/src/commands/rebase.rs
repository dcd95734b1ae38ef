//! Offline three-way merge of JSON files

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use conflow_core::rebase::{rebase, rebase_form_edits};
use conflow_core::Document;

#[derive(Debug, Args)]
pub struct RebaseArgs {
    /// Document the local edits started from
    #[arg(long)]
    pub base: PathBuf,

    /// Locally edited document
    #[arg(long)]
    pub current: PathBuf,

    /// Latest persisted document
    #[arg(long)]
    pub latest: PathBuf,

    /// Treat the inputs as form documents (result is always a mapping)
    #[arg(long)]
    pub form: bool,
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Document::parse(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn execute(args: RebaseArgs) -> anyhow::Result<()> {
    let base = read_document(&args.base)?;
    let current = read_document(&args.current)?;
    let latest = read_document(&args.latest)?;

    let merged = if args.form {
        rebase_form_edits(&base, &current, &latest)
    } else {
        rebase(&base, &current, &latest)
    };

    print!("{}", merged.to_pretty_string()?);
    Ok(())
}
