// crates/qa_cli/src/args.rs
//
// `quota` flags. Either --input (generate from a request) or --cells with
// --total (rebalance an existing set) or with --duplicate / --delete (edit one
// cell). Paths must be local files.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Even,
    Census,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IdsArg {
    /// ChaCha20 ids ("q_" + 16 hex), reproducible from --seed.
    Seeded,
    /// q_0001, q_0002, …
    Sequential,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "quota",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic quota allocation over demographic combinations"
)]
pub struct Args {
    /// Allocation request JSON (dimensions, totalTarget, mode).
    #[arg(long, conflicts_with = "cells")]
    pub input: Option<PathBuf>,

    /// Existing cell set (bare array or a previous allocation.json) to redistribute evenly.
    #[arg(long)]
    pub cells: Option<PathBuf>,

    /// Total target. Overrides the request's totalTarget; required with --cells.
    #[arg(long, allow_negative_numbers = true)]
    pub total: Option<i64>,

    /// Append a copy of this cell to the --cells set instead of redistributing.
    #[arg(long, value_name = "CELL_ID", requires = "cells", conflicts_with = "delete")]
    pub duplicate: Option<String>,

    /// Remove this cell from the --cells set instead of redistributing.
    #[arg(long, value_name = "CELL_ID", requires = "cells")]
    pub delete: Option<String>,

    /// Allocation mode override for --input.
    #[arg(long, value_enum, conflicts_with = "cells")]
    pub mode: Option<ModeArg>,

    /// Engine params JSON (every field optional).
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Id seed override. Accepts decimal u64 or 0x-hex (≤16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// Id source for new cells.
    #[arg(long, value_enum, default_value = "seeded")]
    pub ids: IdsArg,

    /// Directory receiving allocation.json and any reports.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Report renderer(s) to emit next to allocation.json. Omit to skip.
    #[arg(long, value_parser = ["json", "text"], num_args = 0..=2)]
    pub render: Vec<String>,

    /// Validate inputs only (load + schema + structural checks); write nothing.
    #[arg(long)]
    pub validate_only: bool,

    /// Only warnings and errors on stderr.
    #[arg(long)]
    pub quiet: bool,

    /// Log filter (e.g. "debug" or "qa_pipeline=trace"). Takes precedence over RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// `--duplicate` or `--delete` was given.
    pub fn is_edit(&self) -> bool {
        self.duplicate.is_some() || self.delete.is_some()
    }
}

/// Flag-level problems found after clap has parsed the command line.
#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    Missing(&'static str),
    InputChoice,
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Missing(flag) => write!(f, "{flag} is required"),
            CliError::InputChoice => f.write_str("exactly one of --input or --cells is required"),
            CliError::NonLocalPath(p) => write!(f, "only local files are accepted (no scheme): {p}"),
            CliError::NotFound(what) => write!(f, "no such file: {what}"),
        }
    }
}

impl std::error::Error for CliError {}

/// `--seed` value parser: plain decimal, or `0x` followed by at most 16 hex digits.
pub fn parse_seed(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };
    if digits.is_empty() {
        return Err(format!("seed {raw:?} has no digits"));
    }
    if radix == 16 && digits.len() > 16 {
        return Err(format!("seed {raw:?} is wider than 64 bits"));
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("seed {raw:?} is not a base-{radix} number"));
    }
    u64::from_str_radix(digits, radix).map_err(|e| format!("seed {raw:?}: {e}"))
}

/// `scheme:` prefixes we refuse; Windows drive letters (`C:`) are one char and pass.
fn has_scheme(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.contains("://") {
        return true;
    }
    match raw.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(raw) if has_scheme(raw) => Err(CliError::NonLocalPath(raw.to_owned())),
        _ => Ok(()),
    }
}

fn ensure_file(p: &Path, flag: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    if p.is_file() {
        Ok(())
    } else {
        Err(CliError::NotFound(format!("{flag} {}", p.display())))
    }
}

/// Canonical form when the path exists, otherwise anchored at the working directory.
fn normalize_path(p: &Path) -> PathBuf {
    if let Ok(real) = fs::canonicalize(p) {
        return real;
    }
    if p.is_absolute() {
        return p.to_path_buf();
    }
    env::current_dir().map(|cwd| cwd.join(p)).unwrap_or_else(|_| p.to_path_buf())
}

/// Parse `std::env::args` and apply the cross-flag rules.
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

pub(crate) fn validate(args: Args) -> Result<Args, CliError> {
    let paths = [args.input.as_deref(), args.cells.as_deref(), args.params.as_deref(), Some(args.out.as_path())];
    paths.into_iter().flatten().try_for_each(ensure_local_path)?;

    match (args.input.as_deref(), args.cells.as_deref()) {
        (Some(request), None) => ensure_file(request, "--input")?,
        (None, Some(cells)) if args.total.is_some() || args.is_edit() => ensure_file(cells, "--cells")?,
        (None, Some(_)) => return Err(CliError::Missing("--total, --duplicate or --delete (with --cells)")),
        _ => return Err(CliError::InputChoice),
    }
    if let Some(params) = args.params.as_deref() {
        ensure_file(params, "--params")?;
    }

    Ok(Args {
        input: args.input.as_deref().map(normalize_path),
        cells: args.cells.as_deref().map(normalize_path),
        params: args.params.as_deref().map(normalize_path),
        out: normalize_path(&args.out),
        ..args
    })
}
