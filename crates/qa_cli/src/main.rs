// crates/qa_cli/src/main.rs
//
// exit codes → logging → params → (validate-only | run) → artifacts → reports.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const IO: i32 = 4;
    pub const ALLOCATION: i32 = 5;
}

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::{parse_and_validate as parse_cli, Args, IdsArg, ModeArg};

use qa_core::{AllocationMode, AllocationRequest, CellId, EngineParams, IdSource, QuotaCell, SeededIds, SequentialIds};
use qa_io::{canonical_json, loader};
use qa_pipeline::{
    load_params_opt, run_edit, run_redistribute, run_request, validate_cells, validate_request, AllocationDoc, CellEdit,
    PipelineError,
};
use qa_report::{build_model, render_text, ReportError};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Schema / JSON shape / domain / structural failures
    Validation(String),
    /// Referenced cell id absent
    NotFound(String),
    /// read/write/path/limits
    Io(String),
    /// Allocation or document build failure
    Allocation(String),
    /// Report build or output
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::NotFound(m) => write!(f, "not found: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Allocation(m) => write!(f, "allocation: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("quota: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(&args);

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("quota: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// stderr subscriber. `--log-level` beats `RUST_LOG`, which beats the default.
fn init_tracing(args: &Args) {
    let default = if args.quiet { "warn" } else { "info" };
    let filter = match &args.log_level {
        Some(spec) => EnvFilter::try_new(spec).unwrap_or_else(|_| EnvFilter::new(default)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::NotFound(_) => NOT_FOUND,
        MainError::Io(_) | MainError::Render(_) => IO,
        MainError::Allocation(_) => ALLOCATION,
    }
}

fn map_qaio_err(e: qa_io::IoError) -> MainError {
    map_pipeline_err(e.into())
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Schema(m) | Validate(m) => MainError::Validation(m),
        NotFound(m) => MainError::NotFound(m),
        Io(m) => MainError::Io(m),
        Allocate(m) | Build(m) => MainError::Allocation(m),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

// ----------------------------- Inputs -----------------------------

fn load_params(args: &Args) -> Result<EngineParams, MainError> {
    let lp = load_params_opt(args.params.as_deref(), args.seed).map_err(map_pipeline_err)?;
    if lp.from_file {
        tracing::info!(path = ?args.params, "params loaded");
    }
    Ok(lp.params)
}

/// Request from --input with --total / --mode overrides applied.
fn load_request(path: &Path, args: &Args) -> Result<AllocationRequest, MainError> {
    let mut req = loader::load_request(path).map_err(map_qaio_err)?;
    if let Some(t) = args.total {
        req.total_target = t;
    }
    if let Some(m) = args.mode {
        req.mode = match m {
            ModeArg::Even => AllocationMode::Even,
            ModeArg::Census => AllocationMode::Census,
        };
    }
    Ok(req)
}

fn make_ids(args: &Args, params: &EngineParams) -> Box<dyn IdSource> {
    match args.ids {
        IdsArg::Seeded => Box::new(SeededIds::from_seed_u64(params.id_seed)),
        IdsArg::Sequential => Box::new(SequentialIds::new()),
    }
}

/// `--duplicate` / `--delete` as a typed edit.
fn cell_edit(args: &Args) -> Result<Option<CellEdit>, MainError> {
    let parse = |raw: &str| {
        raw.parse::<CellId>().map_err(|e| MainError::Validation(format!("cell id {raw:?}: {e}")))
    };
    match (args.duplicate.as_deref(), args.delete.as_deref()) {
        (Some(id), _) => Ok(Some(CellEdit::Duplicate(parse(id)?))),
        (None, Some(id)) => Ok(Some(CellEdit::Delete(parse(id)?))),
        (None, None) => Ok(None),
    }
}

/// Total for a --cells run: the flag, else the set's current allocated sum.
fn cells_total(args: &Args, cells: &[QuotaCell]) -> i64 {
    args.total.unwrap_or_else(|| cells.iter().map(|c| i64::from(c.target)).sum())
}

// ----------------------------- Validate-only -----------------------------

fn validate_only(args: &Args) -> Result<(), MainError> {
    let params = load_params(args)?;
    if let Some(input) = &args.input {
        let req = load_request(input, args)?;
        let check = validate_request(&req, &params).map_err(map_pipeline_err)?;
        tracing::info!(combinations = check.combinations, total_target = check.total_target, "validate-only: inputs OK");
    } else if let Some(cells) = &args.cells {
        let cells = loader::load_cells(cells).map_err(map_qaio_err)?;
        if let Some(CellEdit::Duplicate(id) | CellEdit::Delete(id)) = cell_edit(args)? {
            if !cells.iter().any(|c| c.id == id) {
                return Err(MainError::NotFound(format!("quota cell {id}")));
            }
        }
        let total = validate_cells(&cells, cells_total(args, &cells)).map_err(map_pipeline_err)?;
        tracing::info!(cells = cells.len(), total_target = total, "validate-only: inputs OK");
    }
    Ok(())
}

// ----------------------------- Run -----------------------------

fn run_once(args: &Args) -> Result<(), MainError> {
    let params = load_params(args)?;

    let doc = if let Some(input) = &args.input {
        let req = load_request(input, args)?;
        let mut ids = make_ids(args, &params);
        run_request(&req, &params, ids.as_mut()).map_err(map_pipeline_err)?
    } else if let Some(cells_path) = &args.cells {
        let cells = loader::load_cells(cells_path).map_err(map_qaio_err)?;
        match cell_edit(args)? {
            Some(edit) => {
                let mut ids = make_ids(args, &params);
                run_edit(&cells, &edit, args.total, &params, ids.as_mut()).map_err(map_pipeline_err)?
            }
            None => run_redistribute(&cells, cells_total(args, &cells), &params).map_err(map_pipeline_err)?,
        }
    } else {
        return Err(MainError::Validation("exactly one of --input or --cells is required".into()));
    };

    write_artifacts(&args.out, &doc)?;
    maybe_render_reports(args, &doc)?;
    tracing::info!(out = %args.out.display(), cells = doc.cells.len(), sha256 = %doc.allocation_sha256, "artifacts written");
    Ok(())
}

fn write_artifacts(out_dir: &Path, doc: &AllocationDoc) -> Result<(), MainError> {
    let path = out_dir.join("allocation.json");
    canonical_json::write_canonical_file(doc, &path).map_err(|e| MainError::Io(format!("write allocation.json: {e}")))
}

fn maybe_render_reports(args: &Args, doc: &AllocationDoc) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }
    let doc_val = serde_json::to_value(doc).map_err(|e| MainError::Render(format!("allocation to JSON: {e}")))?;
    let model = build_model(&doc_val).map_err(map_report_err)?;

    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(&model, &args.out)?,
            "text" => {
                let text = render_text(&model).map_err(map_report_err)?;
                canonical_json::write_bytes_atomic(&args.out.join("report.txt"), text.as_bytes())
                    .map_err(|e| MainError::Io(format!("write report.txt: {e}")))?;
            }
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

fn render_json_report(model: &qa_report::ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let json = qa_report::render_json(model).map_err(map_report_err)?;
        canonical_json::write_bytes_atomic(&out_dir.join("report.json"), json.as_bytes())
            .map_err(|e| MainError::Io(format!("write report.json: {e}")))
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}
