//! LOAD stage helpers: params with defaults and CLI-style overrides.

use std::path::Path;

use qa_core::EngineParams;
use qa_io::loader;

use crate::PipelineError;

/// Params plus where they came from (for logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedParams {
    pub params: EngineParams,
    pub from_file: bool,
}

/// Load params from `path` if given, else defaults; then apply `seed_override`.
pub fn load_params_opt(path: Option<&Path>, seed_override: Option<u64>) -> Result<LoadedParams, PipelineError> {
    let (mut params, from_file) = match path {
        Some(p) => (loader::load_params(p)?, true),
        None => (EngineParams::default(), false),
    };
    if let Some(seed) = seed_override {
        params.id_seed = seed;
    }
    tracing::debug!(from_file, id_seed = params.id_seed, max_cells = params.max_cells, "engine params ready");
    Ok(LoadedParams { params, from_file })
}
