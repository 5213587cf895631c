use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(Debug, Clone)]
pub struct DirCfg {
    pub search_dirs: Vec<PathBuf>,

    // lowercase, without the leading dot
    pub extensions: Vec<OsString>,
}

#[derive(Debug, Clone)]
pub struct CacheCfg {
    pub cache_path: PathBuf,
    pub ignore_path: PathBuf,
    pub reset_analysis: bool,
    pub no_update_cache: bool,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub dir_cfg: DirCfg,
    pub cache_cfg: CacheCfg,

    pub trash_dir: PathBuf,
    pub threshold: f64,

    pub update_cache_only: bool,
    pub verbosity: ReportVerbosity,
}
