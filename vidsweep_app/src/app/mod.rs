mod app_cfg;
mod app_fns;
mod arg_parse;
mod errors;
mod file_walk;
mod prompt;
mod resolution;
mod trash;

pub(crate) use app_cfg::*;
pub(crate) use errors::*;

use prompt::ConsolePrompt;
use resolution::ResolutionWorkflow;
use trash::TrashDir;

pub use app_fns::run_app;
