use std::{ffi::OsString, path::PathBuf};

use clap::{value_parser, ArgAction::*};

use crate::app::*;

// file selection
const SEARCH_PATHS: &str = "Directories to search";
const EXTENSIONS: &str = "Video file extensions";

// search configuration
const THRESHOLD: &str = "Match threshold";

// cache settings
const CACHE_FILE: &str = "Cache file path";
const IGNORE_FILE: &str = "Ignore list path";
const RESET_ANALYSIS: &str = "Discard all cached analysis and dismissals";
const NO_UPDATE_CACHE: &str = "Do not update the cache. Search using already-cached data";
const UPDATE_CACHE_ONLY: &str = "Update cache only. Do not resolve duplicates";

// resolution settings
const TRASH_DIR: &str = "Trash directory";

// verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 11] = [
    SEARCH_PATHS,
    EXTENSIONS,
    THRESHOLD,
    CACHE_FILE,
    IGNORE_FILE,
    RESET_ANALYSIS,
    NO_UPDATE_CACHE,
    UPDATE_CACHE_ONLY,
    TRASH_DIR,
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

const DEFAULT_EXTENSIONS: [&str; 7] = ["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm"];

fn build_app() -> clap::Command {
    let get_ordering = |arg_name: &str| -> usize {
        match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
            Some(idx) => idx,
            None => {
                panic!("argument not assigned a display order: {arg_name:?}");
            }
        }
    };

    //clap requires default values as strings.
    let default_threshold_string = vidsweep_core::DEFAULT_MATCH_THRESHOLD.to_string();

    let mut clap_app = clap::Command::new("vidsweep")
        .version(clap::crate_version!())
        .about("Find near-duplicate video files and resolve them interactively");

    clap_app = clap_app.arg(
        clap::Arg::new(SEARCH_PATHS)
            .long("files")
            .required(true)
            .num_args(1..)
            .value_parser(value_parser!(PathBuf))
            .action(Append)
            .help("Directories to scan recursively for video files. Every file found is checked for near-duplicates against every other.")
            .display_order(get_ordering(SEARCH_PATHS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(EXTENSIONS)
            .long("exts")
            .num_args(1..)
            .value_parser(value_parser!(OsString))
            .action(Append)
            .help("File extensions treated as video, without the leading dot. Matching is case insensitive.")
            .default_values(DEFAULT_EXTENSIONS)
            .display_order(get_ordering(EXTENSIONS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(THRESHOLD)
            .long("threshold")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .default_value(default_threshold_string)
            .help("Similarity score above which two files are considered duplicates, from 0.0 to 1.0.")
            .display_order(get_ordering(THRESHOLD)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CACHE_FILE)
            .long("cache-file")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where fingerprints are cached between runs. Defaults to the platform cache directory.")
            .display_order(get_ordering(CACHE_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(IGNORE_FILE)
            .long("ignore-file")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where dismissed duplicate groups are recorded. Defaults to the platform cache directory.")
            .display_order(get_ordering(IGNORE_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(RESET_ANALYSIS)
            .long("reset-analysis")
            .num_args(0)
            .action(SetTrue)
            .help("Delete the fingerprint cache and the ignore list before scanning, forcing a full re-analysis.")
            .display_order(get_ordering(RESET_ANALYSIS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(NO_UPDATE_CACHE)
            .long("no-update-cache")
            .num_args(0)
            .action(SetTrue)
            .help("Skip fingerprinting and group only what is already cached.")
            .display_order(get_ordering(NO_UPDATE_CACHE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(UPDATE_CACHE_ONLY)
            .long("update-cache-only")
            .num_args(0)
            .action(SetTrue)
            .help("Fingerprint everything and exit without the interactive resolution step.")
            .display_order(get_ordering(UPDATE_CACHE_ONLY)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(TRASH_DIR)
            .long("trash-dir")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where trashed files are moved, recoverably. Defaults to .vidsweep_trash under the first search directory.")
            .display_order(get_ordering(TRASH_DIR)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .num_args(0)
            .action(SetTrue)
            .conflicts_with(VERBOSITY_VERBOSE)
            .help("Only warnings and errors are logged.")
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .num_args(0)
            .action(SetTrue)
            .help("Log everything.")
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    args_to_cfg(&build_app().get_matches())
}

fn args_to_cfg(matches: &clap::ArgMatches) -> AppCfg {
    let search_dirs = matches
        .get_many::<PathBuf>(SEARCH_PATHS)
        .into_iter()
        .flatten()
        .cloned()
        .collect::<Vec<_>>();

    let extensions = matches
        .get_many::<OsString>(EXTENSIONS)
        .into_iter()
        .flatten()
        .map(|ext| ext.to_ascii_lowercase())
        .collect::<Vec<_>>();

    let (default_cache_path, default_ignore_path) = default_store_paths();
    let cache_path = matches
        .get_one::<PathBuf>(CACHE_FILE)
        .cloned()
        .unwrap_or(default_cache_path);
    let ignore_path = matches
        .get_one::<PathBuf>(IGNORE_FILE)
        .cloned()
        .unwrap_or(default_ignore_path);

    let trash_dir = matches
        .get_one::<PathBuf>(TRASH_DIR)
        .cloned()
        .unwrap_or_else(|| search_dirs[0].join(".vidsweep_trash"));

    let verbosity = if matches.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if matches.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    AppCfg {
        dir_cfg: DirCfg {
            search_dirs,
            extensions,
        },
        cache_cfg: CacheCfg {
            cache_path,
            ignore_path,
            reset_analysis: matches.get_flag(RESET_ANALYSIS),
            no_update_cache: matches.get_flag(NO_UPDATE_CACHE),
        },
        trash_dir,
        threshold: *matches
            .get_one::<f64>(THRESHOLD)
            .unwrap_or(&vidsweep_core::DEFAULT_MATCH_THRESHOLD),
        update_cache_only: matches.get_flag(UPDATE_CACHE_ONLY),
        verbosity,
    }
}

fn default_store_paths() -> (PathBuf, PathBuf) {
    let base = match directories_next::ProjectDirs::from("", "", "vidsweep") {
        Some(dirs) => dirs.cache_dir().to_path_buf(),
        None => PathBuf::from(".vidsweep"),
    };
    (base.join("fingerprints.bin"), base.join("ignored.json"))
}
