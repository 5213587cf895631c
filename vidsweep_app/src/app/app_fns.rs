use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use vidsweep_cache::{FingerprintCache, IgnoreList};
use vidsweep_core::{DuplicateGrouper, FeatureExtractor};

use crate::app::file_walk::find_video_files;
use crate::app::resolution::RunSummary;
use crate::app::*;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity);

    match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(&fatal_error, cfg.verbosity);
            1
        }
    }
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let missing_dirs = cfg
        .dir_cfg
        .search_dirs
        .iter()
        .filter(|d| !d.exists())
        .collect::<Vec<_>>();
    if !missing_dirs.is_empty() {
        return Err(eyre::Report::msg(format!(
            "search dirs not found: {}",
            missing_dirs.iter().map(|p| p.to_string_lossy()).join(", ")
        )));
    }

    if cfg.cache_cfg.reset_analysis {
        reset_stores(&cfg.cache_cfg)?;
    }

    let cache = FingerprintCache::load(&cfg.cache_cfg.cache_path)?;
    let ignore_list = IgnoreList::load(&cfg.cache_cfg.ignore_path)?;

    let files = find_video_files(&cfg.dir_cfg.search_dirs, &cfg.dir_cfg.extensions);
    info!("found {} candidate video files", files.len());

    if !cfg.cache_cfg.no_update_cache {
        update_fingerprint_cache(&cache, files.clone())?;
        cache.purge_missing()?;
        cache.save()?;
    }

    if cfg.update_cache_only {
        return Ok(());
    }

    // Restrict grouping to this run's walked set; the cache may hold
    // fingerprints for files outside the search dirs from earlier runs.
    let file_set: BTreeSet<PathBuf> = files.into_iter().collect();
    let fingerprints = cache
        .all_fingerprints()
        .into_iter()
        .filter(|(path, _)| file_set.contains(path))
        .collect();

    let groups =
        DuplicateGrouper::default().group(&fingerprints, cfg.threshold, &ignore_list.snapshot());
    info!(
        "{} duplicate groups at threshold {}",
        groups.len(),
        cfg.threshold
    );
    if groups.is_empty() {
        return Ok(());
    }

    let trash = TrashDir::new(cfg.trash_dir.clone());
    let workflow = ResolutionWorkflow::new(&trash, &ignore_list);
    let mut prompt = ConsolePrompt::new();
    let summary = workflow.run(&groups, &fingerprints, &mut prompt)?;

    // Trashed files leave dead cache entries behind; drop them now so the
    // next run starts clean.
    cache.purge_missing()?;
    cache.save()?;

    report_summary(&summary);
    Ok(())
}

fn update_fingerprint_cache(cache: &FingerprintCache, files: Vec<PathBuf>) -> eyre::Result<()> {
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} {wide_msg}",
    )?);

    let extractor = FeatureExtractor::default();
    let errors = cache.refresh_all(&extractor, files, &|src_path: &Path| {
        bar.set_message(src_path.display().to_string());
        bar.inc(1);
    });
    bar.finish_and_clear();

    for (path, e) in &errors {
        warn!("could not fingerprint {}: {e}", path.display());
    }
    if !errors.is_empty() {
        info!(
            "{} files could not be fingerprinted and are excluded from this run",
            errors.len()
        );
    }

    Ok(())
}

fn reset_stores(cache_cfg: &CacheCfg) -> eyre::Result<()> {
    for path in [&cache_cfg.cache_path, &cache_cfg.ignore_path] {
        match std::fs::remove_file(path) {
            Ok(()) => info!("removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(eyre::Report::new(e)),
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn report_summary(summary: &RunSummary) {
    println!(
        "\n{} groups presented: {} files trashed ({} reclaimed), {} groups ignored, {} skipped",
        summary.groups_presented,
        summary.files_trashed,
        ByteSize(summary.bytes_reclaimed),
        summary.groups_ignored,
        summary.groups_skipped,
    );
    if summary.trash_failures > 0 {
        println!(
            "{} files could not be trashed and were left in place",
            summary.trash_failures
        );
    }
    if summary.aborted {
        println!("session ended early; unseen groups will return next run");
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        cfg.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
