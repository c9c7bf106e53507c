//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler,
//! plans the reorganization of ROOT from the track manifest and executes it
//! (or only prints it on --dry-run).

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use tagdir::cli::Args;
use tagdir::config::{
    default_config_path, ensure_default_config_exists, load_config_from_default_xml,
    load_config_from_xml_env, Config, CONFIG_ENV,
};
use tagdir::fs_ops::StdDirectoryOps;
use tagdir::manifest::{scan_tracks, TagTable};
use tagdir::output as out;
use tagdir::rename::{ActionExecutor, ActionKind, ActionPlanner};
use tagdir::shutdown::AbortFlag;

use crate::logging::init_tracing;

/// Exit status used when the run was interrupted (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default tagdir config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        None => out::print_error("Could not determine a default config path."),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut cfg = match load_config_from_xml_env()? {
        Some(cfg) => cfg,
        None => load_config_from_default_xml()?.unwrap_or_default(),
    };
    args.apply_overrides(&mut cfg);
    Ok(cfg)
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(path) = ensure_default_config_exists() {
        out::print_success(&format!("A template tagdir config was written to: {}", path.display()));
        out::print_info(&format!("Edit it to change the default format and mode. To use a different location set {CONFIG_ENV}."));
    }

    let mut cfg = load_config(&args)?;

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    let abort = AbortFlag::new();
    {
        let guard_slot = Arc::clone(&guard_slot);
        let abort = abort.clone();
        ctrlc::set_handler(move || {
            abort.request();
            out::print_warn("Received interrupt; stopping after the current step...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install Ctrl-C handler")?;
    }

    debug!("Starting tagdir: {:?}", args);

    let result = reorganize(&args, &mut cfg, &abort);

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn reorganize(args: &Args, cfg: &mut Config, abort: &AbortFlag) -> Result<ExitCode> {
    cfg.validate()?;
    let manifest = args.manifest_path(&cfg.root);
    let tags = TagTable::load(&manifest, &cfg.root)?;
    let tracks = scan_tracks(&cfg.root);
    info!(
        root = %cfg.root.display(),
        manifest = %manifest.display(),
        tracks = tracks.len(),
        tagged = tags.len(),
        "planning reorganization"
    );

    let ops = StdDirectoryOps::new();
    let log = {
        let mut planner = ActionPlanner::new(&ops, cfg.format.clone(), cfg.mode)
            .with_abort_flag(abort.clone())
            .on_scheduled(out::print_action);
        for track in &tracks {
            if !planner.schedule(track, &tags) {
                break;
            }
        }
        if planner.is_aborted() {
            error!(code = 130u16, kind = "interrupted", "planning aborted by user");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
        planner.finalize();
        planner.take_log()
    };

    if log.is_empty() {
        out::print_success("Nothing to do; the layout already matches the format.");
        return Ok(ExitCode::SUCCESS);
    }

    if cfg.dry_run {
        let errors = log.iter().filter(|a| a.kind() == ActionKind::ReportError).count();
        out::print_info(&format!(
            "Dry-run: {} action(s) planned, {errors} error(s); nothing was changed.",
            log.len()
        ));
        return Ok(if errors == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let mut executor = ActionExecutor::new(&ops)
        .with_abort_flag(abort.clone())
        .with_current_dir(cfg.root.clone());
    let report = executor.run(log);
    out::print_report(&report);
    info!(
        applied = report.applied,
        failed = report.failures.len(),
        aborted = report.aborted,
        "reorganization finished"
    );

    if report.aborted {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if report.failures.is_empty() {
        out::print_success(&format!("Applied {} action(s).", report.applied));
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
