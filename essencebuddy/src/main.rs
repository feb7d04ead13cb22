//! EssenceBuddy.
//!
//! Watches the game window for an essence's stat lines and reports which
//! weapons accept that combination.

mod alert;
mod capture;
mod config;
mod poll;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file to use instead of the per-user one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print per-cycle diagnostics.
    #[arg(long)]
    debug: bool,

    /// Dump every capture into the debug directory.
    #[arg(long)]
    save_images: bool,

    /// Run a single read cycle and exit.
    #[arg(long)]
    once: bool,

    /// Write the loaded weapon catalog as JSON and exit (`-` for stdout).
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut cfg = Config::load_or_default(args.config.as_deref());
    cfg.log_debug |= args.debug;
    cfg.save_images |= args.save_images;

    let data_dir = util::assets::resolve_data_dir(&cfg.data_dir);
    let catalog = load_catalog(&data_dir);

    if let Some(path) = args.export {
        if path.as_os_str() == "-" {
            println!("{}", catalog.to_json()?);
            return Ok(());
        }
        catalog.save_json(&path).with_context(|| format!("export catalog to {:?}", path))?;
        println!("exported {} weapons to {}", catalog.len(), path.display());
        return Ok(());
    }

    let mut pipeline = build_pipeline(&cfg, &data_dir)?;

    if args.once {
        match poll::cycle(&mut pipeline, &catalog)? {
            Some(_) => alert::chime(),
            None => println!("no match"),
        }
        if cfg.log_debug
            && let Some(result) = pipeline.last_result()
        {
            result.logs.iter().for_each(|line| println!("{line}"));
        }
        return Ok(());
    }

    // Paused until the user asks for the first read.
    let toggle = poll::Toggle::default();
    toggle.watch_stdin();
    println!("[paused] watching {:?}; press Enter to toggle", cfg.window_title);

    poll::run(
        pipeline,
        &catalog,
        toggle,
        Duration::from_millis(cfg.poll_delay_ms),
        cfg.log_debug,
    )
}

fn load_catalog(data_dir: &std::path::Path) -> data::StatCatalog {
    let path = data_dir.join("weapons.json");
    match data::StatCatalog::load_json(&path) {
        Ok(catalog) => {
            tracing::info!(weapons = catalog.len(), path = %path.display(), "catalog loaded");
            catalog
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "no weapon catalog; every lookup will miss");
            data::StatCatalog::default()
        }
    }
}

fn build_pipeline(cfg: &Config, data_dir: &std::path::Path) -> Result<ie::LookupPipeline> {
    let assets = util::assets::resolve_ocr_assets("latin")?;
    let ocr = ie::Ocr::try_new(&assets.detection, &assets.recognition, &assets.charset)?;

    let layouts = ie::default_layouts();
    let guard = ie::MenuGuard::load(cfg.guard_mode, data_dir, &layouts);

    let cache = if cfg.use_stat_cache || cfg.create_stat_cache {
        ie::StatCache::load(data_dir.join("matched")).context("load stat cache")?
    } else {
        ie::StatCache::in_memory()
    };
    tracing::info!(cached = cache.len(), "stat cache ready");
    let classifier = ie::StatClassifier::new(cache, cfg.use_stat_cache, cfg.create_stat_cache);

    let sampler = ie::RegionSampler::new(
        cfg.window_title.clone(),
        Box::new(capture::XcapWindows),
        Box::new(capture::XcapGrabber),
    );

    Ok(ie::LookupPipeline::new(
        cfg.pipeline_config(data_dir),
        layouts,
        sampler,
        guard,
        classifier,
        Box::new(ocr),
    ))
}
