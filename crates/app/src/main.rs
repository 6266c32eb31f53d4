use std::fs;

use anyhow::Context as _;
use directories::ProjectDirs;
use shelfdeck_application::AppContext;
use shelfdeck_core::Settings;
use shelfdeck_storage::Storage;
use shelfdeck_ui::Ui;

mod logging;

const BACKEND_URL_ENV: &str = "SHELFDECK_BACKEND_URL";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "shelfdeck", "shelfdeck").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    let data_dir = project_dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    logging::init(data_dir)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "shelfdeck starting");

    let storage = Storage::open(config_dir.join("shelfdeck.db"))?;
    let mut settings = storage.load_settings()?;
    let stored_url = settings.backend_url.clone();
    apply_env_overrides(&mut settings, std::env::var(BACKEND_URL_ENV).ok());
    tracing::info!(backend = %settings.backend_url, "settings loaded");

    let resume_points = storage.list_resume_points()?;
    let ctx = AppContext::new(settings).with_resume_points(resume_points);

    let mut ui = Ui::new(ctx)?;
    let outcome = ui.run()?;
    let mut ctx = outcome.ctx;

    ctx.settings.backend_url = stored_url;
    storage.save_settings(&ctx.settings)?;
    for (key, item_id) in ctx.take_dirty_resume_points() {
        storage.set_resume_point(key, &item_id)?;
    }
    tracing::info!("shelfdeck exiting");
    Ok(())
}

/// The override is used for this session only and is never written back.
fn apply_env_overrides(settings: &mut Settings, backend_url: Option<String>) {
    if let Some(url) = backend_url.filter(|url| !url.trim().is_empty()) {
        settings.backend_url = url;
    }
    settings.normalize();
}
