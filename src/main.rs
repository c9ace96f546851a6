use clap::Parser;
use color_eyre::Result;
use contentplanner::{Config, Profile, cli::{self, Cli, Commands}, logging, store};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev switches to the separate dev config and data directories
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path, profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = logging::init(&config.get_log_path(), &config.log_level, cli.verbose)?;

    let backend = cli.backend.unwrap_or(config.backend);
    tracing::info!(backend = backend.as_str(), "starting contentplanner");
    let mut store = store::open_store(&config, backend)?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = contentplanner::tui::App::new(config, store)?;
            contentplanner::tui::run_event_loop(app)?;
        }
        Commands::Add { title, post } => {
            cli::handle_add(title, post, store.as_mut())?;
        }
        Commands::List { json } => {
            cli::handle_list(json, store.as_ref())?;
        }
        Commands::Show { title } => {
            cli::handle_show(&title, store.as_ref())?;
        }
        Commands::Update { target, title, post } => {
            cli::handle_update(target, title, post, store.as_mut())?;
        }
        Commands::Delete { title } => {
            cli::handle_delete(title, store.as_mut())?;
        }
        Commands::Export { format, output } => {
            cli::handle_export(format, output, &config, store.as_ref())?;
        }
        Commands::Import { path } => {
            cli::handle_import(path, store.as_mut())?;
        }
        Commands::Sync { to, from } => {
            cli::handle_sync(to, from, &config, store.as_mut())?;
        }
    }

    Ok(())
}
