use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use datadash::export::export_dashboard;
use datadash::{
    logging, server, AppConfig, Args, Command, ConfigManager, LoadOptions, Registry, Selection,
    APP_NAME,
};
use datadash_cli::{ExportArgs, ServeArgs};
use std::net::SocketAddr;
use tracing::info;

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Configuration written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config file: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(APP_NAME)?,
    };
    config.apply_args(args);
    if let Some(Command::Serve(serve)) = &args.command {
        config.apply_serve_args(serve);
    }
    config.validate()?;
    Ok(config)
}

async fn run_serve(config: &AppConfig, registry: Registry) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            eyre!(
                "Invalid server address {}:{}: {}",
                config.server.host,
                config.server.port,
                e
            )
        })?;
    info!(%addr, "starting server");
    server::serve(addr, registry).await
}

fn run_export(registry: &Registry, export: &ExportArgs) -> Result<()> {
    let id = export.dashboard.as_str();
    let dashboard = registry.get(id).ok_or_else(|| {
        eyre!(
            "Dashboard '{}' has no dataset. Pass its CSV path on the command line or in the config file",
            id
        )
    })?;
    let selection = Selection::parse(export.country.as_deref());
    let summary = export_dashboard(dashboard.as_ref(), &selection, &export.out)?;
    for path in &summary.svg_files {
        println!("{}", path.display());
    }
    println!("{}", summary.panels_json.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = load_config(&args)?;
    logging::init(&config.logging)?;

    let options = LoadOptions::from_args_and_config(&args, &config);
    // Every dataset is loaded before the server binds.
    let registry = Registry::load(&config, &options)?;

    let command = args
        .command
        .clone()
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));
    match command {
        Command::Serve(_) => run_serve(&config, registry).await,
        Command::Export(export) => tokio::task::block_in_place(|| run_export(&registry, &export)),
    }
}
