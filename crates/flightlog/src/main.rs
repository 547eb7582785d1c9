//! `flightlog` - CLI for the drone flight logbook
//!
//! This binary runs the web API, imports CSV files and manages the property
//! catalog and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use flightlog::cli::{Cli, Command, ConfigCommand, ImportCommand, PropertyCommand, ServeCommand};
use flightlog::import::Importer;
use flightlog::properties::{NewPropertyDefinition, PropertyCodec};
use flightlog::{init_logging, Config, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, &serve_cmd),
        Command::Import(import_cmd) => handle_import(&config, &import_cmd),
        Command::Property(property_cmd) => handle_property(&config, property_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("cannot open logbook {}", path.display()))
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = &cmd.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let storage = open_storage(&config)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(flightlog::api::serve(&config, storage))
}

fn handle_import(config: &Config, cmd: &ImportCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let codec = PropertyCodec::from_config(&config.values)?;
    let importer = Importer::new(&storage, &codec, &config.import);

    let report = importer.import_file(&cmd.file, cmd.options())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let verb = if report.dry_run { "Checked" } else { "Imported" };
    println!(
        "{verb} {}: {} of {} rows OK",
        report.file_name, report.rows_accepted, report.rows_read
    );
    for failure in &report.failures {
        println!("  line {}: {}", failure.line, failure.error);
    }
    if report.dry_run {
        println!("Dry run: nothing was written.");
    }
    Ok(())
}

fn handle_property(config: &Config, cmd: PropertyCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        PropertyCommand::Add { name, data_type } => {
            let property =
                storage.insert_property(&NewPropertyDefinition::new(name, data_type.into()))?;
            println!(
                "Added property {} '{}' ({})",
                property.id, property.name, property.data_type
            );
        }
        PropertyCommand::List { json } => {
            let properties = storage.list_properties()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&properties)?);
            } else if properties.is_empty() {
                println!("No flight properties defined.");
            } else {
                println!("{:>4}  {:<8}  Name", "ID", "Type");
                for property in properties {
                    println!(
                        "{:>4}  {:<8}  {}",
                        property.id,
                        property.data_type.to_string(),
                        property.name
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("flightlog status");
        println!("----------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Operators:     {}", stats.operators);
        println!("Drones:        {}", stats.drones);
        println!("Flights:       {}", stats.flights);
        println!("Properties:    {}", stats.properties);
        println!("Users:         {}", stats.users);
        match stats.last_flight {
            Some(start) => println!("Last flight:   {start}"),
            None => println!("Last flight:   -"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!(
                    "  Request timeout:    {}s",
                    config.server.request_timeout_secs
                );
                println!();
                println!("[Values]");
                println!(
                    "  Date formats:       {}",
                    config.values.date_formats.join(" | ")
                );
                println!();
                println!("[Import]");
                println!("  Delimiter:          {:?}", config.import.delimiter);
                println!(
                    "  Columns:            {}",
                    config.import.reserved_columns().join(", ")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
