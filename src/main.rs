use anyhow::{Context, Result};
use epoxi::cli::args::{java_runtime, rotation_time};
use epoxi::cli::{Args, Commands, ConfigDiscovery, FleetConfig, ModpackCommand, ServerCommand};
use epoxi::container::DockerRuntime;
use epoxi::fleet::{Fleet, NewServer};
use epoxi::notify;
use epoxi::schema::Modpack;
use epoxi::store::JsonFileStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "epoxi=debug" } else { "epoxi=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match args.command {
        Commands::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
        Commands::InitConfig => {
            let path = ConfigDiscovery::create_default_user_config()?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
        command => {
            let config = ConfigDiscovery::load(args.config.as_deref())?;
            run(command, &config).await
        }
    }
}

async fn connect(config: &FleetConfig) -> Result<Fleet> {
    let runtime = DockerRuntime::with_config(config.runtime_config())
        .await
        .context("Failed to connect to the container runtime")?;
    let store = JsonFileStore::open(&config.store.path)
        .await
        .with_context(|| format!("Failed to open store {}", config.store.path.display()))?;
    let notifier = notify::from_config(&config.notifications)?;

    Ok(Fleet::new(
        Arc::new(runtime),
        Arc::new(store),
        notifier,
        config.fleet_options(),
    ))
}

async fn run(command: Commands, config: &FleetConfig) -> Result<()> {
    let fleet = connect(config).await?;

    match command {
        Commands::Modpack(ModpackCommand::Add {
            id,
            startup_script,
            java,
        }) => {
            let modpack = fleet
                .register_modpack(Modpack {
                    id,
                    startup_script,
                    java_runtime: java_runtime(java),
                })
                .await?;
            println!("Registered modpack {} ({})", modpack.id, modpack.java_runtime);
        }
        Commands::Modpack(ModpackCommand::List) => {
            for modpack in fleet.list_modpacks().await? {
                println!(
                    "{}\t{}\t{}",
                    modpack.id, modpack.java_runtime, modpack.startup_script
                );
            }
        }
        Commands::Modpack(ModpackCommand::Remove { id }) => {
            fleet.delete_modpack(&id).await?;
            println!("Deleted modpack {}", id);
        }
        Commands::Server(ServerCommand::Add {
            id,
            name,
            startup_script,
            java,
            hostname,
            season,
        }) => {
            let server = fleet
                .register_server(NewServer {
                    id,
                    name,
                    startup_script,
                    java_runtime: java_runtime(java),
                    proxy_hostname: hostname,
                    initial_season: season,
                })
                .await?;
            println!(
                "Registered server {} at season {}",
                server.id, server.current_season
            );
        }
        Commands::Server(ServerCommand::List) => {
            for server in fleet.list_servers().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    server.id, server.name, server.current_season, server.proxy_hostname
                );
            }
        }
        Commands::Server(ServerCommand::Remove { id }) => {
            fleet.delete_server(&id).await?;
            println!("Deleted server {}", id);
        }
        Commands::Server(ServerCommand::SetHostname { id, hostname }) => {
            let server = fleet.update_hostname(&id, &hostname).await?;
            println!("Server {} now at {:?}", server.id, server.proxy_hostname);
        }
        Commands::Create { server } => {
            let id = fleet.create(&server).await?;
            println!("Created container {}", id);
        }
        Commands::Start { server } => {
            fleet.start(&server).await?;
            println!("Started {}", server);
        }
        Commands::Stop { server } => {
            let outcome = fleet.stop(&server).await?;
            println!("Stopped {} ({:?})", server, outcome);
        }
        Commands::Remove { server } => {
            fleet.remove(&server).await?;
            println!("Removed container of {}", server);
        }
        Commands::Status { server } => {
            let statuses = match server {
                Some(id) => vec![fleet.status(&id).await?],
                None => fleet.status_all().await?,
            };
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
        Commands::Rotate {
            server,
            modpack,
            at,
        } => {
            let at = rotation_time(at).map_err(anyhow::Error::msg)?;
            let rotation = fleet.request_rotation(&server, &modpack, at).await?;
            println!(
                "Rotation {} scheduled for {} (in {}s)",
                rotation.id,
                rotation.scheduled_for,
                rotation.delay.as_secs()
            );

            // Interrupting cancels a rotation still waiting; one already
            // running is awaited to completion.
            let mut finished = Box::pin(rotation.join());
            let report = tokio::select! {
                report = &mut finished => report,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, cancelling pending rotation");
                    fleet.shutdown();
                    finished.await
                }
            };
            match report {
                Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                None => println!("Rotation did not run"),
            }
        }
        Commands::ShowConfig | Commands::InitConfig => {}
    }

    Ok(())
}
