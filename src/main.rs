// src/main.rs

mod cli;

use anyhow::Result;
use async_trait::async_trait;
use caiman::observer::spawn_signal_renderer;
use caiman::{
    engine, AutoConfirm, Confirmation, Config, LogNotifier, ManagerRegistry, PackageManager,
    UpdateMode,
};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, EnvCommands};
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Confirmation through a terminal prompt
struct StdinConfirm;

#[async_trait]
impl Confirmation for StdinConfirm {
    async fn confirm(&self, title: &str, body: &str) -> bool {
        println!("{}", title);
        println!("{}", body);
        print!("Proceed? [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }
}

/// One CLI invocation's registry, environment handle, and signal renderer
struct Session {
    registry: ManagerRegistry,
    pm: Arc<PackageManager>,
    renderer: JoinHandle<()>,
}

impl Session {
    fn open(config: &Config, env: &str) -> Result<Self> {
        let registry = ManagerRegistry::new(Arc::new(config.backend()?));
        let pm = registry.get_or_create(env)?;
        let renderer = spawn_signal_renderer(&pm, Arc::new(LogNotifier::new()));
        Ok(Session {
            registry,
            pm,
            renderer,
        })
    }

    /// Let the renderer drain buffered signals, then tear down
    async fn close(self) {
        drop(self.pm);
        self.registry.clear();
        drop(self.registry);
        let _ = self.renderer.await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Prime { env } => {
            let session = Session::open(&config, &env)?;
            let mut rx = session.pm.subscribe();

            let result = engine::prime(&session.registry, &env).await;

            // Render a summary from the terminal success signal
            while let Ok(signal) = rx.try_recv() {
                if let Some(packages) = signal.packages {
                    let updatable = packages.iter().filter(|p| p.updatable).count();
                    println!(
                        "{} package(s) in '{}', {} updatable",
                        packages.len(),
                        env,
                        updatable
                    );
                }
            }
            drop(rx);

            session.close().await;
            result?;
        }

        Commands::Update {
            env,
            all,
            names,
            versions,
        } => {
            let mode = if all || names.is_empty() {
                UpdateMode::All
            } else {
                UpdateMode::Selected
            };
            let versions = if versions.is_empty() {
                None
            } else {
                Some(versions)
            };

            let session = Session::open(&config, &env)?;
            let result = engine::update_packages(
                &session.registry,
                &env,
                mode,
                &names,
                versions.as_deref(),
            )
            .await;
            session.close().await;
            result?;
        }

        Commands::UpdateAllConfirm { env, yes } => {
            let session = Session::open(&config, &env)?;
            let result = if yes {
                engine::confirm_and_update_all(&session.registry, &env, &AutoConfirm).await
            } else {
                engine::confirm_and_update_all(&session.registry, &env, &StdinConfirm).await
            };
            session.close().await;
            result?;
        }

        Commands::RefreshAvailable { env } => {
            let session = Session::open(&config, &env)?;
            let result = engine::refresh_available(&session.registry, &env).await;
            session.close().await;
            result?;
        }

        Commands::Remove { env, names } => {
            let session = Session::open(&config, &env)?;
            let result = engine::remove_packages(&session.registry, &env, &names).await;
            session.close().await;
            result?;
        }

        Commands::ApplyModifications { env, all, names } => {
            let mode = if all || names.is_empty() {
                UpdateMode::All
            } else {
                UpdateMode::Selected
            };
            let session = Session::open(&config, &env)?;
            let result =
                engine::apply_modifications(&session.registry, &env, mode, &names).await;
            session.close().await;
            result?;
        }

        Commands::Env { command } => {
            let registry = ManagerRegistry::new(Arc::new(config.backend()?));
            run_env_command(&registry, command).await?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

async fn run_env_command(registry: &ManagerRegistry, command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::List => {
            for env in registry.environments().await? {
                let marker = if env.is_default { "*" } else { " " };
                println!("{} {:<24} {}", marker, env.name, env.dir);
            }
        }

        EnvCommands::Create { name, specs } => {
            info!("Creating environment '{}'", name);
            registry.backend().create(&name, &specs).await?;
            println!("Environment '{}' created", name);
        }

        EnvCommands::Clone { source, target } => {
            info!("Cloning environment '{}' to '{}'", source, target);
            registry.backend().clone_environment(&source, &target).await?;
            println!("Environment '{}' created from '{}'", target, source);
        }

        EnvCommands::Remove { name, yes } => {
            if !yes {
                let accepted = StdinConfirm
                    .confirm(
                        "Remove environment",
                        &format!("Permanently delete environment '{}'?", name),
                    )
                    .await;
                if !accepted {
                    return Ok(());
                }
            }
            registry.backend().remove_environment(&name).await?;
            // A stale handle must not outlive its environment
            registry.invalidate(&name);
            println!("Environment '{}' removed", name);
        }

        EnvCommands::Export { name } => {
            let definition = registry.backend().export(&name).await?;
            print!("{}", definition);
        }

        EnvCommands::Import { name, file } => {
            let definition = std::fs::read_to_string(&file)?;
            info!("Importing environment '{}' from {}", name, file.display());
            registry.backend().import(&name, &definition).await?;
            println!("Environment '{}' created", name);
        }
    }

    Ok(())
}
