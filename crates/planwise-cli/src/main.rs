mod config;
mod plan_cmds;
mod serve_cmd;

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use planwise_core::plan::PlanService;
use planwise_core::store::{MemoryPlanStore, PgPlanStore};
use planwise_db::config::DbConfig;
use planwise_db::pool;

use config::{CliOverrides, PlanwiseConfig};

#[derive(Parser)]
#[command(name = "planwise", about = "Learning plans: generated curricula and topic progress")]
struct Cli {
    /// Database URL (overrides PLANWISE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a planwise config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Address for `planwise serve` to bind
        #[arg(long, default_value = config::DEFAULT_BIND)]
        bind: String,
        /// Port for `planwise serve` to listen on
        #[arg(long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides PLANWISE_BIND and the config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PLANWISE_PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
        /// Keep plans in process memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Print shell completions to stdout
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a plan from the built-in catalog
    Generate {
        /// Subject: maths, english, science, or anything else for a mixed plan
        #[arg(long, default_value = "")]
        subject: String,
        /// Difficulty: beginner, intermediate, advanced
        #[arg(long, default_value = "")]
        difficulty: String,
        /// Estimated days to complete (default 30)
        #[arg(long)]
        days: Option<i32>,
        /// Description (generated when omitted)
        #[arg(long)]
        description: Option<String>,
        /// Seed for topic selection, for reproducible plans
        #[arg(long)]
        seed: Option<u64>,
        /// Owner of the new plan
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
    /// Create a plan from a TOML file
    Create {
        /// Path to the plan TOML file
        file: String,
        /// Owner of the new plan
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
    /// List plans
    List {
        /// Only plans owned by this user ID
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show plan details
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// Export a plan as TOML
    Export {
        /// Plan ID to export
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Flip a topic between completed and not completed
    Toggle {
        /// Plan ID
        plan_id: String,
        /// Topic ID
        topic_id: String,
        /// Acting user (must own the plan)
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
    /// Follow a plan
    Follow {
        /// Plan ID to follow
        plan_id: String,
        /// Acting user
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
    /// Unfollow a plan
    Unfollow {
        /// Plan ID to unfollow
        plan_id: String,
        /// Acting user
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
    /// Delete a plan and its topics and resources
    Delete {
        /// Plan ID to delete
        plan_id: String,
        /// Acting user (must own the plan)
        #[arg(long, env = "PLANWISE_USER_ID")]
        user: Uuid,
    },
}

/// Execute the `planwise init` command: write config file.
fn cmd_init(db_url: &str, bind: &str, port: u16, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection {
            bind: bind.to_string(),
            port,
            allowed_origin: None,
        },
    };

    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server.bind  = {bind}");
    println!("  server.port  = {port}");
    println!();
    println!("Next: run `planwise db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `planwise db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &PlanwiseConfig) -> anyhow::Result<()> {
    println!("Initializing planwise database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("planwise db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = cli.database_url.as_deref();

    match cli.command {
        Commands::Init {
            db_url,
            bind,
            port,
            force,
        } => {
            cmd_init(&db_url, &bind, port, force)?;
        }
        Commands::DbInit => {
            let resolved = PlanwiseConfig::resolve(&CliOverrides {
                database_url,
                ..Default::default()
            })?;
            cmd_db_init(&resolved).await?;
        }
        Commands::Serve {
            bind,
            port,
            in_memory,
        } => {
            let resolved = PlanwiseConfig::resolve(&CliOverrides {
                database_url,
                bind: bind.as_deref(),
                port,
            })?;
            if in_memory {
                tracing::warn!("serving from an in-memory store; plans are lost on exit");
                let service = PlanService::new(Arc::new(MemoryPlanStore::new()));
                serve_cmd::run_serve(service, &resolved.server).await?;
            } else {
                let db_pool = pool::create_pool(&resolved.db_config).await?;
                pool::run_migrations(&db_pool).await?;
                let service = PlanService::new(Arc::new(PgPlanStore::new(db_pool.clone())));
                let result = serve_cmd::run_serve(service, &resolved.server).await;
                db_pool.close().await;
                result?;
            }
        }
        Commands::Plan { command } => {
            let resolved = PlanwiseConfig::resolve(&CliOverrides {
                database_url,
                ..Default::default()
            })?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let service = PlanService::new(Arc::new(PgPlanStore::new(db_pool.clone())));
            let result = plan_cmds::run_plan_command(command, &service).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "planwise", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialise tests that read or write process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
