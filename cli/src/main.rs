use anyhow::Result;
use clap::{Parser, Subcommand};
use quarry_core::{SetupError, agent, config, db, providers, tools};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod onboard;
mod render;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "quarry - ask questions about a SQLite database in plain language", long_about = None)]
struct Cli {
    /// SQLite database to query (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[arg(long, global = true)]
    provider: Option<String>,

    #[arg(long, global = true)]
    model: Option<String>,

    /// Step budget per question
    #[arg(long, global = true)]
    max_steps: Option<usize>,

    /// Log loop internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Onboard,
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Create the demo library database
    SetupDb {
        #[arg(long, default_value = "library.db")]
        path: PathBuf,
    },
    /// Print the tool declarations advertised to the model
    Tools,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "quarry_core=debug,quarry_cli=debug"
    } else {
        "quarry_core=warn,quarry_cli=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat { message: None }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                render::error("Onboarding", &e.to_string());
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::SetupDb { path } => {
            db::seed_library(&path)?;
            println!("Database created and populated successfully: {}", path.display());
            println!("Tables: authors, books, members, loans");
        }
        Commands::Tools => {
            let mut registry = agent::ToolRegistry::new();
            tools::register_sql_tools(&mut registry)?;
            println!("{}", serde_json::to_string_pretty(&registry.get_specs())?);
        }
        Commands::Chat { message } => {
            let mut config = config::Config::load_or_init()?;
            if let Some(path) = cli.db {
                config.database_path = path;
            }
            if let Some(provider) = cli.provider {
                config.provider = Some(provider);
            }
            if let Some(model) = cli.model {
                config.model = model;
            }
            if let Some(max_steps) = cli.max_steps {
                config.max_steps = max_steps;
            }

            let agent_loop = match build_agent(&config) {
                Ok(agent_loop) => agent_loop,
                Err(SetupError::DatabaseMissing(path)) => {
                    render::error(
                        "Database Error",
                        &format!(
                            "Database file '{}' not found. Run 'quarry setup-db' to create it.",
                            path.display()
                        ),
                    );
                    std::process::exit(1);
                }
                Err(e) => {
                    render::error("Setup Error", &format!("{:#}", anyhow::Error::from(e)));
                    std::process::exit(1);
                }
            };

            if let Some(msg) = message {
                ask(&agent_loop, &msg).await?;
            } else {
                repl(&agent_loop).await;
            }
        }
    }

    Ok(())
}

fn build_agent(config: &config::Config) -> Result<agent::AgentLoop, SetupError> {
    let database = db::Database::open(&config.database_path)?;
    let provider = providers::create_provider(config)?;

    let mut registry = agent::ToolRegistry::new();
    tools::register_sql_tools(&mut registry)?;

    Ok(agent::AgentLoop::new(provider, registry, database)?
        .with_max_steps(config.max_steps)
        .with_temperature(config.temperature)
        .with_event_sink(Arc::new(render::ConsoleSink)))
}

async fn ask(agent_loop: &agent::AgentLoop, query: &str) -> Result<()> {
    render::panel("User", query, console::Style::new().cyan().bold());
    let report = agent_loop.process(query).await?;
    render::report(&report);
    Ok(())
}

async fn repl(agent_loop: &agent::AgentLoop) {
    println!("quarry");
    println!("Type 'exit' or 'quit' to end the session (Ctrl+D also works).");

    use std::io::{self, BufRead};
    let stdin = io::stdin();

    loop {
        print!("\n[Query] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) | Err(_) => {
                println!("\nSession ended. Goodbye!");
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
                    println!("Session ended. Goodbye!");
                    break;
                }

                if let Err(e) = ask(agent_loop, input).await {
                    render::error("Error", &format!("{:#}", e));
                }
            }
        }
    }
}
