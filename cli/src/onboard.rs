use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use quarry_core::config::Config;
use std::path::PathBuf;

const BANNER: &str = r"
    -------------------------------------

      quarry  ·  ask your database

    -------------------------------------
";

const PROVIDERS: &[(&str, &[&str])] = &[
    ("gemini", &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"]),
    ("openai", &["gpt-4o", "gpt-4o-mini", "gpt-4.1"]),
    ("ollama", &["llama3.2", "qwen3", "mistral"]),
];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<usize> {
    let names: Vec<&str> = PROVIDERS.iter().map(|(name, _)| *name).collect();

    Select::new()
        .with_prompt("Select your model provider")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to select provider")
}

fn setup_api_key(provider: &str) -> Result<String> {
    if provider == "ollama" {
        return Ok(String::new());
    }

    let api_key: String = Input::new()
        .with_prompt(format!(
            "Enter your {} API key (leave empty to use the environment)",
            provider
        ))
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    Ok(api_key.trim().to_string())
}

fn setup_model(models: &[&str]) -> Result<String> {
    let selection = Select::new()
        .with_prompt("Select your model")
        .items(models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(models[selection].to_string())
}

/// The config is read from any working directory, so the stored path must
/// not depend on where onboarding ran.
fn absolute_database_path(input: &str) -> Result<PathBuf> {
    std::path::absolute(input.trim())
        .with_context(|| format!("Failed to resolve database path '{}'", input))
}

fn setup_database() -> Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("Path to the SQLite database")
        .default("library.db".to_string())
        .interact_text()
        .context("Failed to read database path")?;
    let path = absolute_database_path(&path)?;

    if !path.exists() {
        let seed = Confirm::new()
            .with_prompt(format!(
                "{} does not exist. Create the demo library database there?",
                path.display()
            ))
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;

        if seed {
            quarry_core::db::seed_library(&path)?;
            println!(
                "  {} Demo database created at {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    Ok(path)
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to quarry!").white().bold());
    println!(
        "  {}",
        style("This wizard connects a language model to your SQLite database.").dim()
    );
    println!();

    print_step(1, 3, "Provider Setup");
    let (provider, models) = PROVIDERS[setup_provider()?];
    let api_key = setup_api_key(provider)?;

    print_step(2, 3, "Model Selection");
    let model = setup_model(models)?;

    print_step(3, 3, "Database");
    let database_path = setup_database()?;

    let config = Config {
        provider: Some(provider.to_string()),
        api_key,
        model,
        database_path,
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(quarry_core::config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("quarry chat").cyan().bold()
    );
    println!();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_database_path_is_made_absolute() {
        let path = absolute_database_path("library.db").unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, std::env::current_dir().unwrap().join("library.db"));
    }

    #[test]
    fn absolute_database_path_is_kept() {
        let dir = std::env::temp_dir().join("quarry.db");
        assert_eq!(absolute_database_path(dir.to_str().unwrap()).unwrap(), dir);
    }
}
