use std::time::Duration;

use chemstore::cli::create_admin;
use chemstore_db::{BatchExecutor, init_db_pool};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "chemstore-cli")]
#[command(about = "Chemstore CLI - Administrative tools for Chemstore", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an active admin account
    CreateAdmin {
        /// Login name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL must be set");
        std::process::exit(1);
    };

    let pool = match init_db_pool(&database_url, Duration::from_secs(10)).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    let batch = BatchExecutor::new(pool, Duration::from_secs(10));

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAdmin { name } => handle_create_admin(&batch, name).await,
    }
}

async fn handle_create_admin(batch: &BatchExecutor, name: Option<String>) {
    let credentials = prompt_credentials(name);
    let (name, password) = match credentials {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    match create_admin(batch, &name, &password).await {
        Ok(user) => {
            println!("\nAdmin created successfully!");
            println!("   Name: {}", user.name);
            println!("   Id: {}", user.id);
        }
        Err(e) => {
            eprintln!("\nError creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

fn prompt_credentials(name: Option<String>) -> dialoguer::Result<(String, String)> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Name").interact_text()?,
    };

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords don't match")
        .interact()?;

    Ok((name, password))
}
