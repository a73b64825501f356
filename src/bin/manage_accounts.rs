//! CLI tool to onboard tenants and manage account keys.
//!
//! Usage:
//!   cargo run --bin manage-accounts -- create --name <name> --username <owner> --password <password>
//!   cargo run --bin manage-accounts -- keys --account <account-id>
//!   cargo run --bin manage-accounts -- add-key --account <account-id>

use std::env;

use tenant_auth_lib::auth::CredentialHasher;
use tenant_auth_lib::config::Config;
use tenant_auth_lib::db::DbPool;
use tenant_auth_lib::models::CreateAccountRequest;
use tenant_auth_lib::services::accounts;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    match command.as_str() {
        "create" => {
            let req = CreateAccountRequest {
                name: flag_value(&args, &["--name", "-n"]).unwrap_or_default(),
                username: required_flag(&args, &["--username", "-u"]),
                password: required_flag(&args, &["--password", "-p"]),
            };
            create_account(&pool, &config, req).await;
        }
        "keys" | "ls" => {
            let account_id = parse_account_arg(&args);
            list_keys(&pool, account_id).await;
        }
        "add-key" => {
            let account_id = parse_account_arg(&args);
            add_key(&pool, account_id).await;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn flag_value(args: &[String], names: &[&str]) -> Option<String> {
    args.windows(2)
        .skip(1)
        .find(|pair| names.contains(&pair[0].as_str()))
        .map(|pair| pair[1].clone())
}

fn required_flag(args: &[String], names: &[&str]) -> String {
    flag_value(args, names).unwrap_or_else(|| {
        eprintln!("Error: {} is required", names[0]);
        std::process::exit(1);
    })
}

fn parse_account_arg(args: &[String]) -> Uuid {
    let raw = required_flag(args, &["--account", "-a"]);
    Uuid::parse_str(&raw).unwrap_or_else(|_| {
        eprintln!("Error: --account must be a UUID, got '{}'", raw);
        std::process::exit(1);
    })
}

async fn create_account(pool: &DbPool, config: &Config, req: CreateAccountRequest) {
    let hasher = match CredentialHasher::new(config.hash_cost) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error configuring password hasher: {}", e);
            std::process::exit(1);
        }
    };

    match accounts::create_account(pool.connection(), &hasher, &req).await {
        Ok(tenant) => {
            println!();
            println!("Account created.");
            println!("  Account ID:  {}", tenant.account.id);
            println!("  Name:        {}", tenant.account.name);
            println!("  Owner:       {} ({})", tenant.owner.username, tenant.owner.id);
            println!();
            println!("  Account-Key: {}", tenant.key.id);
            println!();
            println!("Send the key in the Account-Key header to register and log in.");
            println!();
        }
        Err(e) => {
            eprintln!("Error creating account: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_keys(pool: &DbPool, account_id: Uuid) {
    let keys = match accounts::list_keys(pool.connection(), account_id).await {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error listing keys: {}", e);
            std::process::exit(1);
        }
    };

    if keys.is_empty() {
        println!("No keys found for account {}.", account_id);
        return;
    }

    println!();
    println!("{:<36}  {:<25}", "KEY", "CREATED");
    println!("{}", "-".repeat(63));
    for key in keys {
        println!("{:<36}  {:<25}", key.id, key.created_at.to_rfc3339());
    }
    println!();
}

async fn add_key(pool: &DbPool, account_id: Uuid) {
    match accounts::create_key(pool.connection(), account_id).await {
        Ok(key) => println!("Created key {} for account {}.", key.id, account_id),
        Err(e) => {
            eprintln!("Error creating key: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-accounts <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  create --name <name> --username <owner> --password <password>");
    eprintln!("                        Create an account with its first key and owner");
    eprintln!("  keys --account <id>   List the keys of an account");
    eprintln!("  add-key --account <id>");
    eprintln!("                        Mint an additional key for an account");
    eprintln!("  help                  Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  manage-accounts create --name Acme --username root --password s3cret");
    eprintln!("  manage-accounts keys --account 550e8400-e29b-41d4-a716-446655440000");
    eprintln!();
}
