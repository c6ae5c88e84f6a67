use std::{env, env::VarError};

/// Listed with their values.
const DISPLAY_ENVS: [&str; 12] = [
    "RUST_LOG",
    "OPG_HOST",
    "OPG_PORT",
    "OPG_DATABASE_URL",
    "OPG_ENVIRONMENT",
    "OPG_MAX_ITEMS_PER_ORDER",
    "OPG_STRIPE_API_URL",
    "OPG_STRIPE_CURRENCY",
    "OPG_STRIPE_TIMEOUT_MS",
    "OPG_STRIPE_MAX_RETRIES",
    "OPG_STRIPE_RETRY_BACKOFF_MS",
    "OPG_STRIPE_WEBHOOK_TOLERANCE",
];

/// Only ever reported as set or not set.
const SECRET_ENVS: [&str; 3] = ["OPG_JWT_SECRET", "OPG_STRIPE_SECRET_KEY", "OPG_STRIPE_WEBHOOK_SECRET"];

/// There's no real CLI for the server, so any argument at all prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}

fn secret_status(name: &str) -> &'static str {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => "Set",
        Ok(_) => "Empty",
        Err(_) => "Not set",
    }
}

fn display_envs() {
    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| println!("  {name:<35} {:<15}", env_value(name)));
    SECRET_ENVS.iter().for_each(|&name| println!("  {name:<35} {:<15}", secret_status(name)));
}
