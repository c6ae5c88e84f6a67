use std::{env, fmt::Display, str::FromStr};

/// Reads and parses the environment variable `name`. If the variable is not set, or cannot be parsed, `default` is
/// returned and the reason is handed to `on_fallback` so that the caller can log it however it sees fit.
pub fn parse_env_or_default<T, F>(name: &str, default: T, on_fallback: F) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: FnOnce(String),
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            on_fallback(format!("{s} is not a valid value for {name}. {e} Using the default, {default}, instead."));
            default
        }),
        Err(_) => {
            on_fallback(format!("{name} is not set. Using the default, {default}."));
            default
        },
    }
}
