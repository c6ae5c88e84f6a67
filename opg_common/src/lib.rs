mod cents;
mod helpers;

pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, DEFAULT_CURRENCY_CODE};
pub use helpers::parse_env_or_default;
pub use secret::Secret;
