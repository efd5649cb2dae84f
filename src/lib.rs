pub mod clients;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod infrastructure;
pub mod logging;
pub mod project;
pub mod services;
pub mod utils;

// Re-export commonly used items for convenience
pub use errors::{AppError, AppResult};
pub use infrastructure::Kernel;
