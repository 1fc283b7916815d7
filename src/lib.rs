//! HTTP service for diabetes risk, exercise and food recommendations, food
//! nutrition lookup and food image classification on top of pretrained
//! model artifacts.

pub mod config;
pub mod error;
pub mod food;
pub mod handlers;
pub mod imaging;
pub mod inference;
pub mod lookup;
pub mod model;
pub mod nutrition;
pub mod scaler;
pub mod state;
pub mod units;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::AppError;
pub use handlers::router;
pub use state::AppState;
