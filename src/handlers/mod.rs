mod app;
mod health;

pub use app::application;
pub use health::{health_check, readiness_check};
