pub mod app;
pub mod controllers;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use app::App;
