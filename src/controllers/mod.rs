pub mod health;
pub mod idea;
