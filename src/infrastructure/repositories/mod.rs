pub mod idea_repository;

pub use idea_repository::IdeaRepository;
