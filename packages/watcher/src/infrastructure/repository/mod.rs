//! Repository 実装

pub mod destinations;

pub use destinations::InMemoryDestinationRepository;
