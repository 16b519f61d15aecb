//! QueryClient 実装

pub mod fixture;

pub use fixture::{Fixture, FixtureQueryClient, FixtureServer};
