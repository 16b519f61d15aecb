//! Infrastructure layer
//!
//! ドメイン層の trait に対する具体的な実装。

pub mod geo;
pub mod presence;
pub mod query;
pub mod repository;
pub mod sink;

pub use geo::{MaxMindGeoLocator, StaticGeoLocator};
pub use presence::WatchPresenceUpdater;
pub use query::{Fixture, FixtureQueryClient, FixtureServer};
pub use repository::InMemoryDestinationRepository;
pub use sink::ChannelDestinationSink;
