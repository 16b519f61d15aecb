//! Domain layer
//!
//! 値オブジェクト、エンティティ、外部コラボレータとの境界となる trait を定義する。
//! この層は他のどの層にも依存しない。

pub mod entity;
pub mod error;
pub mod query_client;
pub mod relevance;
pub mod repository;
pub mod value_object;

pub use entity::{ActivityState, CycleResult, DestinationConfig, ServerSnapshot};
pub use error::{
    NotifyError, PresenceError, PresentError, QueryError, RepositoryError, SinkError,
};
pub use query_client::{GeoLocator, QueryClient, QueryField};
pub use relevance::RelevanceFilter;
pub use repository::{
    DestinationRepository, DestinationSink, Notifier, PresenceUpdater, SinkChannel,
    StatusPresenter,
};
pub use value_object::{
    AddressError, ChannelId, GameType, GuildId, PlayerRecord, RoleId, ServerAddress,
};
