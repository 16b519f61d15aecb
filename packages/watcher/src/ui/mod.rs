//! UI layer
//!
//! スケジューラと、配信先に向けた Presentation（ステータスボード・通知）を提供する。

pub mod notifier;
pub mod operator;
pub mod presenter;
pub mod render;
pub mod scheduler;
pub mod signal;
pub mod view;

pub use notifier::ArrivalNotifier;
pub use presenter::StatusBoardPresenter;
pub use render::StatusRenderer;
pub use scheduler::{PollScheduler, ScheduleError};
pub use signal::shutdown_signal;
pub use view::{Banner, BoardState, OutboundMessage, PlayerLine, ServerLine, StatusView};
