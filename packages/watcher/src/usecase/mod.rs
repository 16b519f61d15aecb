//! UseCase layer
//!
//! ポーリングパイプライン（Scanner → Tracker → Orchestrator）を実装する。

pub mod error;
pub mod poll_cycle;
pub mod scan_directory;
pub mod track_activity;

pub use error::CycleError;
pub use poll_cycle::{CycleOutcome, CycleReport, PollCycleUseCase};
pub use scan_directory::{ScanDirectoryUseCase, ScanOutcome, ScanSettings};
pub use track_activity::{ActivityUpdate, TrackActivityUseCase};
