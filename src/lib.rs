pub mod config;
pub mod constants;
pub mod error;
pub mod filter_design;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod sweep;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::ControllerConfig;
pub use error::{DspError, Result};
pub use processing::{AudioCore, RxMetrics};
pub use sweep::SweepFrame;
pub use wav::{load_wav, save_wav};
