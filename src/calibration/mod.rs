//! Calibration: labelled cases and the auto-tuner that fits config
//! tunables to them.

pub mod dataset;
pub mod tuner;

pub use dataset::{CalibrationCase, load_cases};
pub use tuner::{FitReport, Objective, ParamSpace, Strategy, TunableParam, Tuner, TunerConfig};
