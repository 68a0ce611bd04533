pub mod board;
pub mod buffer;
pub mod calibrator;
pub mod record;
pub mod solver;
pub mod store;

pub use board::{BoardGeometry, ImagePoint, ObjectPoint};
pub use buffer::{CalibrationBuffer, StereoBuffers};
pub use calibrator::{Calibrator, StereoCalibration};
pub use record::{CalibrationRecord, PersistOptions};
pub use solver::{CalibrationFlags, CalibrationSolver, CornerDetector, DetectionMode, Solution};
pub use store::{ParameterStore, YamlStore};
