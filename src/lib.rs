pub mod calib;
pub mod capture;
pub mod display;
pub mod error;
pub mod session;
pub mod splitter;
pub mod utils;

#[cfg(feature = "opencv")]
pub mod backend;

#[cfg(test)]
pub mod mock;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calib::{BoardGeometry, CalibrationFlags, PersistOptions};
use crate::capture::StereoLayout;
use crate::display::{ExitAction, KeyBindings};
pub use crate::error::{Error, Result};

/// Prefix for environment overrides, e.g. `STEREO_BOARD__SQUARE_SIZE=0.025`
pub const ENV_PREFIX: &str = "STEREO";

/// System configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub layout: StereoLayout,
    pub board: BoardGeometry,
    pub calibration: CalibrationConfig,
    pub preview: PreviewConfig,
    pub splitter: SplitterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Local camera number
    pub device_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Each side needs strictly more buffered images than this
    pub min_images: usize,
    pub flags: CalibrationFlags,
    pub persist: PersistOptions,
    pub format: ParameterFormat,
    pub left_output: PathBuf,
    pub right_output: PathBuf,
}

/// Parameter file writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterFormat {
    /// The vision library's own storage writer
    #[default]
    Opencv,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub fps: u32,
    pub keys: KeyBindings,
    pub exit_action: ExitAction,
    pub left_window: String,
    pub right_window: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub left_output: PathBuf,
    pub right_output: PathBuf,
    /// Four character codec tag
    pub codec: String,
    pub fps: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_images: 15,
            flags: CalibrationFlags::default(),
            persist: PersistOptions::default(),
            format: ParameterFormat::Opencv,
            left_output: "left_params.yml".into(),
            right_output: "right_params.yml".into(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            keys: KeyBindings::default(),
            exit_action: ExitAction::Ignore,
            left_window: "WebCam1".into(),
            right_window: "WebCam2".into(),
        }
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            left_output: "outLeft.avi".into(),
            right_output: "outRight.avi".into(),
            codec: "MJPG".into(),
            fps: 24.0,
        }
    }
}

impl PreviewConfig {
    /// Key poll interval, one frame period
    pub fn key_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

impl SplitterConfig {
    pub fn codec_tag(&self) -> Result<[char; 4]> {
        let chars: Vec<char> = self.codec.chars().collect();
        chars.try_into().map_err(|_| {
            Error::InvalidConfig(format!("codec tag must be 4 characters, got {:?}", self.codec))
        })
    }
}

impl Config {
    /// Defaults, then an optional TOML file, then `STEREO_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.board.validate()?;
        self.calibration.flags.validate()?;
        self.splitter.codec_tag()?;
        if self.preview.fps == 0 {
            return Err(Error::InvalidConfig("preview fps must be positive".into()));
        }
        if self.splitter.fps.is_nan() || self.splitter.fps <= 0.0 {
            return Err(Error::InvalidConfig("splitter fps must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// Held by every test that reads the environment through `Config::load`
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.left, capture::Region::new(0, 0, 640, 480));
        assert_eq!(config.layout.right, capture::Region::new(640, 0, 640, 480));
        assert_eq!(config.calibration.min_images, 15);
        assert_eq!(config.preview.key_wait(), std::time::Duration::from_millis(50));
        assert_eq!(config.splitter.codec_tag().expect("bad codec"), ['M', 'J', 'P', 'G']);
    }

    #[test]
    fn test_load_without_file_gives_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = Config::load(None).expect("load failed");
        assert_eq!(config.board, BoardGeometry::default());
        assert_eq!(config.preview.keys, KeyBindings::default());
    }

    #[test]
    fn test_load_toml_overrides() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile failed");
        writeln!(
            file,
            r#"
[board]
columns = 9
rows = 6
square_size = 0.025

[calibration]
min_images = 5
format = "yaml"

[calibration.persist]
per_view_errors = true

[preview]
exit_action = "quit"
"#
        )
        .expect("write failed");

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = Config::load(Some(file.path())).expect("load failed");
        assert_eq!(config.board.columns, 9);
        assert_eq!(config.board.rows, 6);
        assert!((config.board.square_size - 0.025).abs() < 1e-6);
        assert_eq!(config.calibration.min_images, 5);
        assert_eq!(config.calibration.format, ParameterFormat::Yaml);
        assert!(config.calibration.persist.per_view_errors);
        assert!(config.calibration.persist.extrinsics);
        assert_eq!(config.preview.exit_action, ExitAction::Quit);
        assert_eq!(config.layout, StereoLayout::default());
    }

    #[test]
    fn test_load_rejects_invalid_board() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile failed");
        writeln!(file, "[board]\ncolumns = 1").expect("write failed");

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        assert!(matches!(
            Config::load(Some(file.path())),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_codec_tag() {
        let mut config = Config::default();
        config.splitter.codec = "MJPEG".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_environment_overrides() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("STEREO_BOARD__SQUARE_SIZE", "0.025");
        std::env::set_var("STEREO_CALIBRATION__MIN_IMAGES", "7");
        let loaded = Config::load(None);
        std::env::remove_var("STEREO_BOARD__SQUARE_SIZE");
        std::env::remove_var("STEREO_CALIBRATION__MIN_IMAGES");

        let config = loaded.expect("load failed");
        assert!((config.board.square_size - 0.025).abs() < 1e-6);
        assert_eq!(config.calibration.min_images, 7);
        assert_eq!(config.board.columns, BoardGeometry::default().columns);
    }

    #[test]
    fn test_rejects_fixed_aspect_ratio_without_ratio() {
        let mut config = Config::default();
        config.calibration.flags.fix_aspect_ratio = true;
        assert!(config.validate().is_ok());

        config.calibration.flags.aspect_ratio = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
