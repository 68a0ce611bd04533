//! Preview surfaces and keyboard commands for the capture loop

use std::time::Duration;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Two live windows plus a bounded key poll
pub trait PreviewSurface {
    fn show(&mut self, left: &RgbImage, right: &RgbImage) -> Result<()>;

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>>;
}

/// What a key press asks the capture loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Accept,
    Calibrate,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub accept: char,
    pub calibrate: char,
    pub exit: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            accept: ' ',
            calibrate: 'c',
            exit: 'e',
        }
    }
}

impl KeyBindings {
    pub fn command(&self, key: char) -> Option<Command> {
        if key == self.accept {
            Some(Command::Accept)
        } else if key == self.calibrate {
            Some(Command::Calibrate)
        } else if key == self.exit {
            Some(Command::Exit)
        } else {
            None
        }
    }
}

/// Effect of the exit key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitAction {
    /// Key is recognised but does nothing; the loop runs until the source ends
    #[default]
    Ignore,
    Quit,
}
