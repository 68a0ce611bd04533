pub mod preview;

pub use preview::{Command, ExitAction, KeyBindings, PreviewSurface};
