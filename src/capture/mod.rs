pub mod frame;
pub mod layout;
pub mod source;

pub use frame::{Frame, FrameMetadata};
pub use layout::{Region, StereoLayout, StereoView, SubFrame};
pub use source::{FrameSink, FrameSource};
