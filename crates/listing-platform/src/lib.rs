mod commands;
mod media;
mod paths;

pub use commands::HideWindow;
pub use media::FfmpegMedia;
pub use paths::{AppPaths, AppPathsError};
