pub(crate) mod ffmpeg;
pub(crate) mod gif;
pub(crate) mod video;
