pub(crate) mod font;
pub(crate) mod media;
pub(crate) mod source;
