/// Crate-wide result alias.
pub type HalftoneResult<T> = Result<T, HalftoneError>;

/// Error type shared by the render pipeline, the drivers, and the encoders.
#[derive(thiserror::Error, Debug)]
pub enum HalftoneError {
    /// Invalid parameters or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source image, video, or font could not be loaded.
    #[error("asset error: {0}")]
    Asset(String),

    /// Rasterization failed.
    #[error("render error: {0}")]
    Render(String),

    /// An encoder or recorder could not start or failed mid-stream.
    #[error("encode error: {0}")]
    Encode(String),

    /// An export was stopped through its cancellation token.
    #[error("export cancelled")]
    Cancelled,

    /// Another exclusive activity holds the canvas.
    #[error("busy: {0}")]
    Busy(String),

    /// Anything else, with its original context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HalftoneError {
    /// Build a [`HalftoneError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`HalftoneError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`HalftoneError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`HalftoneError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`HalftoneError::Busy`].
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// `true` for [`HalftoneError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            HalftoneError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(HalftoneError::asset("x").to_string().contains("asset error:"));
        assert!(
            HalftoneError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            HalftoneError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(HalftoneError::busy("x").to_string().contains("busy:"));
        assert_eq!(HalftoneError::Cancelled.to_string(), "export cancelled");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = HalftoneError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
        assert!(!err.is_cancelled());
    }
}
