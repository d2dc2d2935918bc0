//! Render error types.

/// Errors surfaced by the render layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A resize requested unusable target dimensions. The previous targets
    /// are retained untouched.
    #[error("render target size {width}x{height} is invalid; keeping previous size")]
    InvalidTargetSize {
        /// Requested width in physical pixels.
        width: u32,
        /// Requested height in physical pixels.
        height: u32,
    },

    /// After the restore pass, some nodes were still carrying the temporary
    /// darkened material. This indicates a darken/restore pairing bug.
    #[error("{count} node(s) left shadowed after the restore pass")]
    ShadowedMaterialLeak {
        /// Number of nodes still shadowed.
        count: usize,
    },
}
