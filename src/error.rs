use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// Geometry routines assume the caller has detected a crossing; when the inputs
/// cannot produce one they report it here instead of returning NaN coordinates.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid scenario or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Degenerate geometry (zero-length vector, parallel lines).
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// The travel segment does not reach the given border edge.
    #[error("travel segment does not cross border edge {edge}")]
    NoCrossing { edge: usize },

    /// Border edge index out of range.
    #[error("border edge index {index} out of range (border has {len} edges)")]
    EdgeIndex { index: usize, len: usize },

    /// Random placement gave up finding points inside the border.
    #[error("could not place particle {0} inside the border")]
    Placement(usize),

    /// Propagated I/O errors (experiment output).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
