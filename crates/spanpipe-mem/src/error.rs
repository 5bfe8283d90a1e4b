use thiserror::Error;

/// Result type local to spanpipe-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// An upstream size estimate was wrong: more elements arrived than the
    /// declared hard bound.
    #[error("buffer bound exceeded: declared at most {bound} elements, attempted to add element #{attempted}")]
    BoundsExceeded { bound: usize, attempted: usize },

    #[error("buffer segment limit reached ({max} segments)")]
    SegmentLimit { max: usize },
}
