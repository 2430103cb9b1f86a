//! Error types for the gesture tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "camera")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable camera: missing backend, permission denied, device busy or gone.
    /// Fatal for the tracking session that hit it.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The landmark detector failed on a single frame
    #[error("Detection failure: {0}")]
    DetectionFailure(String),

    /// A preview snapshot could not be encoded
    #[error("Encoding failure: {0}")]
    EncodingFailure(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
