use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode preview image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid reference file \"{file}\" (line {line}): {reason}")]
    InvalidReference {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid patch set \"{source_name}\": {reason}")]
    InvalidPatchSet { source_name: String, reason: String },

    #[error("Patch {index} ({x0},{y0})-({x1},{y1}) is outside the {width}x{height} image")]
    PatchOutOfBounds {
        index: usize,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        width: usize,
        height: usize,
    },

    #[error("Demosaic failed: {0}")]
    DemosaicError(String),

    #[error("Solver setup failed: {0}")]
    SolverError(String),

    #[error("Invalid configuration document: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
