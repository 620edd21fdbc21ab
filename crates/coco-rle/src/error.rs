use thiserror::Error;

/// Errors produced by the mask codec.
///
/// Every operation in this crate is pure, so none of these are retryable: the
/// same input always fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The encoded string ended in the middle of a multi-byte integer.
    #[error("encoded counts truncated at byte {offset}: continuation bit set on last byte")]
    Truncated { offset: usize },

    /// A byte outside the `'0'..='o'` alphabet of the encoded format.
    #[error("invalid byte {byte:#04x} at offset {offset} in encoded counts")]
    InvalidByte { offset: usize, byte: u8 },

    /// A single integer used more 5-bit groups than fit in 64 bits.
    #[error("encoded integer starting before byte {offset} overflows 64 bits")]
    Overflow { offset: usize },

    /// A decoded run is negative or too large for a `u32`.
    #[error("run {index} decoded to {value}, which is not a valid run length")]
    InvalidRun { index: usize, value: i64 },

    /// The runs do not cover exactly `height * width` pixels.
    #[error("runs cover {actual} pixels but the mask has {expected}")]
    DimensionMismatch { expected: u64, actual: u64 },

    /// The mask is not 2D (after squeezing a trailing channel of length 1), or
    /// has more than `u32::MAX` rows, columns or pixels.
    #[error("unsupported mask shape {shape:?}: expected (h, w) or (h, w, 1)")]
    UnsupportedShape { shape: Vec<usize> },

    /// Polygon records and conversions this codec does not implement.
    #[error("unsupported segmentation format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors from loading, converting and saving a COCO annotation file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid annotation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("annotation {annotation_id} has no segmentation")]
    MissingSegmentation { annotation_id: String },

    #[error("annotation {annotation_id}")]
    Codec {
        annotation_id: String,
        #[source]
        source: CodecError,
    },
}
