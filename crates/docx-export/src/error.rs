use thiserror::Error;

/// Fatal export failures.
///
/// Math-construct-level problems (unknown tags, wrong arities, missing
/// script data) never surface here; they degrade inside the MathML walker.
/// Everything in this enum rejects the whole export and no partial package
/// is returned.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The image payload was not a parseable `data:` URI.
    #[error("invalid image data URI: {0}")]
    InvalidDataUri(String),

    /// The data URI carried invalid base64.
    #[error("image payload is not valid base64: {0}")]
    ImageDecode(#[from] base64::DecodeError),

    /// The external LaTeX→MathML conversion rejected the equation source.
    #[error("LaTeX conversion failed: {0}")]
    Latex(String),

    /// The MathML produced by the external converter did not parse.
    #[error("MathML parse error: {0}")]
    MathmlParse(#[from] quick_xml::Error),

    /// The final packer failed while assembling the archive.
    #[error("failed to assemble package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
