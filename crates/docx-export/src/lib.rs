//! Export a rich-document snapshot to a binary `.docx` package.
//!
//! The input is the editor's JSON document tree (see [`DocumentNode`]);
//! the output is a complete OOXML WordprocessingML package in memory.
//! Embedded math travels as LaTeX, is rendered to MathML by an external
//! converter and then compiled to OMML by a recursive walker.
//!
//! The pipeline is synchronous and pure over its input: it performs no
//! I/O, never mutates the snapshot, and keeps all working state local to
//! one [`export`] call.
//!
//! ```
//! use docx_export::{DocumentNode, export};
//!
//! let snapshot: DocumentNode = serde_json::from_str(
//!     r#"{"type":"root","children":[
//!         {"type":"heading","level":1,"children":[
//!             {"type":"text","text":"Report"}]},
//!         {"type":"math","latex":"\\frac{1}{2}"}]}"#,
//! )?;
//! let buffer = export(&snapshot)?;
//! assert_eq!(&buffer[..2], b"PK");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod docx;
mod error;
pub mod omml;
pub mod xml;

pub use document::{Alignment, DocumentNode, ListKind};
pub use error::ExportError;
pub use omml::{convert_mathml, latex_to_omml};

/// Export a document snapshot as a `.docx` buffer.
///
/// Local math irregularities (unknown MathML tags, wrong construct arity)
/// degrade in place; only external failures reject the call: LaTeX or
/// MathML parsing, image payload decoding, and the packer itself. No
/// partial package is ever returned.
pub fn export(document: &DocumentNode) -> Result<Vec<u8>, ExportError> {
    docx::package::assemble(document)
}
