//! Document-tree to WordprocessingML mapping and package assembly.

pub mod image;
pub mod mapper;
pub mod numbering;
pub mod package;
pub mod styles;
