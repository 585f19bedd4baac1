//! PDF rendering for photo sheets
//!
//! - Embedding working rasters as image XObjects
//! - Building one output page per sheet

mod page;
mod xobject;

pub use page::*;
pub use xobject::embed_raster;
