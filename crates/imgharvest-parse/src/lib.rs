//! imgharvest-parse: PDF backend for image harvesting.
//!
//! Reads page geometry, lists image XObjects with the rectangle each one is
//! first painted into, and fetches image payloads as writable files. The
//! [`PdfBackend`] trait keeps lopdf out of the higher layers.

pub mod backend;
pub mod error;
pub mod lopdf_backend;
mod placement;
pub mod tokenizer;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use imgharvest_core;
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use placement::MAX_FORM_DEPTH;
