//! # oggpage Core
//!
//! A codec for the Ogg page framing format: a resynchronizing page decoder
//! and a fragmenting page encoder sharing one wire format.
//!
//! ## Modules
//!
//! - `constants`: Page format constants, limits and the header type flags
//! - `types`: Core types (PageHeader, Page, OwnedPage)
//! - `crc`: Page checksum
//! - `decoder`: Page decoding with resynchronization
//! - `encoder`: Packet framing and fragmentation
//! - `reassembler`: Stitching packets that span pages
//! - `scanner`: Damaged stream scanning and recovery
//! - `duration`: Opus packet duration estimate

#![warn(missing_docs)]

pub mod constants;
pub mod crc;
pub mod decoder;
pub mod duration;
pub mod encoder;
pub mod error;
pub mod reassembler;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use constants::PageType;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{DurationError, PageError};
pub use types::{OwnedPage, Page, PageHeader};

/// Result type alias for page operations
pub type Result<T> = core::result::Result<T, PageError>;
