//! Legacy Office binary text recovery
//!
//! Word 97-2003 (.doc) and `PowerPoint` 97-2003 (.ppt) files are OLE2
//! compound documents whose text streams are stored as UTF-16LE or as 8-bit
//! code page runs, interleaved with binary records. No structured reader is
//! used here; instead [`carve_text`] decodes the whole buffer both ways and
//! keeps whichever decoding reads better.
//!
//! ## Examples
//!
//! ```rust
//! use insight_legacy::{carve_text, CarveEncoding};
//!
//! let data: Vec<u8> = "Quarterly report"
//!     .encode_utf16()
//!     .flat_map(u16::to_le_bytes)
//!     .collect();
//! let carved = carve_text(&data);
//! assert_eq!(carved.encoding, CarveEncoding::Utf16Le);
//! assert_eq!(carved.fragments, vec!["Quarterly report".to_string()]);
//! ```

pub mod carve;

pub use carve::{
    carve_text, decode_latin1, decode_utf16le, has_cfb_signature, readability_score,
    split_fragments, CarveEncoding, CarvedText, CFB_MAGIC_SIGNATURE, FRAGMENT_PENALTY,
};
