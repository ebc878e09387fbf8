// src/dump/mod.rs

//! Decoding of `apk adbdump` output
//!
//! This module provides:
//! - An arena tree of map/list/scalar nodes
//! - A stack-based decoder for the indentation-nested text format
//! - The [`IndexDumper`] boundary that turns raw blobs into that text

mod decoder;
mod tool;
mod tree;

pub use decoder::DumpDecoder;
pub use tool::{ApkTool, IndexDumper, PlainText};
pub use tree::{DumpTree, DumpValue, Node, NodeId};

use crate::error::Result;

/// Dump a raw blob and decode the whole result
pub fn decode_blob(dumper: &dyn IndexDumper, raw: &[u8]) -> Result<DumpTree> {
    let text = dumper.dump(raw)?;
    DumpDecoder::new().decode(&text)
}

/// Dump a raw blob and decode only one top-level section
pub fn decode_section(dumper: &dyn IndexDumper, raw: &[u8], key: &str) -> Result<DumpTree> {
    let text = dumper.dump(raw)?;
    DumpDecoder::scoped(key).decode(&text)
}
