//! Reading and writing [`FlatGraph`]s as JSON documents.
//!
//! The document is the serde representation of [`FlatGraph`]; unlike `.npz` archives it keeps
//! names and metadata. Dense attribute matrices use the `ndarray` serde layout
//! (`{"v": 1, "dim": [rows, cols], "data": [...]}`).

use std::io::{Read, Write};

use super::*;

/// Reads a [`FlatGraph`] from a JSON document
pub fn read_json<R: Read>(reader: R) -> Result<FlatGraph> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes a [`FlatGraph`] as a JSON document
pub fn write_json<W: Write>(writer: W, flat: &FlatGraph) -> Result<()> {
    serde_json::to_writer(writer, flat)?;
    Ok(())
}
