//! Reading and writing [`FlatGraph`]s as NumPy `.npz` archives.
//!
//! Numeric arrays are read in whichever integer/float dtype they were stored with and
//! converted to the schema types. String and object arrays (`node_names`, `attr_names`,
//! `class_names`, `metadata`) cannot be represented by `.npz` readers outside of Python;
//! they are skipped with a warning when reading and omitted when writing. Use the JSON
//! format to keep them.

use std::{
    collections::HashMap,
    io::{Read, Seek, Write},
};

use ndarray::{Array1, Array2, Dimension, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpyError, ReadNpzError, ReadableElement};
use tracing::{debug, warn};

use super::*;
use crate::{ClassId, error::GraphError};

/// Prefixes of the CSR-encoded matrices
const MATRIX_PREFIXES: [&str; 3] = ["adj", "attr", "labels"];
/// Arrays that cannot be decoded from `.npz`
const OBJECT_ARRAYS: [&str; 4] = ["node_names", "attr_names", "class_names", "metadata"];

/// Maps schema keys (without `.npy` extension) to the entry names of an archive
struct NpzEntries<R: Read + Seek> {
    reader: NpzReader<R>,
    entries: HashMap<String, String>,
}

/// Tries to read `entry` as an array of element type `$ty`, then of the next type, and so on.
/// Each alternative is converted with `$conv`.
macro_rules! read_first_matching {
    ($self:ident, $entry:expr, $key:expr, $dim:ty, [$($ty:ty => $conv:expr),+ $(,)?]) => {{
        $(
            if let Some(array) = $self.try_read::<$ty, $dim>($entry)? {
                return Ok(array.mapv($conv));
            }
        )+
        Err(GraphError::UnsupportedDtype { array: $key.to_string() })
    }};
}

impl<R: Read + Seek> NpzEntries<R> {
    fn new(reader: R) -> Result<Self> {
        let mut reader = NpzReader::new(reader)?;
        let entries = reader
            .names()?
            .into_iter()
            .map(|name| {
                let key = name.strip_suffix(".npy").unwrap_or(&name).to_string();
                (key, name)
            })
            .collect();
        Ok(Self { reader, entries })
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry of the first key present in the archive
    fn entry_of(&self, keys: &[String]) -> Option<String> {
        keys.iter().find_map(|k| self.entries.get(k).cloned())
    }

    /// Reads an entry with the given element type; `None` if it is stored with another dtype
    fn try_read<A, D>(&mut self, entry: &str) -> Result<Option<ndarray::Array<A, D>>>
    where
        A: ReadableElement,
        D: Dimension,
    {
        match self.reader.by_name::<OwnedRepr<A>, D>(entry) {
            Ok(array) => Ok(Some(array)),
            Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn read_floats(&mut self, entry: &str, key: &str) -> Result<Array1<f32>> {
        read_first_matching!(self, entry, key, ndarray::Ix1, [
            f32 => |v| v,
            f64 => |v| v as f32,
            i64 => |v| v as f32,
            i32 => |v| v as f32,
            u8 => |v| v as f32,
            bool => |v| if v { 1.0 } else { 0.0 },
        ])
    }

    fn read_integers(&mut self, entry: &str, key: &str) -> Result<Array1<i64>> {
        read_first_matching!(self, entry, key, ndarray::Ix1, [
            i64 => |v| v,
            i32 => |v| v as i64,
            u64 => |v| v as i64,
            u32 => |v| v as i64,
            i16 => |v| v as i64,
            u16 => |v| v as i64,
            u8 => |v| v as i64,
        ])
    }

    fn read_dense(&mut self, entry: &str, key: &str) -> Result<Array2<f32>> {
        read_first_matching!(self, entry, key, ndarray::Ix2, [
            f32 => |v| v,
            f64 => |v| v as f32,
            i64 => |v| v as f32,
            u8 => |v| v as f32,
            bool => |v| if v { 1.0 } else { 0.0 },
        ])
    }

    /// Reads the CSR matrix `<prefix>_*` (or `<prefix>.*`) if its data array is present
    fn read_csr(&mut self, prefix: &str) -> Result<Option<CsrParts>> {
        let Some((sep, data_entry)) = ["_", "."]
            .into_iter()
            .find_map(|sep| self.entry_of(&[format!("{prefix}{sep}data")]).map(|e| (sep, e)))
        else {
            return Ok(None);
        };

        let data = self.read_floats(&data_entry, &format!("{prefix}{sep}data"))?;
        let mut part = |name: &str| -> Result<Vec<i64>> {
            let key = format!("{prefix}{sep}{name}");
            let entry = self
                .entry_of(&[key.clone()])
                .ok_or_else(|| GraphError::MissingArray(key.clone()))?;
            Ok(self.read_integers(&entry, &key)?.to_vec())
        };

        Ok(Some(CsrParts {
            data: data.to_vec(),
            indices: part("indices")?,
            indptr: part("indptr")?,
            shape: part("shape")?,
        }))
    }
}

/// Reads a [`FlatGraph`] from an `.npz` archive. Keys outside of the schema are ignored.
pub fn read_npz<R: Read + Seek>(reader: R) -> Result<FlatGraph> {
    let mut npz = NpzEntries::new(reader)?;

    let mut matrices = MATRIX_PREFIXES
        .into_iter()
        .map(|prefix| npz.read_csr(prefix))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let (adj, attr, label_matrix) = (
        matrices.next().flatten(),
        matrices.next().flatten(),
        matrices.next().flatten(),
    );

    let attr_matrix = match npz.entry_of(&["attr_matrix".into()]) {
        Some(entry) if attr.is_none() => Some(npz.read_dense(&entry, "attr_matrix")?),
        _ => None,
    };

    let labels = match npz.entry_of(&["labels".into()]) {
        Some(entry) => Some(
            npz.read_integers(&entry, "labels")?
                .iter()
                .map(|&c| c as ClassId)
                .collect(),
        ),
        None => None,
    };

    for key in OBJECT_ARRAYS.into_iter().filter(|k| npz.contains(k)) {
        warn!("Skipping `{key}`: string and object arrays are not supported in .npz files");
    }
    debug!("Read .npz archive with entries {:?}", npz.entries.keys());

    Ok(FlatGraph {
        adj,
        attr,
        attr_matrix,
        labels,
        label_matrix,
        ..Default::default()
    })
}

fn write_csr<W: Write + Seek>(npz: &mut NpzWriter<W>, prefix: &str, parts: &CsrParts) -> Result<()> {
    npz.add_array(format!("{prefix}_data"), &Array1::from_vec(parts.data.clone()))?;
    npz.add_array(format!("{prefix}_indices"), &Array1::from_vec(parts.indices.clone()))?;
    npz.add_array(format!("{prefix}_indptr"), &Array1::from_vec(parts.indptr.clone()))?;
    npz.add_array(format!("{prefix}_shape"), &Array1::from_vec(parts.shape.clone()))?;
    Ok(())
}

/// Writes the numeric parts of a [`FlatGraph`] as an `.npz` archive
pub fn write_npz<W: Write + Seek>(writer: W, flat: &FlatGraph) -> Result<()> {
    let mut npz = NpzWriter::new(writer);

    for (prefix, parts) in MATRIX_PREFIXES
        .into_iter()
        .zip([&flat.adj, &flat.attr, &flat.label_matrix])
    {
        if let Some(parts) = parts {
            write_csr(&mut npz, prefix, parts)?;
        }
    }

    if let Some(dense) = &flat.attr_matrix {
        npz.add_array("attr_matrix", dense)?;
    }
    if let Some(labels) = &flat.labels {
        npz.add_array("labels", &Array1::from_vec(labels.clone()))?;
    }

    if flat.node_names.is_some()
        || flat.attr_names.is_some()
        || flat.class_names.is_some()
        || flat.metadata.is_some()
    {
        warn!("Names and metadata are not written to .npz files");
    }

    npz.finish()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use ndarray::array;

    use super::*;

    #[test]
    fn write_then_read() {
        let flat = FlatGraph {
            adj: Some(CsrParts {
                data: vec![1.0, 2.0],
                indices: vec![1, 0],
                indptr: vec![0, 1, 2],
                shape: vec![2, 2],
            }),
            attr_matrix: Some(array![[0.5f32, 0.0, 1.0], [1.0, 1.0, 0.0]]),
            labels: Some(vec![1, 0]),
            node_names: Some(vec!["a".into(), "b".into()]),
            ..Default::default()
        };

        let mut buffer = Cursor::new(Vec::new());
        write_npz(&mut buffer, &flat).unwrap();
        buffer.set_position(0);

        let read = read_npz(buffer).unwrap();
        assert_eq!(read.adj, flat.adj);
        assert_eq!(read.attr_matrix, flat.attr_matrix);
        assert_eq!(read.labels, flat.labels);
        assert_eq!(read.node_names, None);
    }

    #[test]
    fn other_dtypes_and_extra_keys() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut npz = NpzWriter::new(&mut buffer);
            npz.add_array("adj.data", &array![1.0f64, 1.0]).unwrap();
            npz.add_array("adj.indices", &array![1i32, 0]).unwrap();
            npz.add_array("adj.indptr", &array![0i32, 1, 2]).unwrap();
            npz.add_array("adj.shape", &array![2u64, 2]).unwrap();
            npz.add_array("labels", &array![3i32, 4]).unwrap();
            npz.add_array("edge_attr_matrix", &array![[1u8]]).unwrap();
            npz.finish().unwrap();
        }
        buffer.set_position(0);

        let graph = read_npz(buffer).unwrap().decode().unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.adjacency().data(), &[1.0, 1.0]);
        assert_eq!(graph.labels().map(|l| l.to_classes()), Some(vec![3, 4]));
    }

    #[test]
    fn unsupported_dtype() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut npz = NpzWriter::new(&mut buffer);
            npz.add_array("adj_data", &array![1.0f32]).unwrap();
            npz.add_array("adj_indices", &array![0.5f32]).unwrap();
            npz.add_array("adj_indptr", &array![0i64, 1]).unwrap();
            npz.add_array("adj_shape", &array![1i64, 1]).unwrap();
            npz.finish().unwrap();
        }
        buffer.set_position(0);

        assert!(matches!(
            read_npz(buffer),
            Err(GraphError::UnsupportedDtype { array }) if array == "adj_indices"
        ));
    }
}
