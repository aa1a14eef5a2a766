/*!
# IO

Reading and writing [`SparseGraph`]s from and to dataset files.

On disk, a graph is a flat mapping of named arrays (see [`FlatGraph`] for the schema):
CSR matrices are split into `<name>_data`, `<name>_indices`, `<name>_indptr` and
`<name>_shape`, everything else is stored as a plain array. Reading always goes through the
fixed schema and an explicit [`FlatGraph::decode`] step, which validates the parts.

## Formats

- **Npz**: NumPy `.npz` archives as used by common citation benchmarks (`cora_ml.npz`, ...).
  Only numeric arrays are supported.
- **Json**: the serde representation of [`FlatGraph`]; keeps names and metadata.

## Traits

- [`DatasetRead`] and [`DatasetWrite`] read/write a graph in a given [`DatasetFormat`],
- [`load_dataset`] and [`save_dataset`] resolve `<directory>/<name>.<extension>`.
*/

mod flat;
mod json;
mod npz;

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Seek, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{GraphError, Result},
    graph::SparseGraph,
};

pub use flat::*;
pub use json::*;
pub use npz::*;

/// Identifier for a dataset file format.
///
/// Currently supported:
/// - [`DatasetFormat::Npz`]
/// - [`DatasetFormat::Json`]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// NumPy archive of named arrays
    #[default]
    Npz,
    /// JSON document of the flat schema
    Json,
}

impl DatasetFormat {
    /// Returns the file extension (without leading dot)
    pub fn extension(&self) -> &'static str {
        match self {
            DatasetFormat::Npz => "npz",
            DatasetFormat::Json => "json",
        }
    }

    /// Returns `<directory>/<name>.<extension>`
    pub fn path_of<P: AsRef<Path>>(&self, name: &str, directory: P) -> PathBuf {
        directory
            .as_ref()
            .join(format!("{name}.{}", self.extension()))
    }
}

impl FromStr for DatasetFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().trim_start_matches('.') {
            "npz" => Ok(DatasetFormat::Npz),
            "json" => Ok(DatasetFormat::Json),
            _ => Err(GraphError::Usage(format!("Unknown DatasetFormat: {s}"))),
        }
    }
}

/// Trait for reading graphs when only a [`DatasetFormat`] is known.
pub trait DatasetRead: Sized {
    /// Reads a graph from the given reader according to the specified [`DatasetFormat`].
    ///
    /// # Errors
    /// Returns an error if the input cannot be parsed in the given format or does not
    /// describe a valid graph.
    fn try_from_reader<R>(reader: R, format: DatasetFormat) -> Result<Self>
    where
        R: BufRead + Seek;

    /// Reads a graph from the given file according to the specified [`DatasetFormat`].
    ///
    /// # Errors
    /// Returns [`GraphError::MissingFile`] if the file does not exist and otherwise the
    /// errors of [`DatasetRead::try_from_reader`].
    fn try_from_file<P>(path: P, format: DatasetFormat) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GraphError::MissingFile(path.to_path_buf()));
        }
        debug!("Reading {format:?} dataset from {}", path.display());
        Self::try_from_reader(BufReader::new(File::open(path)?), format)
    }
}

impl DatasetRead for SparseGraph {
    fn try_from_reader<R>(reader: R, format: DatasetFormat) -> Result<Self>
    where
        R: BufRead + Seek,
    {
        let flat = match format {
            DatasetFormat::Npz => read_npz(reader)?,
            DatasetFormat::Json => read_json(reader)?,
        };
        flat.decode()
    }
}

/// Trait for writing graphs when only a [`DatasetFormat`] is known.
pub trait DatasetWrite {
    /// Writes the graph to the given writer according to the specified [`DatasetFormat`].
    ///
    /// # Errors
    /// Returns an error if writing fails.
    fn try_write_to_writer<W>(&self, writer: W, format: DatasetFormat) -> Result<()>
    where
        W: Write + Seek;

    /// Writes the graph to the given file according to the specified [`DatasetFormat`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing fails.
    fn try_write_to_file<P>(&self, path: P, format: DatasetFormat) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let mut writer = BufWriter::new(File::create(path)?);
        self.try_write_to_writer(&mut writer, format)?;
        writer.flush()?;
        Ok(())
    }
}

impl DatasetWrite for SparseGraph {
    fn try_write_to_writer<W>(&self, writer: W, format: DatasetFormat) -> Result<()>
    where
        W: Write + Seek,
    {
        let flat = FlatGraph::from(self);
        match format {
            DatasetFormat::Npz => write_npz(writer, &flat),
            DatasetFormat::Json => write_json(writer, &flat),
        }
    }
}

/// Loads the dataset `<directory>/<name>.npz`.
///
/// Only numeric arrays are read from `.npz` archives: `node_names`, `attr_names`,
/// `class_names` and `metadata` entries are skipped with a warning, so the returned graph
/// carries no names or metadata. Use [`DatasetFormat::Json`] (see [`load_dataset_as`]) to
/// keep them.
///
/// # Errors
/// Returns [`GraphError::MissingFile`] if the file does not exist and otherwise the errors
/// of reading and decoding the archive.
pub fn load_dataset<P: AsRef<Path>>(name: &str, directory: P) -> Result<SparseGraph> {
    load_dataset_as(name, directory, DatasetFormat::Npz)
}

/// Loads the dataset `<directory>/<name>.<extension>` in the given format.
///
/// Names and metadata survive only [`DatasetFormat::Json`]; see [`load_dataset`].
pub fn load_dataset_as<P: AsRef<Path>>(
    name: &str,
    directory: P,
    format: DatasetFormat,
) -> Result<SparseGraph> {
    SparseGraph::try_from_file(format.path_of(name, directory), format)
}

/// Writes `graph` to `<directory>/<name>.<extension>` and returns the path
pub fn save_dataset<P: AsRef<Path>>(
    graph: &SparseGraph,
    name: &str,
    directory: P,
    format: DatasetFormat,
) -> Result<PathBuf> {
    let path = format.path_of(name, directory);
    graph.try_write_to_file(&path, format)?;
    debug!("Wrote {format:?} dataset to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod test {
    use ndarray::array;

    use super::*;
    use crate::{
        graph::{Attributes, Labels, SparseGraphParts},
        sparse::CsrMatrix,
        testing::*,
    };

    #[test]
    fn format_from_str() {
        assert_eq!("NPZ".parse::<DatasetFormat>().unwrap(), DatasetFormat::Npz);
        assert_eq!(".json".parse::<DatasetFormat>().unwrap(), DatasetFormat::Json);
        assert!("csv".parse::<DatasetFormat>().is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset("cora_ml", dir.path());
        assert!(
            matches!(result, Err(GraphError::MissingFile(path)) if path == dir.path().join("cora_ml.npz"))
        );
    }

    #[test]
    fn save_and_load_npz() {
        let dir = tempfile::tempdir().unwrap();
        let graph = SparseGraphParts::new(
            CsrMatrix::from_triplets((3, 3), [(0, 1, 1.0), (1, 0, 1.0), (1, 2, 0.5)]).unwrap(),
        )
        .attributes(Attributes::Sparse(
            CsrMatrix::from_dense(array![[1.0f32, 0.0], [0.0, 0.0], [0.0, 3.0]].view()).unwrap(),
        ))
        .labels(Labels::Classes(vec![0, 2, 1]))
        .build()
        .unwrap();

        let path = save_dataset(&graph, "tiny", dir.path(), DatasetFormat::Npz).unwrap();
        assert!(path.ends_with("tiny.npz"));
        assert_eq!(load_dataset("tiny", dir.path()).unwrap(), graph);
    }

    #[test]
    fn npz_drops_names() {
        let dir = tempfile::tempdir().unwrap();
        let graph = SparseGraphParts::new(
            CsrMatrix::from_triplets((2, 2), [(0, 1, 1.0), (1, 0, 1.0)]).unwrap(),
        )
        .node_names(names(2))
        .metadata(serde_json::json!({"source": "test"}))
        .build()
        .unwrap();

        save_dataset(&graph, "named", dir.path(), DatasetFormat::Npz).unwrap();
        let loaded = load_dataset("named", dir.path()).unwrap();
        assert_eq!(loaded.adjacency(), graph.adjacency());
        assert_eq!(loaded.node_names(), None);
        assert_eq!(loaded.metadata(), None);
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let graph = SparseGraphParts::new(
            random_graph(&mut rand::rng(), 12, 0.2, true)
                .into_parts()
                .adjacency,
        )
        .node_names(names(12))
        .class_names(vec!["a".into(), "b".into()])
        .build()
        .unwrap();

        save_dataset(&graph, "named", dir.path(), DatasetFormat::Json).unwrap();
        assert_eq!(
            load_dataset_as("named", dir.path(), DatasetFormat::Json).unwrap(),
            graph
        );
    }
}
