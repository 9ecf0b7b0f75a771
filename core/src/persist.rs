use crate::collection::Collection;
use crate::index::{IndexKind, IndexSnapshot};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub kind: IndexKind,
    /// Tokenizer settings the documents were indexed with; queries must match.
    #[serde(default)]
    pub stem: bool,
    #[serde(default)]
    pub remove_stopwords: bool,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn collection(&self) -> PathBuf { self.root.join("collection.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    f.flush()?;
    Ok(())
}

fn read_bincode<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_index(paths: &IndexPaths, index: &IndexSnapshot) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.index(), index)
}

pub fn load_index(paths: &IndexPaths) -> Result<IndexSnapshot> { read_bincode(&paths.index()) }

pub fn save_collection(paths: &IndexPaths, collection: &Collection) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.collection(), collection)
}

pub fn load_collection(paths: &IndexPaths) -> Result<Collection> { read_bincode(&paths.collection()) }

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Everything a query front end needs from an index directory.
pub fn load_all(paths: &IndexPaths) -> Result<(IndexSnapshot, Collection, MetaFile)> {
    let meta = load_meta(paths)?;
    let index = load_index(paths)?;
    let collection = load_collection(paths)?;
    Ok((index, collection, meta))
}

/// Writes one score per line, line `i` holding node `i`.
pub fn write_scores<P: AsRef<Path>>(path: P, scores: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let mut w = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    for s in scores {
        writeln!(w, "{s}")?;
    }
    w.flush()?;
    Ok(())
}

/// Reads the first `n` scores of a score file.
pub fn read_scores<P: AsRef<Path>>(path: P, n: usize) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening score file {}", path.display()))?;
    let mut scores = Vec::with_capacity(n);
    for (lineno, line) in BufReader::new(f).lines().take(n).enumerate() {
        let line = line?;
        let s: f64 = line
            .trim()
            .parse()
            .with_context(|| format!("{}:{}: not a number: {line:?}", path.display(), lineno + 1))?;
        scores.push(s);
    }
    if scores.len() < n {
        bail!("{} holds {} scores, expected {n}", path.display(), scores.len());
    }
    Ok(scores)
}
