use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::catalog::ReferenceCatalog;
use crate::error::{read_json, ArtifactError};
use crate::normalize::normalize_code;

/// Row-major compressed sparse matrix (occupations × skills).
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl SparseMatrix {
    /// Builds a matrix from `(column, weight)` entries per row. Entries of the
    /// same column within a row are summed; zero entries are dropped.
    pub fn from_rows(rows: Vec<Vec<(usize, f32)>>, n_cols: usize) -> Result<Self, ArtifactError> {
        let n_rows = rows.len();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for (row_idx, mut row) in rows.into_iter().enumerate() {
            row.sort_by_key(|(col, _)| *col);

            let mut last_col: Option<usize> = None;
            for (col, weight) in row {
                if col >= n_cols {
                    return Err(ArtifactError::Shape(format!(
                        "row {row_idx} references column {col} but matrix has {n_cols} columns"
                    )));
                }
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ArtifactError::Shape(format!(
                        "row {row_idx} column {col} has invalid weight {weight}"
                    )));
                }
                if weight == 0.0 {
                    continue;
                }

                if last_col == Some(col) {
                    if let Some(last) = data.last_mut() {
                        *last += weight;
                    }
                } else {
                    indices.push(col);
                    data.push(weight);
                    last_col = Some(col);
                }
            }
            indptr.push(indices.len());
        }

        Ok(Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and weights of one row.
    pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
        let start = self.indptr[row];
        let end = self.indptr[row + 1];
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Scales every non-empty row to unit L2 norm.
    pub fn normalize_rows_l2(&mut self) {
        for row in 0..self.n_rows {
            let start = self.indptr[row];
            let end = self.indptr[row + 1];
            let slice = &mut self.data[start..end];
            let norm: f32 = slice.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in slice.iter_mut() {
                    *v /= norm;
                }
            }
        }
    }

    /// `q · Xᵀ` for a multi-hot query with the same `weight` on every column
    /// of `columns` (duplicates count once). Returns one score per row.
    pub fn dot_multi_hot(&self, columns: &[usize], weight: f32) -> Vec<f32> {
        let mut mask = vec![false; self.n_cols];
        for &col in columns {
            if col < self.n_cols {
                mask[col] = true;
            }
        }

        (0..self.n_rows)
            .map(|row| {
                let (cols, values) = self.row(row);
                cols.iter()
                    .zip(values)
                    .filter(|(col, _)| mask[**col])
                    .map(|(_, value)| value * weight)
                    .sum()
            })
            .collect()
    }
}

/// On-disk layout of the sparse bundle.
#[derive(Debug, Deserialize)]
struct SparseBundleFile {
    roms: Vec<String>,
    comp2j: HashMap<String, usize>,
    n_skills: usize,
    rows: Vec<Vec<(usize, f32)>>,
    #[serde(default)]
    rom_lbl: HashMap<String, String>,
    #[serde(default)]
    comp_lbl: HashMap<String, String>,
}

/// Everything the sparse scorer needs: the row-normalized matrix, the
/// occupation code of each row, the column of each skill and labels.
#[derive(Debug, Clone)]
pub struct SparseBundle {
    matrix: SparseMatrix,
    roms: Vec<String>,
    comp2j: HashMap<String, usize>,
    rom_lbl: HashMap<String, String>,
    comp_lbl: HashMap<String, String>,
}

impl SparseBundle {
    /// Assembles a bundle, canonicalizing codes and L2-normalizing rows.
    pub fn new(
        matrix: SparseMatrix,
        roms: Vec<String>,
        comp2j: HashMap<String, usize>,
        rom_lbl: HashMap<String, String>,
        comp_lbl: HashMap<String, String>,
    ) -> Result<Self, ArtifactError> {
        let (n_rows, n_cols) = matrix.shape();
        if roms.len() != n_rows {
            return Err(ArtifactError::Shape(format!(
                "{} occupation codes for {n_rows} matrix rows",
                roms.len()
            )));
        }
        if n_rows == 0 {
            return Err(ArtifactError::Empty("sparse bundle has no occupations".into()));
        }

        let mut entries: Vec<(String, usize)> = comp2j.into_iter().collect();
        entries.sort();

        let mut canonical_comp2j = HashMap::with_capacity(entries.len());
        for (code, col) in entries {
            if col >= n_cols {
                return Err(ArtifactError::Shape(format!(
                    "skill {code} maps to column {col} but matrix has {n_cols} columns"
                )));
            }
            let canonical = normalize_code(&code);
            match canonical_comp2j.get(&canonical) {
                Some(&existing) if existing != col => {
                    return Err(ArtifactError::Shape(format!(
                        "skill {canonical} maps to columns {existing} and {col}"
                    )));
                }
                Some(_) => {}
                None => {
                    canonical_comp2j.insert(canonical, col);
                }
            }
        }

        let mut matrix = matrix;
        matrix.normalize_rows_l2();

        Ok(Self {
            matrix,
            roms: roms.iter().map(|code| normalize_code(code)).collect(),
            comp2j: canonical_comp2j,
            rom_lbl: canonical_keys(rom_lbl),
            comp_lbl: canonical_keys(comp_lbl),
        })
    }

    /// Derives the sparse form from the reference catalog: one unit-weight
    /// entry per (occupation, skill) pair, columns following the skill index.
    pub fn from_catalog(catalog: &ReferenceCatalog) -> Result<Self, ArtifactError> {
        let vocab = catalog.vocabulary();
        let adjacency = catalog.job_skills();

        let rows = vocab
            .occupation_codes()
            .iter()
            .map(|occupation| {
                adjacency
                    .skills_of(occupation)
                    .iter()
                    .filter_map(|skill| vocab.skill_index(skill))
                    .map(|col| (col, 1.0))
                    .collect()
            })
            .collect();
        let matrix = SparseMatrix::from_rows(rows, vocab.skill_count())?;

        let comp2j = vocab
            .skill_codes()
            .iter()
            .enumerate()
            .map(|(idx, code)| (code.clone(), idx))
            .collect();
        let rom_lbl = vocab
            .occupation_codes()
            .iter()
            .map(|code| (code.clone(), vocab.occupation_label(code).to_string()))
            .collect();
        let comp_lbl = vocab
            .skill_codes()
            .iter()
            .map(|code| (code.clone(), vocab.skill_label(code).to_string()))
            .collect();

        Self::new(
            matrix,
            vocab.occupation_codes().to_vec(),
            comp2j,
            rom_lbl,
            comp_lbl,
        )
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    pub fn occupation_codes(&self) -> &[String] {
        &self.roms
    }

    pub fn skill_count(&self) -> usize {
        self.comp2j.len()
    }

    /// Matrix column of a canonical skill code.
    pub fn column_of(&self, code: &str) -> Option<usize> {
        self.comp2j.get(code).copied()
    }

    /// `(skill code, column)` pairs sorted by code.
    pub fn skill_columns(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<_> = self
            .comp2j
            .iter()
            .map(|(code, col)| (code.as_str(), *col))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn occupation_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.rom_lbl.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn skill_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.comp_lbl.get(code).map(String::as_str).unwrap_or(code)
    }
}

/// Canonicalizes label keys. Raw keys are visited in sorted order and the
/// first label of a canonical code wins.
fn canonical_keys(map: HashMap<String, String>) -> HashMap<String, String> {
    let mut entries: Vec<(String, String)> = map.into_iter().collect();
    entries.sort();

    let mut out = HashMap::with_capacity(entries.len());
    for (code, label) in entries {
        out.entry(normalize_code(&code)).or_insert(label);
    }
    out
}

/// Loads a sparse bundle from its JSON export.
pub fn load_sparse_bundle(path: &Path) -> Result<SparseBundle, ArtifactError> {
    let file: SparseBundleFile = read_json(path)?;
    let matrix = SparseMatrix::from_rows(file.rows, file.n_skills)?;
    let bundle = SparseBundle::new(matrix, file.roms, file.comp2j, file.rom_lbl, file.comp_lbl)?;

    let (rows, cols) = bundle.matrix().shape();
    info!(
        path = %path.display(),
        rows,
        cols,
        nnz = bundle.matrix().nnz(),
        "sparse bundle loaded"
    );

    Ok(bundle)
}
