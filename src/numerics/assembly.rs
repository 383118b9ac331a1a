use std::collections::BTreeMap;

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Last insertion mode used on a vector or matrix.
///
/// Overwrites must be flushed before additive contributions are mixed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertMode {
    #[default]
    NotSet,
    Insert,
    Add,
}

impl InsertMode {
    pub fn needs_flush(self) -> bool {
        self == InsertMode::Insert
    }
}

/// Residual vector as seen by a boundary condition.
pub trait ResidualVector {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, row: usize) -> f64;

    fn add_value(&mut self, row: usize, value: f64);

    fn set_value(&mut self, row: usize, value: f64);

    fn clear_row(&mut self, row: usize) {
        self.set_value(row, 0.0);
    }

    /// Flush pending insertions.
    fn assemble(&mut self) {}
}

impl ResidualVector for DVector<f64> {
    fn len(&self) -> usize {
        self.nrows()
    }

    fn value(&self, row: usize) -> f64 {
        self[row]
    }

    fn add_value(&mut self, row: usize, value: f64) {
        self[row] += value;
    }

    fn set_value(&mut self, row: usize, value: f64) {
        self[row] = value;
    }
}

/// Sparse Jacobian as seen by a boundary condition.
pub trait JacobianMatrix {
    fn dim(&self) -> usize;

    fn add(&mut self, row: usize, col: usize, value: f64);

    fn add_row(&mut self, row: usize, cols: &[usize], values: &[f64]) {
        for (&col, &value) in cols.iter().zip(values) {
            self.add(row, col, value);
        }
    }

    /// Values of `row` at the given columns; absent entries read as zero.
    fn get_row(&self, row: usize, cols: &[usize]) -> Vec<f64>;

    fn clear_row(&mut self, row: usize);

    /// Add every entry of `src` into `dst`. `src` is left untouched.
    fn move_row(&mut self, src: usize, dst: usize);

    /// Flush pending insertions.
    fn assemble(&mut self) {}
}

/// Row-major sparse matrix with one ordered map per row.
///
/// Rows can be read, cleared and relocated cheaply, which is what boundary
/// conditions need between bulk assembly and their own insertions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseJacobian {
    rows: Vec<BTreeMap<usize, f64>>,
}

impl SparseJacobian {
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); n],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(&col).copied().unwrap_or(0.0)
    }

    pub fn row(&self, row: usize) -> &BTreeMap<usize, f64> {
        &self.rows[row]
    }

    /// Number of stored entries, explicit zeros included.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let n = self.rows.len();
        let mut coo = CooMatrix::new(n, n);
        for (i, row) in self.rows.iter().enumerate() {
            for (&j, &v) in row {
                coo.push(i, j, v);
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl JacobianMatrix for SparseJacobian {
    fn dim(&self) -> usize {
        self.rows.len()
    }

    fn add(&mut self, row: usize, col: usize, value: f64) {
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    fn get_row(&self, row: usize, cols: &[usize]) -> Vec<f64> {
        cols.iter().map(|&col| self.get(row, col)).collect()
    }

    fn clear_row(&mut self, row: usize) {
        self.rows[row].clear();
    }

    fn move_row(&mut self, src: usize, dst: usize) {
        if src == dst {
            return;
        }
        let entries: Vec<(usize, f64)> = self.rows[src].iter().map(|(&c, &v)| (c, v)).collect();
        for (col, value) in entries {
            self.add(dst, col, value);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowMove {
    pub src: usize,
    pub dst: usize,
}

/// Row edits a boundary condition requests before inserting its own equations.
///
/// Moves are applied first (source added into destination), then every listed
/// row is zeroed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowEdits {
    pub clear: Vec<usize>,
    pub moves: Vec<RowMove>,
}

impl RowEdits {
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.moves.is_empty()
    }

    pub fn apply_to_residual<V: ResidualVector>(&self, f: &mut V) {
        for m in &self.moves {
            let value = f.value(m.src);
            f.add_value(m.dst, value);
        }
        for &row in &self.clear {
            f.clear_row(row);
        }
    }

    pub fn apply_to_jacobian<J: JacobianMatrix>(&self, jac: &mut J) {
        for m in &self.moves {
            jac.move_row(m.src, m.dst);
        }
        for &row in &self.clear {
            jac.clear_row(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_jacobian_accumulates() {
        let mut jac = SparseJacobian::new(3);
        jac.add(0, 1, 2.0);
        jac.add(0, 1, 0.5);
        jac.add_row(2, &[0, 2], &[1.0, -1.0]);

        assert_eq!(jac.get(0, 1), 2.5);
        assert_eq!(jac.get(1, 1), 0.0);
        assert_eq!(jac.get_row(2, &[2, 1, 0]), vec![-1.0, 0.0, 1.0]);
        assert_eq!(jac.nnz(), 3);

        let csr = jac.to_csr();
        assert_eq!(csr.nnz(), 3);
        assert_eq!(csr.nrows(), 3);
    }

    #[test]
    fn row_edits_move_before_clear() {
        let mut jac = SparseJacobian::new(4);
        jac.add_row(1, &[0, 1], &[3.0, 4.0]);
        jac.add_row(3, &[1, 3], &[1.0, 1.0]);

        let edits = RowEdits {
            clear: vec![1],
            moves: vec![RowMove { src: 1, dst: 3 }],
        };
        edits.apply_to_jacobian(&mut jac);

        assert!(jac.row(1).is_empty());
        assert_eq!(jac.get_row(3, &[0, 1, 3]), vec![3.0, 5.0, 1.0]);

        let mut f = DVector::from_vec(vec![0.0, 2.0, 0.0, 1.0]);
        edits.apply_to_residual(&mut f);
        assert_eq!(f.as_slice(), &[0.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn only_insert_requires_flush() {
        assert!(InsertMode::Insert.needs_flush());
        assert!(!InsertMode::Add.needs_flush());
        assert!(!InsertMode::NotSet.needs_flush());
    }
}
