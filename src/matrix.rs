//! A rank-2 `f32` matrix, the single container every stage of the forward pass produces.

use crate::error::{Result, VitError};
use ndarray::{concatenate, Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Row-major 2D matrix. All rows have the same length; shape checks are explicit and
/// return [`VitError::ShapeMismatch`] instead of truncating or broadcasting.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f32>,
}

impl Matrix {
    /// Creates a matrix from row-major data.
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self> {
        let len = data.len();
        let data = Array2::from_shape_vec((rows, cols), data)
            .map_err(|_| VitError::shape_mismatch("matrix_new", rows * cols, len))?;
        Ok(Self { data })
    }

    /// Creates a matrix from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != m) {
            return Err(VitError::shape_mismatch("from_rows", m, bad.len()));
        }
        Self::new(rows.into_iter().flatten().collect(), n, m)
    }

    pub fn from_data(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_data(Array2::zeros((rows, cols)))
    }

    /// Creates a matrix with every entry set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self::from_data(Array2::from_elem((rows, cols), value))
    }

    /// Creates a matrix with entries drawn uniformly from `[low, high)`.
    pub fn rand<R: Rng + ?Sized>(rows: usize, cols: usize, low: f32, high: f32, rng: &mut R) -> Self {
        let dist = Uniform::new(low, high);
        Self::from_data(Array2::from_shape_simple_fn((rows, cols), || dist.sample(rng)))
    }

    /// Square identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_data(Array2::eye(n))
    }

    // --- Accessors ---
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.data.row(i)
    }
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.data.get((i, j)).copied()
    }

    /// Flattens the matrix in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    // --- Operations ---

    /// Computes `self · other`.
    ///
    /// `C[i][j] = Σ_t A[i][t]·B[t][j]`, accumulated in increasing `t`: each row of the output
    /// is built by adding `A[i][t] * B[t]` for `t = 0, 1, ...`.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        let (n, k) = self.shape();
        let (k_other, m) = other.shape();
        if k != k_other {
            return Err(VitError::shape_mismatch("matmul", (k, m), (k_other, m)));
        }

        let mut out = Array2::<f32>::zeros((n, m));
        for (a_row, mut out_row) in self.data.outer_iter().zip(out.outer_iter_mut()) {
            for (&a, b_row) in a_row.iter().zip(other.data.outer_iter()) {
                out_row.scaled_add(a, &b_row);
            }
        }
        Ok(Matrix::from_data(out))
    }

    /// Computes `self · otherᵀ` without materializing the transpose:
    /// `S[i][j] = Σ_t A[i][t]·B[j][t]`.
    pub fn matmul_transposed(&self, other: &Matrix) -> Result<Matrix> {
        let (n, k) = self.shape();
        let (m, k_other) = other.shape();
        if k != k_other {
            return Err(VitError::shape_mismatch("matmul_transposed", (m, k), (m, k_other)));
        }

        let mut out = Array2::<f32>::zeros((n, m));
        for ((i, j), value) in out.indexed_iter_mut() {
            let mut acc = 0.0f32;
            for (a, b) in self.data.row(i).iter().zip(other.data.row(j).iter()) {
                acc += a * b;
            }
            *value = acc;
        }
        Ok(Matrix::from_data(out))
    }

    /// Elementwise sum. Both operands must have the same shape.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(VitError::shape_mismatch("add", self.shape(), other.shape()));
        }
        Ok(Matrix::from_data(&self.data + &other.data))
    }

    /// Elementwise rectification, `max(0, x)`.
    pub fn relu(mut self) -> Matrix {
        self.data.mapv_inplace(|x| if x > 0.0 { x } else { 0.0 });
        self
    }

    /// Multiplies every entry by `factor`.
    pub fn scale(mut self, factor: f32) -> Matrix {
        self.data.mapv_inplace(|x| x * factor);
        self
    }

    /// Row-wise softmax.
    ///
    /// The row maximum is subtracted before exponentiating. The normalized result is the same
    /// as `exp(x) / Σ exp(x)` but large scores cannot overflow to `inf`.
    pub fn softmax_rows(mut self) -> Matrix {
        for mut row in self.data.outer_iter_mut() {
            let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        self
    }

    /// Returns a new matrix with `row` inserted at index 0.
    pub fn prepend_row(&self, row: &[f32]) -> Result<Matrix> {
        if row.len() != self.cols() {
            return Err(VitError::shape_mismatch("prepend_row", self.cols(), row.len()));
        }
        let head = ArrayView1::from(row).insert_axis(Axis(0));
        let data = concatenate(Axis(0), &[head, self.data.view()])
            .map_err(|e| VitError::shape_mismatch("prepend_row", self.shape(), e.to_string()))?;
        Ok(Matrix::from_data(data))
    }
}
