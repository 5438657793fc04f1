//! Pearson correlation matrix over a joined frame.

use nalgebra::DMatrix;

use crate::analysis::join::JoinedFrame;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Symmetric, `labels.len()` square. NaN where a column has zero variance.
    pub values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[(i, j)])
    }
}

pub fn correlation_matrix(frame: &JoinedFrame) -> Result<CorrelationMatrix, AppError> {
    let n_rows = frame.dates.len();
    let n_cols = frame.columns.len();

    if n_cols < 2 {
        return Err(AppError::invalid("A correlation matrix needs at least two series."));
    }
    if n_rows < 2 {
        return Err(AppError::invalid(format!(
            "A correlation matrix needs at least two shared dates (got {n_rows})."
        )));
    }

    // Centering a constant column can leave rounding residue, so flatness is
    // decided on the raw values.
    let flat: Vec<bool> = frame
        .columns
        .iter()
        .map(|(_, values)| values.iter().all(|v| *v == values[0]))
        .collect();

    let mut x = DMatrix::from_fn(n_rows, n_cols, |r, c| frame.columns[c].1[r]);
    for mut col in x.column_iter_mut() {
        let mean = col.mean();
        col.add_scalar_mut(-mean);
    }

    // Scaling by 1/(n-1) cancels out in the ratio below.
    let cov = x.transpose() * &x;

    let values = DMatrix::from_fn(n_cols, n_cols, |i, j| {
        if i == j {
            return 1.0;
        }
        if flat[i] || flat[j] {
            return f64::NAN;
        }
        let denom = (cov[(i, i)] * cov[(j, j)]).sqrt();
        if denom > 0.0 {
            (cov[(i, j)] / denom).clamp(-1.0, 1.0)
        } else {
            f64::NAN
        }
    });

    Ok(CorrelationMatrix {
        labels: frame.labels(),
        values,
    })
}
