// src/syntax/scaling_list.rs

//! Quantization matrices and their predictive `scaling_list_data()` coding.
//!
//! Each matrix is either predicted (copied from the default list or from an
//! earlier matrix of the same size class) or sent explicitly as a chain of
//! wrapped DPCM deltas along the up-right diagonal scan.

use super::tables::{
    DIAG_SCAN_4X4, DIAG_SCAN_8X8, QUANT_DEFAULT_4X4, QUANT_DEFAULT_DC, QUANT_INTER_DEFAULT_8X8,
    QUANT_INTRA_DEFAULT_8X8,
};
use crate::bitstream::BitBuffer;
use crate::utils::error::{BitstreamError, Result};

/// Number of size classes: 4x4, 8x8, 16x16, 32x32.
pub const SCALING_LIST_SIZE_NUM: usize = 4;
/// Matrices per size class.
pub const SCALING_LIST_NUM: [usize; SCALING_LIST_SIZE_NUM] = [6, 6, 6, 2];
/// Coefficients of a full-size matrix per size class.
pub const SCALING_LIST_SIZE: [usize; SCALING_LIST_SIZE_NUM] = [16, 64, 256, 1024];
/// Coefficients actually signalled; larger classes are upsampled from 8x8.
pub const MAX_MATRIX_COEF_NUM: usize = 64;
/// First size class that carries a separate DC value.
pub const SCALING_LIST_16X16: usize = 2;

/// Number of coefficients stored (and signalled) for a size class.
#[inline]
pub fn coef_num(size_id: usize) -> usize {
    MAX_MATRIX_COEF_NUM.min(SCALING_LIST_SIZE[size_id])
}

/// Built-in default coefficients for a matrix slot, raster order.
pub fn default_coefficients(size_id: usize, matrix_id: usize) -> &'static [u8] {
    let intra = if size_id == 3 { matrix_id == 0 } else { matrix_id < 3 };
    match (size_id, intra) {
        (0, _) => &QUANT_DEFAULT_4X4[..],
        (_, true) => &QUANT_INTRA_DEFAULT_8X8[..],
        (_, false) => &QUANT_INTER_DEFAULT_8X8[..],
    }
}

/// One quantization matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingMatrix {
    /// 16 (4x4) or 64 (8x8 and upsampled classes) coefficients in raster order.
    pub coeffs: Vec<u8>,
    /// DC coefficient; only signalled for 16x16 and 32x32.
    pub dc: u8,
}

impl ScalingMatrix {
    /// The default matrix for a slot.
    pub fn default_for(size_id: usize, matrix_id: usize) -> Self {
        Self {
            coeffs: default_coefficients(size_id, matrix_id).to_vec(),
            dc: QUANT_DEFAULT_DC,
        }
    }

    /// A matrix with every coefficient (and DC) set to `value`.
    pub fn flat(size_id: usize, value: u8) -> Self {
        Self {
            coeffs: vec![value; coef_num(size_id)],
            dc: value,
        }
    }
}

/// The full set of matrices announced in the SPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingLists {
    pub enable: bool,
    matrices: [Vec<ScalingMatrix>; SCALING_LIST_SIZE_NUM],
}

impl Default for ScalingLists {
    /// Disabled, holding the default matrices.
    fn default() -> Self {
        Self {
            enable: false,
            matrices: std::array::from_fn(|size_id| {
                (0..SCALING_LIST_NUM[size_id])
                    .map(|matrix_id| ScalingMatrix::default_for(size_id, matrix_id))
                    .collect()
            }),
        }
    }
}

impl ScalingLists {
    /// Enabled, starting from the default matrices.
    pub fn enabled() -> Self {
        Self {
            enable: true,
            ..Default::default()
        }
    }

    /// Replaces one matrix.
    pub fn with_matrix(mut self, size_id: usize, matrix_id: usize, matrix: ScalingMatrix) -> Self {
        self.matrices[size_id][matrix_id] = matrix;
        self
    }

    #[inline]
    pub fn matrix(&self, size_id: usize, matrix_id: usize) -> &ScalingMatrix {
        &self.matrices[size_id][matrix_id]
    }

    pub fn validate(&self) -> Result<()> {
        for (size_id, class) in self.matrices.iter().enumerate() {
            for (matrix_id, matrix) in class.iter().enumerate() {
                if matrix.coeffs.len() != coef_num(size_id)
                    || matrix.coeffs.contains(&0)
                    || (size_id >= SCALING_LIST_16X16 && matrix.dc == 0)
                {
                    return Err(BitstreamError::InvalidConfig(format!(
                        "scaling matrix {}/{} must hold {} non-zero coefficients",
                        size_id,
                        matrix_id,
                        coef_num(size_id)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Finds the closest matrix this one can be predicted from.
    ///
    /// Candidates run from `matrix_id` down to 0. The candidate at
    /// `matrix_id` itself is the default list; lower ones are configured
    /// matrices. Only the first eight coefficients are compared, plus the DC
    /// value for the 16x16 and 32x32 classes.
    pub fn reference_for(&self, size_id: usize, matrix_id: usize) -> Option<usize> {
        let target = self.matrix(size_id, matrix_id);
        let n = 8usize.min(SCALING_LIST_SIZE[size_id]);
        (0..=matrix_id).rev().find(|&ref_id| {
            let (coeffs, dc) = if ref_id == matrix_id {
                (default_coefficients(size_id, ref_id), QUANT_DEFAULT_DC)
            } else {
                let candidate = self.matrix(size_id, ref_id);
                (candidate.coeffs.as_slice(), candidate.dc)
            };
            coeffs[..n] == target.coeffs[..n] && (size_id < SCALING_LIST_16X16 || dc == target.dc)
        })
    }
}

/// Wrapped DPCM deltas of `scanned` coefficients, starting from `seed`.
///
/// Each delta is `current - previous`, folded into `[-128, 127]`.
pub fn scaling_list_deltas(seed: i32, scanned: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut next_coef = seed;
    scanned
        .into_iter()
        .map(|coef| {
            let mut delta = coef - next_coef;
            next_coef = coef;
            if delta > 127 {
                delta -= 256;
            }
            if delta < -128 {
                delta += 256;
            }
            delta
        })
        .collect()
}

/// Writes `scaling_list_data()` for every size class and matrix.
pub fn write_scaling_list_data(stream: &mut BitBuffer, lists: &ScalingLists) {
    for size_id in 0..SCALING_LIST_SIZE_NUM {
        for matrix_id in 0..SCALING_LIST_NUM[size_id] {
            match lists.reference_for(size_id, matrix_id) {
                Some(ref_id) => {
                    stream.write_flag(false); // scaling_list_pred_mode_flag
                    stream.write_ue((matrix_id - ref_id) as u32);
                }
                None => {
                    stream.write_flag(true);
                    write_explicit_matrix(stream, size_id, lists.matrix(size_id, matrix_id));
                }
            }
        }
    }
}

fn write_explicit_matrix(stream: &mut BitBuffer, size_id: usize, matrix: &ScalingMatrix) {
    let scan: &[u8] = if size_id == 0 { &DIAG_SCAN_4X4[..] } else { &DIAG_SCAN_8X8[..] };
    let mut seed = 8;
    if size_id >= SCALING_LIST_16X16 {
        stream.write_se(matrix.dc as i32 - 8); // scaling_list_dc_coef_minus8
        seed = matrix.dc as i32;
    }
    let scanned = scan[..coef_num(size_id)]
        .iter()
        .map(|&pos| matrix.coeffs[pos as usize] as i32);
    for delta in scaling_list_deltas(seed, scanned) {
        stream.write_se(delta);
    }
}
