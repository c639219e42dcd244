// src/syntax/tables.rs

//! Static tables used by the syntax writers.
//!
//! Scan orders index a raster-ordered 4x4 or 8x8 coefficient grid
//! (`y * size + x`).

/// Up-right diagonal scan of a 4x4 grid.
pub const DIAG_SCAN_4X4: [u8; 16] = [0, 4, 1, 8, 5, 2, 12, 9, 6, 3, 13, 10, 7, 14, 11, 15];

/// Up-right diagonal scan of an 8x8 grid.
pub const DIAG_SCAN_8X8: [u8; 64] = [
    0, 8, 1, 16, 9, 2, 24, 17, 10, 3, 32, 25, 18, 11, 4, 40, 33, 26, 19, 12, 5, 48, 41, 34, 27,
    20, 13, 6, 56, 49, 42, 35, 28, 21, 14, 7, 57, 50, 43, 36, 29, 22, 15, 58, 51, 44, 37, 30, 23,
    59, 52, 45, 38, 31, 60, 53, 46, 39, 61, 54, 47, 62, 55, 63,
];

/// Default 4x4 scaling list (flat).
pub const QUANT_DEFAULT_4X4: [u8; 16] = [16; 16];

/// Default intra 8x8 scaling list, raster order.
pub const QUANT_INTRA_DEFAULT_8X8: [u8; 64] = [
    16, 16, 16, 16, 17, 18, 21, 24, //
    16, 16, 16, 16, 17, 19, 22, 25, //
    16, 16, 17, 18, 20, 22, 25, 29, //
    16, 16, 18, 21, 24, 27, 31, 36, //
    17, 17, 20, 24, 30, 35, 41, 47, //
    18, 19, 22, 27, 35, 44, 54, 65, //
    21, 22, 25, 31, 41, 54, 70, 88, //
    24, 25, 29, 36, 47, 65, 88, 115,
];

/// Default inter 8x8 scaling list, raster order.
pub const QUANT_INTER_DEFAULT_8X8: [u8; 64] = [
    16, 16, 16, 16, 17, 18, 20, 24, //
    16, 16, 16, 17, 18, 20, 24, 25, //
    16, 16, 17, 18, 20, 24, 25, 28, //
    16, 17, 18, 20, 24, 25, 28, 33, //
    17, 18, 20, 24, 25, 28, 33, 41, //
    18, 20, 24, 25, 28, 33, 41, 54, //
    20, 24, 25, 28, 33, 41, 54, 71, //
    24, 25, 28, 33, 41, 54, 71, 91,
];

/// DC value of every default 16x16 and 32x32 list.
pub const QUANT_DEFAULT_DC: u8 = 16;

/// Sample aspect ratios with a predefined `aspect_ratio_idc` (1..=16).
pub const SAR_TABLE: [(u16, u16, u8); 16] = [
    (1, 1, 1),
    (12, 11, 2),
    (10, 11, 3),
    (16, 11, 4),
    (40, 33, 5),
    (24, 11, 6),
    (20, 11, 7),
    (32, 11, 8),
    (80, 33, 9),
    (18, 11, 10),
    (15, 11, 11),
    (64, 33, 12),
    (160, 99, 13),
    (4, 3, 14),
    (3, 2, 15),
    (2, 1, 16),
];

/// `aspect_ratio_idc` signalling an explicit width and height.
pub const EXTENDED_SAR: u8 = 255;
