//! bnorm-verify: reference-computation checks for batch-normalization
//! primitives.
//!
//! Given the buffers an already-executed batch-normalization primitive
//! consumed and produced, this crate independently recomputes the expected
//! per-channel statistics, normalized output, and gradients, then asserts
//! agreement within a scale-adaptive, data-dependent tolerance:
//!
//! - **Two entry points**: [`verify_forward`] and [`verify_backward`], one
//!   per direction, parameterized by a [`NormConfig`] record
//! - **Layout-aware**: every access goes through a padded
//!   coordinate-to-offset [`Layout`] mapping (dense or channel-blocked)
//! - **Mixed precision**: f32, f16, and quantized i8 outputs via the
//!   [`Element`] trait with round+saturate semantics
//! - **Channel-parallel**: channels are independent work units on rayon's
//!   pool; violations are collected, never short-circuited
//!
//! # Quick Start
//!
//! ```ignore
//! use bnorm_verify::{verify_forward, ForwardRun, Layout, NormConfig, TensorShape};
//!
//! let shape = TensorShape::new_4d(2, 3, 4, 4);
//! let cfg = NormConfig {
//!     shape,
//!     data_layout: Layout::contiguous(&shape),
//!     diff_layout: Layout::contiguous(&shape),
//!     epsilon: 1e-5,
//!     compute_stats: true,
//!     with_scale_shift: false,
//!     training: true,
//! };
//! let run = ForwardRun { src, dst, mean, variance, scale: None, shift: None };
//! verify_forward(&cfg, &run)?; // Err carries per-element diagnostics
//! ```
//!
//! This crate does not implement batch normalization for production use:
//! it implements an independent second computation of the same result,
//! used purely to check the first.

pub mod backward;
pub mod compare;
pub mod error;
pub mod forward;
pub mod layout;
pub mod types;
pub mod validation;

pub use backward::verify_backward;
pub use compare::{
    nearly_equal, relative_deviation, Mismatch, TensorKind, FLOOR_OUTPUT, FLOOR_PARAM_GRAD,
    FLOOR_STATISTICS, ZERO_GRAD_BOUND,
};
pub use error::{VerifyError, VerifyResult};
pub use forward::verify_forward;
pub use layout::{verify_zero_padding, Layout, LayoutKind};
pub use types::{BackwardKind, BackwardRun, Element, ForwardRun, NormConfig, TensorShape};
