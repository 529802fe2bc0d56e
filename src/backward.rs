//! Reference backward engine.
//!
//! Recomputes the per-channel parameter gradients and the input gradient
//! from the primitive's inputs and the forward-pass statistics, then
//! compares against the primitive's reported buffers. The forward
//! statistics are reused as supplied; they are never recomputed here.

use rayon::prelude::*;

use crate::compare::{
    compare_scalar, Mismatch, TensorKind, FLOOR_OUTPUT, FLOOR_PARAM_GRAD, ZERO_GRAD_BOUND,
};
use crate::error::{VerifyError, VerifyResult};
use crate::types::{BackwardKind, BackwardRun, Element, NormConfig};
use crate::validation;

/// Check a backward run of the primitive under test.
///
/// Gradients are full-precision; low-precision element types support only
/// the inference forward path. For a zero-element tensor in
/// parameter-gradient mode, the reported `diff_scale`/`diff_shift` must be
/// within [`ZERO_GRAD_BOUND`] of zero; no other comparison runs.
pub fn verify_backward(cfg: &NormConfig, run: &BackwardRun<'_>) -> VerifyResult<()> {
    validation::validate_backward_args(cfg, run).map_err(VerifyError::InvalidArguments)?;

    let shape = cfg.shape;
    if shape.element_count() == 0 {
        return check_empty_param_grads(cfg, run);
    }

    log::debug!(
        "backward check {}: kind={:?} compute_stats={} scale_shift={}",
        shape,
        run.kind,
        cfg.compute_stats,
        cfg.with_scale_shift
    );

    let eps_cmp = f32::BASE_TOLERANCE * shape.reduction_count() as f32;

    let mismatches: Vec<Mismatch> = (0..shape.channels)
        .into_par_iter()
        .flat_map_iter(|c| check_channel(cfg, run, c, eps_cmp))
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        log::warn!("backward check {} failed: {} mismatch(es)", shape, mismatches.len());
        Err(VerifyError::Tolerance {
            context: format!("backward check {}", shape),
            mismatches,
        })
    }
}

/// Zero-element tensors produce no gradient signal; whatever the primitive
/// reported for the parameter gradients must be (near-)zero.
fn check_empty_param_grads(cfg: &NormConfig, run: &BackwardRun<'_>) -> VerifyResult<()> {
    if run.kind != BackwardKind::DataAndParams {
        return Ok(());
    }
    let mut mismatches = Vec::new();
    if let (Some(dg), Some(db)) = (run.diff_scale, run.diff_shift) {
        for c in 0..cfg.shape.channels {
            if dg[c].abs() > ZERO_GRAD_BOUND {
                mismatches.push(Mismatch {
                    tensor: TensorKind::DiffScale,
                    channel: c,
                    coord: None,
                    expected: 0.0,
                    actual: dg[c],
                    relative: dg[c].abs(),
                });
            }
            if db[c].abs() > ZERO_GRAD_BOUND {
                mismatches.push(Mismatch {
                    tensor: TensorKind::DiffShift,
                    channel: c,
                    coord: None,
                    expected: 0.0,
                    actual: db[c],
                    relative: db[c].abs(),
                });
            }
        }
    }
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::Tolerance {
            context: format!("backward check {} (empty)", cfg.shape),
            mismatches,
        })
    }
}

fn check_channel(
    cfg: &NormConfig,
    run: &BackwardRun<'_>,
    c: usize,
    eps_cmp: f32,
) -> Vec<Mismatch> {
    let mut out = Vec::new();
    let shape = &cfg.shape;
    let data = &cfg.data_layout;
    let diff = &cfg.diff_layout;
    let n_reduce = shape.reduction_count() as f32;

    let mean = run.mean[c];
    let inv_std = 1.0 / (run.variance[c] + cfg.epsilon).sqrt();
    let gamma = match run.scale {
        Some(s) if cfg.with_scale_shift => s[c],
        _ => 1.0,
    };

    // Reduction pass: parameter gradients.
    let mut diff_scale = 0.0f32;
    let mut diff_shift = 0.0f32;
    for n in 0..shape.batch {
        for d in 0..shape.depth {
            for h in 0..shape.height {
                for w in 0..shape.width {
                    let s = run.src[data.offset(shape, n, c, d, h, w)];
                    let dd = run.diff_dst[diff.offset(shape, n, c, d, h, w)];
                    diff_scale += (s - mean) * dd;
                    diff_shift += dd;
                }
            }
        }
    }
    diff_scale *= inv_std;

    if run.kind == BackwardKind::DataAndParams {
        if let Some(reported) = run.diff_scale {
            out.extend(compare_scalar(
                TensorKind::DiffScale,
                c,
                None,
                reported[c],
                diff_scale,
                eps_cmp,
                FLOOR_PARAM_GRAD,
            ));
        }
        if let Some(reported) = run.diff_shift {
            out.extend(compare_scalar(
                TensorKind::DiffShift,
                c,
                None,
                reported[c],
                diff_shift,
                eps_cmp,
                FLOOR_PARAM_GRAD,
            ));
        }
    }

    // Elementwise pass: input gradient. The correction term only applies
    // when the forward statistics were computed from the batch.
    for n in 0..shape.batch {
        for d in 0..shape.depth {
            for h in 0..shape.height {
                for w in 0..shape.width {
                    let didx = diff.offset(shape, n, c, d, h, w);
                    let mut expected = run.diff_dst[didx];
                    if cfg.compute_stats {
                        let s = run.src[data.offset(shape, n, c, d, h, w)];
                        expected -= diff_shift / n_reduce
                            + (s - mean) * diff_scale * inv_std / n_reduce;
                    }
                    expected *= gamma * inv_std;
                    out.extend(compare_scalar(
                        TensorKind::DiffSrc,
                        c,
                        Some((n, d, h, w)),
                        run.diff_src[didx],
                        expected,
                        eps_cmp,
                        FLOOR_OUTPUT,
                    ));
                }
            }
        }
    }

    out
}
