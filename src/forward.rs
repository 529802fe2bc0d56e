//! Reference forward engine.
//!
//! Recomputes per-channel mean, variance, and the normalized (optionally
//! affine) output from the primitive's own inputs, then compares against
//! the primitive's reported buffers. Channels are independent work units;
//! each runs on the rayon pool with local accumulators only.

use rayon::prelude::*;

use crate::compare::{compare_scalar, Mismatch, TensorKind, FLOOR_OUTPUT, FLOOR_STATISTICS};
use crate::error::{VerifyError, VerifyResult};
use crate::types::{Element, ForwardRun, NormConfig};
use crate::validation;

/// Check a forward run of the primitive under test.
///
/// Passes iff every recomputed value agrees with the primitive's output
/// within the scale-adaptive tolerance `T::BASE_TOLERANCE * N`, where `N`
/// is the per-channel reduction size. In training mode with computed
/// statistics the reported mean/variance are checked as well; a
/// zero-element tensor passes trivially.
pub fn verify_forward<T: Element>(cfg: &NormConfig, run: &ForwardRun<'_, T>) -> VerifyResult<()> {
    validation::validate_forward_args(cfg, run).map_err(VerifyError::InvalidArguments)?;

    let shape = cfg.shape;
    if shape.element_count() == 0 {
        return Ok(());
    }

    log::debug!(
        "forward check {}: training={} compute_stats={} scale_shift={}",
        shape,
        cfg.training,
        cfg.compute_stats,
        cfg.with_scale_shift
    );

    let eps_cmp = T::BASE_TOLERANCE * shape.reduction_count() as f32;

    // Statistics are supplied inputs in global-stats mode; in training
    // mode with computed statistics they are primitive outputs to check.
    let supplied = if !cfg.compute_stats {
        match (run.mean, run.variance) {
            (Some(m), Some(v)) => Some((m, v)),
            _ => None,
        }
    } else {
        None
    };
    let reported = if cfg.compute_stats && cfg.training {
        match (run.mean, run.variance) {
            (Some(m), Some(v)) => Some((m, v)),
            _ => None,
        }
    } else {
        None
    };

    let mismatches: Vec<Mismatch> = (0..shape.channels)
        .into_par_iter()
        .flat_map_iter(|c| check_channel(cfg, run, supplied, reported, c, eps_cmp))
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        log::warn!("forward check {} failed: {} mismatch(es)", shape, mismatches.len());
        Err(VerifyError::Tolerance {
            context: format!("forward check {}", shape),
            mismatches,
        })
    }
}

fn check_channel<T: Element>(
    cfg: &NormConfig,
    run: &ForwardRun<'_, T>,
    supplied: Option<(&[f32], &[f32])>,
    reported: Option<(&[f32], &[f32])>,
    c: usize,
    eps_cmp: f32,
) -> Vec<Mismatch> {
    let mut out = Vec::new();
    let shape = &cfg.shape;
    let lay = &cfg.data_layout;
    let n_reduce = shape.reduction_count() as f32;

    let (mean, variance) = match supplied {
        Some((m, v)) => (m[c], v[c]),
        None => {
            // Pass 1: mean.
            let mut sum = 0.0f32;
            for n in 0..shape.batch {
                for d in 0..shape.depth {
                    for h in 0..shape.height {
                        for w in 0..shape.width {
                            sum += run.src[lay.offset(shape, n, c, d, h, w)].to_f32();
                        }
                    }
                }
            }
            let mean = sum / n_reduce;
            if let Some((rm, _)) = reported {
                out.extend(compare_scalar(
                    TensorKind::Mean,
                    c,
                    None,
                    rm[c],
                    mean,
                    eps_cmp,
                    FLOOR_STATISTICS,
                ));
            }

            // Pass 2: variance; depends on the finalized mean.
            let mut sum_sq = 0.0f32;
            for n in 0..shape.batch {
                for d in 0..shape.depth {
                    for h in 0..shape.height {
                        for w in 0..shape.width {
                            let t = run.src[lay.offset(shape, n, c, d, h, w)].to_f32() - mean;
                            sum_sq += t * t;
                        }
                    }
                }
            }
            let variance = sum_sq / n_reduce;
            if let Some((_, rv)) = reported {
                out.extend(compare_scalar(
                    TensorKind::Variance,
                    c,
                    None,
                    rv[c],
                    variance,
                    eps_cmp,
                    FLOOR_STATISTICS,
                ));
            }
            (mean, variance)
        }
    };

    let inv_std = 1.0 / (variance + cfg.epsilon).sqrt();
    let affine = if cfg.with_scale_shift {
        match (run.scale, run.shift) {
            (Some(s), Some(b)) => Some((s[c], b[c])),
            _ => None,
        }
    } else {
        None
    };
    let out_floor = if T::QUANTIZED { 1.0 } else { FLOOR_OUTPUT };

    for n in 0..shape.batch {
        for d in 0..shape.depth {
            for h in 0..shape.height {
                for w in 0..shape.width {
                    let idx = lay.offset(shape, n, c, d, h, w);
                    let normalized = (run.src[idx].to_f32() - mean) * inv_std;
                    let tmp_dst = match affine {
                        Some((gamma, beta)) => gamma * normalized + beta,
                        None => normalized,
                    };
                    let expected = T::represent(tmp_dst);
                    out.extend(compare_scalar(
                        TensorKind::Output,
                        c,
                        Some((n, d, h, w)),
                        run.dst[idx].to_f32(),
                        expected,
                        eps_cmp,
                        out_floor,
                    ));
                }
            }
        }
    }

    out
}
