//! Precondition checks for verification runs.
//!
//! All helpers return `Result<(), String>` so callers can map failures
//! into their own error type; the engines wrap them in
//! [`crate::error::VerifyError::InvalidArguments`]. Every check runs
//! before any computation.

use crate::layout::{Layout, LayoutKind};
use crate::types::{BackwardKind, BackwardRun, Element, ForwardRun, NormConfig, TensorShape};

/// Validate a buffer length against its layout-derived expectation.
#[inline]
pub fn validate_buffer_len(actual: usize, expected: usize, name: &str) -> Result<(), String> {
    if actual != expected {
        return Err(format!("{} len {} != expected {}", name, actual, expected));
    }
    Ok(())
}

/// Validate a per-channel buffer (statistics, affine params, gradients).
#[inline]
pub fn validate_per_channel(
    buf: Option<&[f32]>,
    channels: usize,
    required: bool,
    name: &str,
) -> Result<(), String> {
    match buf {
        Some(b) => validate_buffer_len(b.len(), channels, name),
        None if required => Err(format!("{} buffer is required but absent", name)),
        None => Ok(()),
    }
}

/// Validate a layout's internal consistency against a shape.
pub fn validate_layout(layout: &Layout, shape: &TensorShape, name: &str) -> Result<(), String> {
    if layout.padded_channels < shape.channels {
        return Err(format!(
            "{}: padded channel extent {} < logical channels {}",
            name, layout.padded_channels, shape.channels
        ));
    }
    match layout.kind {
        LayoutKind::Contiguous => {
            if layout.padded_channels != shape.channels {
                return Err(format!(
                    "{}: contiguous layout cannot pad channels ({} != {})",
                    name, layout.padded_channels, shape.channels
                ));
            }
        }
        LayoutKind::ChannelBlocked { block } => {
            if block == 0 {
                return Err(format!("{}: zero channel block", name));
            }
            if layout.padded_channels % block != 0 {
                return Err(format!(
                    "{}: padded channel extent {} not a multiple of block {}",
                    name, layout.padded_channels, block
                ));
            }
        }
    }
    Ok(())
}

/// Validate the configuration itself: epsilon and both layouts.
pub fn validate_config(cfg: &NormConfig) -> Result<(), String> {
    if !cfg.epsilon.is_finite() || cfg.epsilon < 0.0 {
        return Err(format!("epsilon {} must be finite and non-negative", cfg.epsilon));
    }
    validate_layout(&cfg.data_layout, &cfg.shape, "data layout")?;
    validate_layout(&cfg.diff_layout, &cfg.shape, "diff layout")?;
    Ok(())
}

/// Validate a forward run against its configuration.
pub fn validate_forward_args<T: Element>(
    cfg: &NormConfig,
    run: &ForwardRun<'_, T>,
) -> Result<(), String> {
    validate_config(cfg)?;

    if T::QUANTIZED && (cfg.training || cfg.compute_stats) {
        return Err(
            "quantized elements support only inference with supplied statistics".to_string()
        );
    }

    let data_len = cfg.data_layout.buffer_len(&cfg.shape);
    validate_buffer_len(run.src.len(), data_len, "src")?;
    validate_buffer_len(run.dst.len(), data_len, "dst")?;

    // Statistics are supplied inputs in global-stats mode and reported
    // outputs in training mode; inference with computed statistics never
    // exposes them.
    let stats_required = !cfg.compute_stats || cfg.training;
    let channels = cfg.shape.channels;
    validate_per_channel(run.mean, channels, stats_required, "mean")?;
    validate_per_channel(run.variance, channels, stats_required, "variance")?;
    validate_per_channel(run.scale, channels, cfg.with_scale_shift, "scale")?;
    validate_per_channel(run.shift, channels, cfg.with_scale_shift, "shift")?;
    Ok(())
}

/// Validate a backward run against its configuration.
pub fn validate_backward_args(cfg: &NormConfig, run: &BackwardRun<'_>) -> Result<(), String> {
    validate_config(cfg)?;

    let data_len = cfg.data_layout.buffer_len(&cfg.shape);
    let diff_len = cfg.diff_layout.buffer_len(&cfg.shape);
    validate_buffer_len(run.src.len(), data_len, "src")?;
    validate_buffer_len(run.diff_dst.len(), diff_len, "diff_dst")?;
    validate_buffer_len(run.diff_src.len(), diff_len, "diff_src")?;

    let channels = cfg.shape.channels;
    validate_buffer_len(run.mean.len(), channels, "mean")?;
    validate_buffer_len(run.variance.len(), channels, "variance")?;
    validate_per_channel(run.scale, channels, cfg.with_scale_shift, "scale")?;

    let wants_params = run.kind == BackwardKind::DataAndParams;
    validate_per_channel(run.diff_scale, channels, wants_params, "diff_scale")?;
    validate_per_channel(run.diff_shift, channels, wants_params, "diff_shift")?;
    Ok(())
}
