//! Coordinate-to-offset mapping for padded tensor layouts.
//!
//! Every buffer access in the reference engines goes through
//! [`Layout::offset`]; raw linear indexing is only valid before channel
//! padding is considered. Two physical arrangements exist: dense
//! channel-major order and channel-blocked order with the channel extent
//! padded up to a whole number of blocks.

use crate::compare::{Mismatch, TensorKind};
use crate::error::{VerifyError, VerifyResult};
use crate::types::{Element, TensorShape};

/// Physical ordering variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Dense channel-major order (`nc` / `nchw` / `ncdhw`); no channel
    /// padding.
    Contiguous,
    /// Channels grouped into blocks of `block` stored innermost
    /// (`nChw8c` / `nChw16c` / `nCdhw16c` family).
    ChannelBlocked { block: usize },
}

/// Physical arrangement of a logical `(n, c, d, h, w)` tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub kind: LayoutKind,
    /// Physical channel extent, `>=` the logical channel count. Offsets of
    /// channels in `channels..padded_channels` address the padding tail.
    pub padded_channels: usize,
}

impl Layout {
    /// Dense layout for `shape`; the physical channel extent equals the
    /// logical one.
    #[inline(always)]
    pub fn contiguous(shape: &TensorShape) -> Self {
        Self { kind: LayoutKind::Contiguous, padded_channels: shape.channels }
    }

    /// Channel-blocked layout for `shape` with the given block size; the
    /// channel extent is padded up to the next multiple of `block`.
    #[inline(always)]
    pub fn channel_blocked(shape: &TensorShape, block: usize) -> Self {
        debug_assert!(block > 0, "block size must be positive");
        let padded = (shape.channels + block - 1) / block * block;
        Self { kind: LayoutKind::ChannelBlocked { block }, padded_channels: padded }
    }

    /// Physical linear offset of logical coordinate `(n, c, d, h, w)`.
    ///
    /// Pure function of the coordinate and the layout. `c` may address the
    /// padding tail (`c < padded_channels`), which is how the zero-padding
    /// check walks positions no logical coordinate maps to.
    #[inline(always)]
    pub fn offset(
        &self,
        shape: &TensorShape,
        n: usize,
        c: usize,
        d: usize,
        h: usize,
        w: usize,
    ) -> usize {
        debug_assert!(n < shape.batch);
        debug_assert!(c < self.padded_channels);
        debug_assert!(d < shape.depth && h < shape.height && w < shape.width);
        match self.kind {
            LayoutKind::Contiguous => {
                (((n * self.padded_channels + c) * shape.depth + d) * shape.height + h)
                    * shape.width
                    + w
            }
            LayoutKind::ChannelBlocked { block } => {
                let cb = c / block;
                let cr = c % block;
                ((((n * (self.padded_channels / block) + cb) * shape.depth + d) * shape.height
                    + h)
                    * shape.width
                    + w)
                    * block
                    + cr
            }
        }
    }

    /// Required backing-buffer length, including channel padding.
    #[inline(always)]
    pub fn buffer_len(&self, shape: &TensorShape) -> usize {
        shape.batch * self.padded_channels * shape.depth * shape.height * shape.width
    }
}

/// Check that the channel-padding tail of `buf` is exactly zero.
///
/// Blocked layouts carry physical positions no logical coordinate maps to;
/// well-behaved primitives must leave them zeroed so downstream consumers
/// can treat whole blocks as valid data. Exact comparison, not
/// tolerance-based. No-op for layouts without padding.
pub fn verify_zero_padding<T: Element>(
    shape: &TensorShape,
    layout: &Layout,
    buf: &[T],
) -> VerifyResult<()> {
    if buf.len() != layout.buffer_len(shape) {
        return Err(VerifyError::InvalidArguments(format!(
            "buffer len {} != layout len {}",
            buf.len(),
            layout.buffer_len(shape)
        )));
    }
    if layout.padded_channels == shape.channels {
        return Ok(());
    }

    let mut mismatches = Vec::new();
    for n in 0..shape.batch {
        for c in shape.channels..layout.padded_channels {
            for d in 0..shape.depth {
                for h in 0..shape.height {
                    for w in 0..shape.width {
                        let v = buf[layout.offset(shape, n, c, d, h, w)].to_f32();
                        if v != 0.0 {
                            mismatches.push(Mismatch {
                                tensor: TensorKind::Padding,
                                channel: c,
                                coord: Some((n, d, h, w)),
                                expected: 0.0,
                                actual: v,
                                relative: v.abs(),
                            });
                        }
                    }
                }
            }
        }
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        log::warn!(
            "zero-padding check failed: {} nonzero tail element(s) in {} tensor",
            mismatches.len(),
            shape
        );
        Err(VerifyError::Tolerance {
            context: format!("zero-padding check {}", shape),
            mismatches,
        })
    }
}
