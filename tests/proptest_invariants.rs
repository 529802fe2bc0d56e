//! Property-based tests for the layout mapping, the comparator, and the
//! element representations.
//!
//! Uses proptest to verify invariants that must hold for all inputs:
//! - Layout offsets are injective and in-bounds
//! - Padding positions are disjoint from logical positions
//! - Comparator reflexivity and symmetry
//! - Quantized representation saturates, never wraps

use proptest::prelude::*;

use bnorm_verify::{nearly_equal, relative_deviation, Element, Layout, TensorShape};

fn arb_shape() -> impl Strategy<Value = TensorShape> {
    (1usize..4, 1usize..10, 1usize..3, 1usize..5, 1usize..5).prop_map(
        |(batch, channels, depth, height, width)| TensorShape {
            batch,
            channels,
            depth,
            height,
            width,
        },
    )
}

fn arb_layout(shape: TensorShape) -> impl Strategy<Value = Layout> {
    prop_oneof![
        Just(Layout::contiguous(&shape)),
        (2usize..=16).prop_map(move |block| Layout::channel_blocked(&shape, block)),
    ]
}

proptest! {
    // ═══════════════════════════════════════════════════════════════════
    // 1. Offsets over the padded channel extent cover the buffer exactly
    //    once: injective, in-bounds, and exhaustive.
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn offsets_are_a_bijection(case in arb_shape().prop_flat_map(|s| {
        arb_layout(s).prop_map(move |l| (s, l))
    })) {
        let (shape, layout) = case;
        let len = layout.buffer_len(&shape);
        let mut seen = vec![false; len];
        for n in 0..shape.batch {
            for c in 0..layout.padded_channels {
                for d in 0..shape.depth {
                    for h in 0..shape.height {
                        for w in 0..shape.width {
                            let off = layout.offset(&shape, n, c, d, h, w);
                            prop_assert!(off < len, "offset {} out of bounds {}", off, len);
                            prop_assert!(!seen[off], "offset {} visited twice", off);
                            seen[off] = true;
                        }
                    }
                }
            }
        }
        prop_assert!(seen.iter().all(|&s| s), "offsets must cover the buffer");
    }

    // ═══════════════════════════════════════════════════════════════════
    // 2. Comparator: reflexive for finite values, symmetric in its
    //    arguments, monotone in epsilon.
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn comparator_is_reflexive(v in -1e6f32..1e6, eps in 1e-8f32..1.0) {
        prop_assert!(nearly_equal(v, v, eps, 1e-2));
        prop_assert!(nearly_equal(v, v, eps, 1.0));
    }

    #[test]
    fn comparator_is_symmetric(a in -1e3f32..1e3, b in -1e3f32..1e3) {
        prop_assert_eq!(
            relative_deviation(a, b, 1e-2),
            relative_deviation(b, a, 1e-2)
        );
    }

    #[test]
    fn comparator_is_monotone_in_eps(a in -1e3f32..1e3, b in -1e3f32..1e3, eps in 1e-6f32..1e-1) {
        if nearly_equal(a, b, eps, 1e-2) {
            prop_assert!(nearly_equal(a, b, eps * 10.0, 1e-2));
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // 3. Quantized representation: always in range, saturating at the
    //    bounds, exact rounding inside them.
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn i8_represent_stays_in_range(v in -1e9f32..1e9) {
        let q = <i8 as Element>::represent(v);
        prop_assert!((-128.0..=127.0).contains(&q));
        prop_assert_eq!(q, q.round());
    }

    #[test]
    fn i8_represent_saturates_out_of_range(v in 128.0f32..1e9) {
        prop_assert_eq!(<i8 as Element>::represent(v), 127.0);
        prop_assert_eq!(<i8 as Element>::represent(-v), -128.0);
    }

    #[test]
    fn i8_represent_rounds_in_range(v in -127.4f32..127.4) {
        prop_assert_eq!(<i8 as Element>::represent(v), v.round());
    }

    #[test]
    fn f16_represent_is_idempotent(v in -1e4f32..1e4) {
        let once = <half::f16 as Element>::represent(v);
        prop_assert_eq!(once, <half::f16 as Element>::represent(once));
    }
}
