//! Property tests for the linearization map.

use proptest::prelude::*;

use crate::indexing::linearize_map;

fn arb_shape_and_layout() -> impl Strategy<Value = (Vec<i64>, Vec<usize>, Vec<u64>)> {
    (1usize..=4).prop_flat_map(|rank| {
        (
            proptest::collection::vec(1i64..=16, rank),
            Just((0..rank).collect::<Vec<usize>>()).prop_shuffle(),
            proptest::collection::vec(any::<u64>(), rank),
        )
    })
}

fn offsets_within(shape: &[i64], raw: &[u64]) -> Vec<i64> {
    shape.iter().zip(raw).map(|(&dim, &r)| (r % dim as u64) as i64).collect()
}

proptest! {
    #[test]
    fn matches_stride_dot_product((shape, layout, raw) in arb_shape_and_layout()) {
        let offsets = offsets_within(&shape, &raw);
        let map = linearize_map(&shape, &layout);

        // Manual physical strides: cumulative product minor-to-major.
        let mut strides = vec![0i64; shape.len()];
        let mut current = 1i64;
        for &d in &layout {
            strides[d] = current;
            current *= shape[d];
        }
        let expected: i64 = offsets.iter().zip(&strides).map(|(o, s)| o * s).sum();

        let evaluated = map.evaluate(&offsets).unwrap();
        prop_assert_eq!(evaluated.as_slice(), &[expected]);
    }

    #[test]
    fn in_bounds_offsets_stay_in_bounds((shape, layout, raw) in arb_shape_and_layout()) {
        let offsets = offsets_within(&shape, &raw);
        let map = linearize_map(&shape, &layout);
        let linear = map.evaluate(&offsets).unwrap()[0];
        let total: i64 = shape.iter().product();
        prop_assert!(0 <= linear && linear < total);
    }
}
