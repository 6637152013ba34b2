#![cfg(not(target_arch = "wasm32"))]

use nvme_compliance::boundary::{boundary_ids, MAX_IOQ_ID};
use proptest::prelude::*;

fn spaces() -> impl Strategy<Value = (u32, u32)> {
    prop_oneof![
        (1u32..=64).prop_flat_map(|max_id| (0..=max_id + 4, Just(max_id))),
        (0u32..=MAX_IOQ_ID + 1).prop_map(|max_supported| (max_supported, MAX_IOQ_ID)),
        (any::<u32>(), Just(u32::MAX)),
    ]
}

proptest! {
    #[test]
    fn output_is_deterministic((max_supported, max_id) in spaces()) {
        prop_assert_eq!(boundary_ids(max_supported, max_id), boundary_ids(max_supported, max_id));
    }

    #[test]
    fn ids_are_distinct_and_inside_the_space((max_supported, max_id) in spaces()) {
        let ids = boundary_ids(max_supported, max_id);
        for (i, id) in ids.iter().enumerate() {
            prop_assert!(*id >= 1 && *id <= max_id, "{} outside [1, {}]", id, max_id);
            prop_assert!(!ids[i + 1..].contains(id), "{} repeated", id);
        }
    }

    #[test]
    fn top_of_space_is_probed_last_exactly_once((max_supported, max_id) in spaces()) {
        prop_assume!(max_supported < max_id && max_id >= 2);
        let ids = boundary_ids(max_supported, max_id);
        prop_assert!(ids.len() >= 2);
        prop_assert_eq!(&ids[ids.len() - 2..], &[max_id - 1, max_id][..]);
    }

    #[test]
    fn saturated_space_never_probes_the_ceiling((max_supported, max_id) in spaces()) {
        prop_assume!(max_supported >= max_id);
        prop_assert!(!boundary_ids(max_supported, max_id).contains(&max_id));
    }

    #[test]
    fn every_threshold_above_the_supported_count_is_bracketed((max_supported, max_id) in spaces()) {
        let ids = boundary_ids(max_supported, max_id);
        let mut q = u64::from(max_supported) + 1;
        while q < u64::from(max_id) {
            for id in [q - 1, q, q + 1] {
                if id != 0 {
                    prop_assert!(ids.contains(&(id as u32)), "threshold {} missing {}", q, id);
                }
            }
            q <<= 1;
        }
    }
}

#[test]
fn ceiling_sixteen_with_one_supported() {
    let ids = boundary_ids(1, 16);
    for id in [2, 3, 4, 7, 8, 9, 15, 16] {
        assert!(ids.contains(&id), "missing {id}");
    }
    assert_eq!(ids.iter().filter(|&&id| id == 15).count(), 1);
    assert_eq!(ids.iter().filter(|&&id| id == 16).count(), 1);
    assert_eq!(ids[ids.len() - 2..], [15, 16]);
}

#[test]
fn ceiling_sixteen_saturated() {
    let ids = boundary_ids(16, 16);
    assert!(!ids.contains(&16));
    assert!(ids.is_empty());
}
