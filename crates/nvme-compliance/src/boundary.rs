//! Boundary identifiers for probing queue-identifier validation.
//!
//! Controllers validate queue ids with width/threshold comparisons, so the values around every
//! power-of-two threshold above the supported count (plus the very top of the id space) are the
//! ones that expose off-by-one acceptance bugs. Probing only those keeps a full sweep of the
//! 16-bit QID space down to a few dozen commands.

/// Largest queue identifier addressable by the 16-bit QID field.
pub const MAX_IOQ_ID: u32 = 0xffff;

/// Returns the boundary identifiers for a controller supporting `max_supported` ids out of the
/// space `[1, max_id]`.
///
/// Starting at `max_supported + 1` and doubling while the threshold stays within
/// `max_id + 1`, every threshold `q < max_id` contributes `q - 1`, `q` and `q + 1`. When
/// `max_supported < max_id`, `max_id - 1` and `max_id` are moved to the end so the top of the
/// space is always probed last. The result holds no duplicates and no zero id, and is a pure
/// function of its inputs.
pub fn boundary_ids(max_supported: u32, max_id: u32) -> Vec<u32> {
    let ceiling = u64::from(max_id);
    let mut ids: Vec<u32> = Vec::new();

    let mut q = u64::from(max_supported) + 1;
    while q <= ceiling + 1 {
        if q < ceiling {
            // q < max_id <= u32::MAX, so q + 1 still fits.
            for id in [q - 1, q, q + 1] {
                push_unique(&mut ids, id as u32);
            }
        }
        q <<= 1;
    }

    if max_supported < max_id {
        let top = [max_id - 1, max_id];
        ids.retain(|id| !top.contains(id));
        for id in top {
            push_unique(&mut ids, id);
        }
    }

    ids
}

/// [`boundary_ids`] over the full I/O queue id space.
pub fn illegal_queue_ids(max_supported: u32) -> Vec<u32> {
    boundary_ids(max_supported, MAX_IOQ_ID)
}

/// Whether a probe of `id` is worth logging at normal verbosity: only the low ids and the top of
/// the space are, the rest of a sweep logs at trace level.
pub fn is_notable_id(id: u32, max_id: u32) -> bool {
    id <= 8 || id >= max_id.saturating_sub(8)
}

fn push_unique(ids: &mut Vec<u32>, id: u32) {
    if id != 0 && !ids.contains(&id) {
        ids.push(id);
    }
}
