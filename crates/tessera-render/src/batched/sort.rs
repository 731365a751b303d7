//! Painter's-algorithm ordering.

/// Stable sort, farthest first (largest key first).
///
/// Items with equal keys keep their relative order, so at equal depth the item
/// submitted later is drawn later and ends up on top.
pub fn back_to_front<T>(items: &mut [T], key: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
}
