//! Popularity ranking

use crate::model::Illustration;
use std::cmp::Reverse;

/// Ranks `pool` by bookmark count, most bookmarked first, and keeps `max_items`
///
/// The sort is stable: illustrations with equal counts keep the order in which
/// the aggregator found them.
pub fn select(mut pool: Vec<Illustration>, max_items: usize) -> Vec<Illustration> {
    pool.sort_by_key(|illustration| Reverse(illustration.bookmark_count));
    pool.truncate(max_items);
    pool
}
