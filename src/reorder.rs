//! Reordering of ordered items (modules, lessons, questions).
//!
//! A move is applied to the local list right away, then the new positions are
//! written one item at a time. If a write fails, the local order and the
//! positions already written are put back.

use tracing::{debug, error, warn};

use crate::domain::LVError;
use crate::record::TableRow;

/// Persists the position of one item.
pub trait PositionSink {
    fn set_position(&mut self, id: &str, position: usize) -> Result<(), LVError>;
}

/// Remove the item at `from` and reinsert it at `to`. Returns false for out of range or no-op moves.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

/// Move `from` to `to` and persist the positions of every item between them.
///
/// `positions[idx]` is the stored position of `items[idx]` before the move. The
/// moved range takes over the same slots in its new order, so items outside the
/// list keep their places. Returns `Ok(false)` if nothing moved.
pub fn reorder<R: TableRow>(
    items: &mut Vec<R>,
    from: usize,
    to: usize,
    positions: &[usize],
    sink: &mut impl PositionSink,
) -> Result<bool, LVError> {
    if positions.len() != items.len() {
        return Err(LVError::PersistFailed(format!(
            "{} positions for {} items",
            positions.len(),
            items.len()
        )));
    }
    let original: Vec<String> = items.iter().map(|r| r.row_id()).collect();
    if !move_item(items, from, to) {
        return Ok(false);
    }
    debug!("Moved item {} from {} to {}", original[from], from, to);

    let (lo, hi) = (from.min(to), from.max(to));
    let mut written: Vec<String> = Vec::new();
    for idx in lo..=hi {
        let id = items[idx].row_id();
        if let Err(e) = sink.set_position(&id, positions[idx]) {
            error!("Saving position of {id} failed: {e}, rolling back");
            move_item(items, to, from);
            for done in written {
                let Some(old_idx) = original.iter().position(|o| *o == done) else {
                    continue;
                };
                if let Err(e) = sink.set_position(&done, positions[old_idx]) {
                    warn!("Restoring position of {done} failed: {e}");
                }
            }
            return Err(e);
        }
        written.push(id);
    }
    Ok(true)
}
