//! Form snapshot bounds and value comparison.
//!
//! The engine never interprets a snapshot's contents. It only needs to clone
//! it, compare it for structural equality, and serialize it for the draft
//! backup store, so the snapshot type is a generic parameter bounded by the
//! [`Snapshot`] trait.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Bounds the engine requires from the host's form snapshot type.
///
/// Blanket-implemented for every type that satisfies the bounds; hosts never
/// implement this by hand. `PartialEq` is expected to be the derived,
/// structural kind: the comparator relies on deep value equality, not
/// reference identity.
pub trait Snapshot: Clone + PartialEq + Serialize + DeserializeOwned {}

impl<T> Snapshot for T where T: Clone + PartialEq + Serialize + DeserializeOwned {}

/// Report whether the current snapshot is value-different from the previous
/// persisted one.
///
/// `None` for `previous` means nothing has been persisted yet, which counts
/// as changed so the first edit always triggers backup and scheduling. Pure;
/// no side effects.
pub fn changed<S: Snapshot>(previous: Option<&S>, current: &S) -> bool {
    match previous {
        Some(previous) => previous != current,
        None => true,
    }
}
