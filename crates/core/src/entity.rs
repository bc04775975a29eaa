//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inventory items are entities: a stock change keeps the same item, and
/// stores key their records by `id()`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing revision of the entity's persisted state.
    ///
    /// Stores bump this on every successful write; callers hand it back as an
    /// [`ExpectedVersion`](crate::ExpectedVersion) to detect lost updates.
    fn version(&self) -> u64;
}
