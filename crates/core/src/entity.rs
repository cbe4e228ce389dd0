//! Entity trait: identity + continuity across state changes.

/// Reference data with a stable identity (vehicles, employees).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
