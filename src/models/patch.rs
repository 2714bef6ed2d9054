use serde::{Deserialize, Deserializer};

/// One field of a partial update.
///
/// Presence in the payload, not the value, decides whether the stored field
/// changes. Nullable columns use `Patch<Option<T>>` so that an explicit
/// `null` clears the field while an omitted key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    /// Overwrite `target` when the field was present.
    pub fn apply(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }
}

// Only called for keys that are present; absent keys fall back to `Default`
// through `#[serde(default)]` on the containing struct.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}
