//! Arena configuration parameters.

/// Configuration for [`SafeArena`](crate::SafeArena).
///
/// Validated nowhere: zero sizes are legal and simply force growth on the
/// first allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SafeArenaConfig {
    /// Size in bytes of the POD group's first slab.
    ///
    /// Default: 4096.
    pub initial_pod_bytes: usize,

    /// Slot count of the first slab of each newly created typed group.
    ///
    /// Default: 64.
    pub initial_typed_slots: usize,
}

impl SafeArenaConfig {
    /// Default first POD slab size in bytes.
    pub const DEFAULT_INITIAL_POD_BYTES: usize = 4096;

    /// Default slot count for new typed groups.
    pub const DEFAULT_INITIAL_TYPED_SLOTS: usize = 64;
}

impl Default for SafeArenaConfig {
    fn default() -> Self {
        Self {
            initial_pod_bytes: Self::DEFAULT_INITIAL_POD_BYTES,
            initial_typed_slots: Self::DEFAULT_INITIAL_TYPED_SLOTS,
        }
    }
}

/// Configuration for [`MonotonicArena`](crate::MonotonicArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonotonicConfig {
    /// Size of each buffer in bytes.
    pub buffer_size: usize,
    /// Number of buffers. Fixed for the arena's lifetime.
    pub buffer_count: usize,
    /// Whether reset releases buffer storage (it is lazily re-allocated on
    /// the next use) instead of zeroing it in place.
    pub release_on_reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SafeArenaConfig::default();
        assert_eq!(config.initial_pod_bytes, 4096);
        assert_eq!(config.initial_typed_slots, 64);
    }
}
