//! Overflow policies applied when a bounded buffer cannot take a write.
//!
//! The same four symbols are resolved once per session for each buffering
//! layer; their effect depends on the layer:
//!
//! | policy    | local ring buffer                     | shared slice                       |
//! |-----------|---------------------------------------|------------------------------------|
//! | `Skip`    | drop the new event                    | drop the flush, write nothing      |
//! | `Replace` | evict the oldest event                | rewind the cursor to slice start   |
//! | `Flush`   | drain the buffer to the shared slice  | *rejected as a configuration error*|
//! | `Destroy` | drain, then erase the whole buffer    | rewind and zero the whole slice    |

use serde::{Deserialize, Serialize};

/// Behavior selected when a bounded buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Ignore the new data.
    Skip,
    /// Overwrite the oldest data.
    #[default]
    Replace,
    /// Drain to the next layer.
    Flush,
    /// Drain (where possible) and erase.
    Destroy,
}

/// Buffering layer a policy is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyLayer {
    /// Per-core ring buffer in private memory.
    LocalBuffer,
    /// Per-core slice of the shared segment.
    SharedSlice,
}

impl OverflowPolicy {
    /// Whether this policy has a defined meaning at `layer`.
    #[inline]
    pub const fn is_supported_on(self, layer: PolicyLayer) -> bool {
        !matches!((self, layer), (Self::Flush, PolicyLayer::SharedSlice))
    }
}
