//! Ray State

use std::fmt;

/// State of a ray slot. Every slot is in exactly one state at a pass boundary.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RayState {
    /// No work left for the slot in this tile. Terminal.
    #[default]
    Inactive = 0,

    /// A new camera ray was generated and waits for its first intersection.
    Regenerated = 1,

    /// The path is being traced.
    Active = 2,

    /// The last ray left the scene.
    HitBackground = 3,

    /// The path is finished and its radiance must be written to the output.
    UpdateBuffer = 4,

    /// The sample was written and the slot needs new work.
    ToRegenerate = 5,
}

impl RayState {
    /// All states in transition order.
    pub const ALL: [RayState; 6] = [
        Self::Inactive,
        Self::Regenerated,
        Self::Active,
        Self::HitBackground,
        Self::UpdateBuffer,
        Self::ToRegenerate,
    ];

    /// Convert the stored representation back into a state.
    ///
    /// * `v` - Stored value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    /// Returns true if the slot belongs in the active queue.
    pub fn is_active_or_regenerated(&self) -> bool {
        matches!(self, Self::Active | Self::Regenerated)
    }

    /// Returns true if the slot belongs in the background/buffer update queue.
    pub fn needs_buffer_update(&self) -> bool {
        matches!(self, Self::HitBackground | Self::UpdateBuffer | Self::ToRegenerate)
    }
}

impl fmt::Display for RayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inactive => "INACTIVE",
            Self::Regenerated => "REGENERATED",
            Self::Active => "ACTIVE",
            Self::HitBackground => "HIT_BACKGROUND",
            Self::UpdateBuffer => "UPDATE_BUFFER",
            Self::ToRegenerate => "TO_REGENERATE",
        };
        f.write_str(s)
    }
}
