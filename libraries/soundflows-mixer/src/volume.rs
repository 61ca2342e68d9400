//! Linear gain helpers and master volume with mute

/// Clamp a gain to `[0, 1]`; NaN becomes silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Volume restored by unmute when nothing was recorded at mute time
pub const UNMUTE_FALLBACK: f32 = 0.5;

/// Master output level
///
/// Muting drops the level to zero and remembers the previous level so
/// unmuting can restore it. A level of zero counts as muted whether it was
/// reached through `mute` or by setting it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterVolume {
    /// Linear gain (0.0-1.0)
    level: f32,

    /// Level before the last mute
    previous: Option<f32>,
}

impl MasterVolume {
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_volume(level),
            previous: None,
        }
    }

    /// Set the level, returning the clamped value
    pub fn set_level(&mut self, level: f32) -> f32 {
        self.level = clamp_volume(level);
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.level <= 0.0
    }

    /// Drop to silence, remembering the current level
    pub fn mute(&mut self) {
        if !self.is_muted() {
            self.previous = Some(self.level);
            self.level = 0.0;
        }
    }

    /// Restore the level recorded by the last mute
    pub fn unmute(&mut self) {
        if self.is_muted() {
            self.level = self.previous.take().unwrap_or(UNMUTE_FALLBACK);
        }
    }

    /// Mute when audible, unmute when silent
    pub fn toggle_mute(&mut self) {
        if self.is_muted() {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Volume as a whole percentage (0-100)
    pub fn percent(&self) -> u8 {
        volume_percent(self.level)
    }
}

impl Default for MasterVolume {
    fn default() -> Self {
        Self::new(0.8)
    }
}

/// Linear gain to a rounded percentage
pub fn volume_percent(volume: f32) -> u8 {
    (clamp_volume(volume) * 100.0).round() as u8
}
