use crate::error::BuildError;

/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Cell size is `1 << tile_bits` sub-cell units.
    pub tile_bits: u8,
    /// Distance travelled per frame by a moving actor, in sub-cell units.
    /// Must not exceed one cell so that no boundary is skipped.
    pub speed: i32,
    /// Deepest allowed chain of handlers dispatched from inside handlers.
    pub max_dispatch_depth: usize,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of direction offsets applied to a cursor.
    pub const MAX_OFFSETS: usize = 2;
    pub const MAX_TILE_BITS: u8 = 12;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TILE_BITS: u8 = 4;
    pub const DEFAULT_SPEED: i32 = 2;
    pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 8;

    pub fn new() -> Self {
        Self {
            tile_bits: Self::DEFAULT_TILE_BITS,
            speed: Self::DEFAULT_SPEED,
            max_dispatch_depth: Self::DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_tile_bits(mut self, tile_bits: u8) -> Self {
        self.tile_bits = tile_bits;
        self
    }

    #[must_use]
    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    pub fn cell_size(&self) -> i32 {
        1 << self.tile_bits
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.tile_bits == 0 || self.tile_bits > Self::MAX_TILE_BITS {
            return Err(BuildError::InvalidConfig("tile_bits must be in 1..=12"));
        }
        if self.speed < 1 || self.speed > self.cell_size() {
            return Err(BuildError::InvalidConfig(
                "speed must be between 1 and the cell size",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.cell_size(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_speed_that_skips_cells() {
        let config = EngineConfig::new().with_speed(17);
        assert!(matches!(config.validate(), Err(BuildError::InvalidConfig(_))));

        let config = EngineConfig::new().with_speed(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_tile_bits() {
        assert!(EngineConfig::new().with_tile_bits(0).validate().is_err());
        assert!(EngineConfig::new().with_tile_bits(13).validate().is_err());
        assert!(
            EngineConfig::new()
                .with_tile_bits(1)
                .with_speed(1)
                .validate()
                .is_ok()
        );
    }
}
