//! Particle system: binds a registry buffer as its position source and
//! selects a display mode.

/// Rendering style for particles. Affects only the particle renderer, never
/// the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleDisplayMode {
    Points,
    #[default]
    PointSpriteShaded,
}

/// Named particle system holding a *non-owning* reference (by registry key)
/// to the buffer that drives per-particle instanced rendering. The registry
/// owns the GPU memory; the system only records which buffer to read.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    name: String,
    count: u32,
    position_buffer: Option<String>,
    display_mode: ParticleDisplayMode,
    /// Sprite radius in world units.
    pub radius: f32,
}

impl ParticleSystem {
    pub fn new(name: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            count,
            position_buffer: None,
            display_mode: ParticleDisplayMode::default(),
            radius: 0.12,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Wire a registry buffer (by key) as the position source.
    pub fn set_position_buffer(&mut self, key: &str) {
        self.position_buffer = Some(key.to_string());
    }

    pub fn position_buffer(&self) -> Option<&str> {
        self.position_buffer.as_deref()
    }

    pub fn set_display_mode(&mut self, mode: ParticleDisplayMode) {
        self.display_mode = mode;
    }

    pub fn display_mode(&self) -> ParticleDisplayMode {
        self.display_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binder_holds_key_and_mode() {
        let mut ps = ParticleSystem::new("Particles", 10_000);
        assert!(ps.position_buffer().is_none());

        ps.set_position_buffer("particle_positions");
        ps.set_display_mode(ParticleDisplayMode::Points);

        assert_eq!(ps.position_buffer(), Some("particle_positions"));
        assert_eq!(ps.display_mode(), ParticleDisplayMode::Points);
        assert_eq!(ps.count(), 10_000);
    }
}
