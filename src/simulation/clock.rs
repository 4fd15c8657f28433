#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Clock {
    elapsed: f32,
    frames: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, delta: f32) -> f32 {
        self.elapsed += delta.max(0.);
        self.frames += 1;
        self.elapsed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_includes_the_current_frame() {
        let mut clock = Clock::new();
        assert_eq!(clock.tick(0.5), 0.5);
        assert_eq!(clock.tick(0.25), 0.75);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn never_runs_backwards() {
        let mut clock = Clock::new();
        clock.tick(1.);
        assert_eq!(clock.tick(-0.5), 1.);
        assert_eq!(clock.elapsed(), 1.);
    }
}
