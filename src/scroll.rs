#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Turns raw scroll offsets into reversal events.
///
/// The stored offset and the stored direction move on different rules:
/// - same direction as the last *triggered* one: only the offset moves
/// - new direction while idle: both move and a reversal fires
/// - new direction while busy: nothing moves
///
/// TODO: confirm with product whether the busy branch should also move the
/// offset; until then the observed behaviour stays.
#[derive(Debug, Clone)]
pub struct ScrollReversalDetector {
    noise_floor: f64,
    last_offset: f64,
    last_direction: Option<Direction>,
}

impl ScrollReversalDetector {
    pub fn new(noise_floor: f64) -> Self {
        ScrollReversalDetector {
            noise_floor,
            last_offset: 0.0,
            last_direction: None,
        }
    }

    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Feed one `scrollTop` sample. `busy` is whether the effect this drives
    /// is still in flight. Returns the direction to fire, if any.
    pub fn sample(&mut self, offset: f64, busy: bool) -> Option<Direction> {
        if (offset - self.last_offset).abs() < self.noise_floor {
            return None;
        }

        let direction = if offset > self.last_offset {
            Direction::Down
        } else {
            Direction::Up
        };

        if self.last_direction == Some(direction) {
            self.last_offset = offset;
            return None;
        }

        // first accepted sample counts as a change
        if busy {
            return None;
        }
        self.last_offset = offset;
        self.last_direction = Some(direction);
        Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_accepted_sample_fires() {
        let mut detector = ScrollReversalDetector::new(5.0);
        assert_eq!(detector.sample(12.0, false), Some(Direction::Down));
        assert_eq!(detector.last_direction(), Some(Direction::Down));
        assert_eq!(detector.last_offset(), 12.0);
    }

    #[test]
    fn sub_noise_samples_change_nothing() {
        let mut detector = ScrollReversalDetector::new(5.0);
        for offset in [0.0, 4.9, -4.9, 3.0, 1.0] {
            assert_eq!(detector.sample(offset, false), None);
        }
        assert_eq!(detector.last_offset(), 0.0);
        assert_eq!(detector.last_direction(), None);
    }

    #[test]
    fn same_direction_moves_offset_only() {
        let mut detector = ScrollReversalDetector::new(5.0);
        detector.sample(10.0, false);
        assert_eq!(detector.sample(30.0, false), None);
        assert_eq!(detector.last_offset(), 30.0);
        assert_eq!(detector.last_direction(), Some(Direction::Down));
        assert_eq!(detector.sample(20.0, false), Some(Direction::Up));
    }

    #[test]
    fn busy_reversal_is_dropped_without_touching_state() {
        let mut detector = ScrollReversalDetector::new(5.0);
        detector.sample(100.0, false);
        assert_eq!(detector.sample(50.0, true), None);
        assert_eq!(detector.last_offset(), 100.0);
        assert_eq!(detector.last_direction(), Some(Direction::Down));
        // once idle the same sample is honoured
        assert_eq!(detector.sample(50.0, false), Some(Direction::Up));
    }

    #[test]
    fn busy_first_sample_does_not_fire() {
        let mut detector = ScrollReversalDetector::new(5.0);
        assert_eq!(detector.sample(10.0, true), None);
        assert_eq!(detector.last_direction(), None);
        assert_eq!(detector.sample(10.0, false), Some(Direction::Down));
    }
}
