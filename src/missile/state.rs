//! Typestates for the missile. A transition is only reachable through the
//! methods on the state it starts from:
//! - `Idle::launch` -> `Flying`
//! - `Flying::detonate` -> `Exploding`
//! - `Exploding::settle` -> `Idle`
use crate::scroll::Direction;

#[derive(Debug, Copy, Clone)]
pub struct Idle;

#[derive(Debug, Copy, Clone)]
pub struct Flying;

#[derive(Debug, Copy, Clone)]
pub struct Exploding;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Data carried across every state
pub struct MissileContext {
    pub direction: Option<Direction>,
    pub launches: u32,
}

#[derive(Debug, Copy, Clone)]
pub struct MissileState<S> {
    context: MissileContext,
    // type-level marker only, never read
    _state: S,
}

impl<S> MissileState<S> {
    pub fn context(&self) -> &MissileContext {
        &self.context
    }
}

impl MissileState<Idle> {
    pub fn new() -> Self {
        MissileState {
            context: MissileContext {
                direction: None,
                launches: 0,
            },
            _state: Idle,
        }
    }

    pub fn launch(self, direction: Direction) -> MissileState<Flying> {
        MissileState {
            context: self.context.aimed(direction),
            _state: Flying,
        }
    }
}

impl Default for MissileState<Idle> {
    fn default() -> Self {
        Self::new()
    }
}

impl MissileState<Flying> {
    pub fn detonate(self) -> MissileState<Exploding> {
        MissileState {
            context: self.context,
            _state: Exploding,
        }
    }
}

impl MissileState<Exploding> {
    pub fn settle(self) -> MissileState<Idle> {
        MissileState {
            context: self.context,
            _state: Idle,
        }
    }
}

impl MissileContext {
    fn aimed(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self.launches = self.launches.saturating_add(1);
        self
    }
}
