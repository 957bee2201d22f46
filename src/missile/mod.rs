pub mod state;

use self::state::{Exploding, Flying, Idle, MissileContext, MissileState};
use crate::config::MissileOptions;
use crate::engine::{self, Mutation, Scheduler, Stage, Target};
use crate::scroll::Direction;
use std::cell::Cell;
use std::rc::Rc;

mod html {
    pub const MISSILE_ID: &str = "missile";
    pub const CONTAINER_ID: &str = "missile-container";
    pub const EXPLOSION_BOTTOM_RIGHT_ID: &str = "explosion-bottom-right";
    pub const EXPLOSION_TOP_LEFT_ID: &str = "explosion-top-left";
    pub const BODY_SHAKE: &str = "screenShake 0.4s cubic-bezier(.36,.07,.19,.97) both";
}

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event      →  To State                  │
/// ├─────────────────────────────────────────────────────────┤
/// │  Idle        →  Launch     →  Flying                    │
/// │  Flying      →  Detonate   →  Exploding                 │
/// │  Exploding   →  Settle     →  Idle                      │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Launch(Direction),
    Detonate,
    Settle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Flying,
    Exploding,
}

#[derive(Debug, Copy, Clone)]
pub enum MissileMachine {
    Idle(MissileState<Idle>),
    Flying(MissileState<Flying>),
    Exploding(MissileState<Exploding>),
}

impl From<MissileState<Idle>> for MissileMachine {
    fn from(state: MissileState<Idle>) -> Self {
        MissileMachine::Idle(state)
    }
}

impl From<MissileState<Flying>> for MissileMachine {
    fn from(state: MissileState<Flying>) -> Self {
        MissileMachine::Flying(state)
    }
}

impl From<MissileState<Exploding>> for MissileMachine {
    fn from(state: MissileState<Exploding>) -> Self {
        MissileMachine::Exploding(state)
    }
}

impl Default for MissileMachine {
    fn default() -> Self {
        MissileState::<Idle>::new().into()
    }
}

impl MissileMachine {
    pub fn transition(self, event: Event) -> Self {
        use MissileMachine::*;
        match (self, event) {
            (Idle(state), Event::Launch(direction)) => state.launch(direction).into(),
            (Flying(state), Event::Detonate) => state.detonate().into(),
            (Exploding(state), Event::Settle) => state.settle().into(),
            // launches while in flight are dropped, not queued
            _ => self,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            MissileMachine::Idle(_) => Phase::Idle,
            MissileMachine::Flying(_) => Phase::Flying,
            MissileMachine::Exploding(_) => Phase::Exploding,
        }
    }

    pub fn context(&self) -> &MissileContext {
        match self {
            MissileMachine::Idle(state) => state.context(),
            MissileMachine::Flying(state) => state.context(),
            MissileMachine::Exploding(state) => state.context(),
        }
    }
}

/// Owns the machine and the timers that drive it through a play-through.
pub struct MissileEffect {
    machine: Rc<Cell<MissileMachine>>,
    options: MissileOptions,
}

impl MissileEffect {
    pub fn new(options: MissileOptions) -> Self {
        MissileEffect {
            machine: Rc::new(Cell::new(MissileMachine::default())),
            options,
        }
    }

    pub fn phase(&self) -> Phase {
        self.machine.get().phase()
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != Phase::Idle
    }

    pub fn launches(&self) -> u32 {
        self.machine.get().context().launches
    }

    /// Starts a play-through. Returns false, scheduling nothing, when one
    /// is already running.
    pub fn launch(
        &self,
        direction: Direction,
        scheduler: &dyn Scheduler,
        stage: &Rc<dyn Stage>,
    ) -> bool {
        if self.is_busy() {
            return false;
        }
        self.step(Event::Launch(direction));
        engine::apply_all(stage.as_ref(), launch_mutations(direction), "missile launch");

        let machine = self.machine.clone();
        let detonation_stage = stage.clone();
        scheduler.schedule(
            self.options.flight_ms,
            Box::new(move || {
                machine.set(machine.get().transition(Event::Detonate));
                engine::apply_all(
                    detonation_stage.as_ref(),
                    explosion_mutations(direction),
                    "missile explosion",
                );
            }),
        );

        let cleanup_stage = stage.clone();
        scheduler.schedule(
            self.options.flight_ms.saturating_add(self.options.explosion_ms),
            Box::new(move || {
                engine::apply_all(
                    cleanup_stage.as_ref(),
                    explosion_cleanup(direction),
                    "explosion cleanup",
                );
            }),
        );

        let machine = self.machine.clone();
        let reset_stage = stage.clone();
        scheduler.schedule(
            self.options.reset_ms,
            Box::new(move || {
                machine.set(machine.get().transition(Event::Settle));
                engine::apply_all(reset_stage.as_ref(), clear_flight(), "missile reset");
            }),
        );
        true
    }

    fn step(&self, event: Event) {
        self.machine.set(self.machine.get().transition(event));
    }
}

fn explosion_id(direction: Direction) -> &'static str {
    match direction {
        Direction::Down => html::EXPLOSION_BOTTOM_RIGHT_ID,
        Direction::Up => html::EXPLOSION_TOP_LEFT_ID,
    }
}

fn flight_class(direction: Direction) -> &'static str {
    match direction {
        Direction::Down => "fly-down",
        Direction::Up => "fly-up",
    }
}

fn clear_flight() -> Vec<Mutation> {
    vec![
        Mutation::remove_class(Target::id(html::MISSILE_ID), "fly-down"),
        Mutation::remove_class(Target::id(html::MISSILE_ID), "fly-up"),
    ]
}

fn launch_mutations(direction: Direction) -> Vec<Mutation> {
    let mut mutations = clear_flight();
    mutations.extend([
        Mutation::remove_class(Target::id(html::EXPLOSION_BOTTOM_RIGHT_ID), "explode"),
        Mutation::remove_class(Target::id(html::EXPLOSION_TOP_LEFT_ID), "explode"),
        Mutation::Reflow {
            target: Target::id(html::MISSILE_ID),
        },
        Mutation::add_class(Target::id(html::MISSILE_ID), flight_class(direction)),
    ]);
    mutations
}

fn explosion_mutations(direction: Direction) -> Vec<Mutation> {
    vec![
        Mutation::add_class(Target::id(explosion_id(direction)), "explode"),
        Mutation::add_class(Target::id(html::CONTAINER_ID), "flash"),
        Mutation::set_style(Target::Body, "animation", html::BODY_SHAKE),
    ]
}

fn explosion_cleanup(direction: Direction) -> Vec<Mutation> {
    vec![
        Mutation::remove_class(Target::id(explosion_id(direction)), "explode"),
        Mutation::remove_class(Target::id(html::CONTAINER_ID), "flash"),
        Mutation::set_style(Target::Body, "animation", ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Journal, VirtualClock};

    fn effect() -> (MissileEffect, VirtualClock, Rc<Journal>) {
        let clock = VirtualClock::new();
        let journal = Rc::new(Journal::new(&clock));
        (MissileEffect::new(MissileOptions::default()), clock, journal)
    }

    #[test]
    fn unsupported_events_keep_the_state() {
        let idle = MissileMachine::default();
        assert_eq!(idle.transition(Event::Detonate).phase(), Phase::Idle);
        let flying = idle.transition(Event::Launch(Direction::Up));
        assert_eq!(flying.transition(Event::Launch(Direction::Down)).phase(), Phase::Flying);
        assert_eq!(flying.transition(Event::Settle).phase(), Phase::Flying);
        assert_eq!(flying.context().direction, Some(Direction::Up));
    }

    #[test]
    fn play_through_walks_every_phase() {
        let (effect, clock, journal) = effect();
        let stage: Rc<dyn Stage> = journal.clone();
        assert!(effect.launch(Direction::Down, &clock, &stage));
        assert_eq!(effect.phase(), Phase::Flying);

        clock.advance(1199);
        assert_eq!(effect.phase(), Phase::Flying);
        clock.advance(1);
        assert_eq!(effect.phase(), Phase::Exploding);
        clock.advance(300);
        assert_eq!(effect.phase(), Phase::Idle);

        clock.run_until_idle();
        let cleared = journal.entries().into_iter().any(|(at, mutation)| {
            at == 2400
                && mutation
                    == Mutation::remove_class(Target::id(html::EXPLOSION_BOTTOM_RIGHT_ID), "explode")
        });
        assert!(cleared);
    }

    #[test]
    fn launches_while_busy_are_dropped() {
        let (effect, clock, journal) = effect();
        let stage: Rc<dyn Stage> = journal.clone();
        assert!(effect.launch(Direction::Down, &clock, &stage));
        let pending = clock.pending();
        assert!(!effect.launch(Direction::Up, &clock, &stage));
        assert_eq!(clock.pending(), pending);

        clock.advance(1500);
        assert!(effect.launch(Direction::Up, &clock, &stage));
        assert_eq!(effect.launches(), 2);
    }

    #[test]
    fn oversized_timings_do_not_overflow() {
        let clock = VirtualClock::new();
        let stage: Rc<dyn Stage> = Rc::new(Journal::new(&clock));
        let effect = MissileEffect::new(MissileOptions {
            flight_ms: u32::MAX,
            reset_ms: u32::MAX,
            explosion_ms: 1200,
        });
        assert!(effect.launch(Direction::Up, &clock, &stage));
        assert_eq!(clock.pending(), 3);
        clock.run_until_idle();
        assert_eq!(effect.phase(), Phase::Idle);
    }
}
