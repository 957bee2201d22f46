//! Timed cascades: one fixed script of `(delay, mutation)` steps per section,
//! started at most once per page load.
//!
//! ┌──────────── Section ────────────┬──────────── Script ─────────────────┐
//! │ scroll-section-1  Jeets         │ candles, then 100 NPCs spread       │
//! │ scroll-section-2  Resistance    │ sea, landmines, tank, 8 characters  │
//! │ scroll-section-3  Barrage       │ missiles spread, each explodes      │
//! │ scroll-section-4  Reveal        │ one static image                    │
//! └─────────────────────────────────┴─────────────────────────────────────┘
pub mod barrage;
pub mod jeets;
pub mod resistance;
pub mod reveal;

use crate::config::{IntroTiming, PageOptions};
use crate::engine::{Mutation, Scheduler, Stage, Target};
use rand::Rng;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub at_ms: u32,
    pub mutation: Mutation,
}

/// An ordered script. Delays are relative to the cascade start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cascade {
    steps: Vec<Step>,
}

impl Cascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at_ms: u32, mutation: Mutation) -> Self {
        self.steps.push(Step { at_ms, mutation });
        self
    }

    /// Appends `other` with every step pushed back by `offset_ms`.
    pub fn then_at(mut self, offset_ms: u32, other: Cascade) -> Self {
        self.steps.extend(other.steps.into_iter().map(|step| Step {
            at_ms: step.at_ms.saturating_add(offset_ms),
            mutation: step.mutation,
        }));
        self
    }

    /// One mutation per item, each at its stagger delay.
    pub fn staggered(self, stagger: Stagger, items: Vec<Mutation>) -> Self {
        let scripts = items
            .into_iter()
            .map(|mutation| Cascade::new().at(0, mutation))
            .collect();
        self.staggered_scripts(stagger, scripts)
    }

    /// One sub-script per item, each starting at its stagger delay.
    pub fn staggered_scripts(self, stagger: Stagger, items: Vec<Cascade>) -> Self {
        let count = items.len();
        items
            .into_iter()
            .enumerate()
            .fold(self, |cascade, (index, item)| {
                cascade.then_at(stagger.delay(index, count), item)
            })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Hands every step to `scheduler`. A failing step is logged under
    /// `name` and does not stop the others.
    pub fn schedule(self, name: &'static str, scheduler: &dyn Scheduler, stage: &Rc<dyn Stage>) {
        for step in self.steps {
            let stage = stage.clone();
            scheduler.schedule(
                step.at_ms,
                Box::new(move || {
                    if let Err(err) = stage.apply(&step.mutation) {
                        error!("{}: step at {}ms failed : {:#}", name, step.at_ms, err);
                    }
                }),
            );
        }
    }

    /// Delay of the last step to fire.
    pub fn duration_ms(&self) -> u32 {
        self.steps.iter().map(|step| step.at_ms).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    /// every item at the offset
    Burst,
    /// `offset + index * step_ms`
    Fixed { step_ms: u32 },
    /// `offset + (index / count) * duration_ms`, floored
    Spread { duration_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stagger {
    pub offset_ms: u32,
    pub pattern: Pattern,
}

impl Stagger {
    pub fn burst(offset_ms: u32) -> Self {
        Stagger {
            offset_ms,
            pattern: Pattern::Burst,
        }
    }

    pub fn fixed(offset_ms: u32, step_ms: u32) -> Self {
        Stagger {
            offset_ms,
            pattern: Pattern::Fixed { step_ms },
        }
    }

    pub fn spread(offset_ms: u32, duration_ms: u32) -> Self {
        Stagger {
            offset_ms,
            pattern: Pattern::Spread { duration_ms },
        }
    }

    /// Second phase: the item schedule only starts once `phase_ms` has passed.
    pub fn after(mut self, phase_ms: u32) -> Self {
        self.offset_ms = self.offset_ms.saturating_add(phase_ms);
        self
    }

    pub fn delay(&self, index: usize, count: usize) -> u32 {
        match self.pattern {
            Pattern::Burst => self.offset_ms,
            Pattern::Fixed { step_ms } => {
                let step = u32::try_from(index).unwrap_or(u32::MAX).saturating_mul(step_ms);
                self.offset_ms.saturating_add(step)
            }
            Pattern::Spread { duration_ms } if count > 0 => {
                let share = index as u64 * u64::from(duration_ms) / count as u64;
                self.offset_ms.saturating_add(u32::try_from(share).unwrap_or(u32::MAX))
            }
            Pattern::Spread { .. } => self.offset_ms,
        }
    }
}

/// A span of a section's timeline that the next span chains off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub start_ms: u32,
    pub duration_ms: u32,
}

impl Phase {
    pub fn new(start_ms: u32, duration_ms: u32) -> Self {
        Phase {
            start_ms,
            duration_ms,
        }
    }

    pub fn end(&self) -> u32 {
        self.start_ms.saturating_add(self.duration_ms)
    }

    pub fn then(&self, duration_ms: u32) -> Phase {
        Phase::new(self.end(), duration_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Jeets,
    Resistance,
    Barrage,
    Reveal,
}

impl SectionId {
    pub const ALL: [SectionId; 4] = [
        SectionId::Jeets,
        SectionId::Resistance,
        SectionId::Barrage,
        SectionId::Reveal,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            SectionId::Jeets => jeets::SECTION_ID,
            SectionId::Resistance => resistance::SECTION_ID,
            SectionId::Barrage => barrage::SECTION_ID,
            SectionId::Reveal => reveal::SECTION_ID,
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.element_id() == id)
    }

    /// Builds this section's script. Random draws happen here, once.
    pub fn script<R: Rng + ?Sized>(self, options: &PageOptions, mobile: bool, rng: &mut R) -> Cascade {
        match self {
            SectionId::Jeets => jeets::script(&options.jeets, rng),
            SectionId::Resistance => resistance::script(&options.resistance, mobile, rng),
            SectionId::Barrage => barrage::script(&options.barrage, rng),
            SectionId::Reveal => reveal::script(&options.reveal),
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// Text shows, fades out, then the animation container activates.
pub(crate) fn intro(
    section: &str,
    text_selector: &str,
    container_selector: &str,
    timing: IntroTiming,
) -> Cascade {
    Cascade::new()
        .at(
            timing.text_fade_ms,
            Mutation::add_class(Target::within(section, text_selector), "fade-out"),
        )
        .at(
            timing.container_ms,
            Mutation::add_class(Target::within(section, container_selector), "active"),
        )
}

pub(crate) fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    rng.gen_range(-half_width..half_width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Armed,
    Started,
}

/// Starts one section's cascade, once.
#[derive(Debug, Clone)]
pub struct CascadeRunner {
    section: SectionId,
    trigger: Trigger,
}

impl CascadeRunner {
    pub fn new(section: SectionId) -> Self {
        CascadeRunner {
            section,
            trigger: Trigger::Armed,
        }
    }

    pub fn section(&self) -> SectionId {
        self.section
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Schedules every step of `build()`. A second call schedules nothing,
    /// and `build` is not even called, so random draws are not spent.
    pub fn start(
        &mut self,
        build: impl FnOnce() -> Cascade,
        scheduler: &dyn Scheduler,
        stage: &Rc<dyn Stage>,
    ) -> bool {
        if self.trigger == Trigger::Started {
            return false;
        }
        self.trigger = Trigger::Started;

        let cascade = build();
        log!("{}: scheduling {} steps", self.section, cascade.len());
        cascade.schedule(self.section.element_id(), scheduler, stage);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Journal, VirtualClock};
    use std::cell::RefCell;

    fn fade(at: u32) -> Cascade {
        Cascade::new().at(at, Mutation::add_class(Target::id("x"), "fade-out"))
    }

    #[test]
    fn stagger_patterns() {
        assert_eq!(Stagger::fixed(3800, 200).delay(5, 6), 4800);
        assert_eq!(Stagger::spread(2500, 2000).delay(99, 100), 4480);
        assert_eq!(Stagger::spread(2500, 2000).delay(50, 100), 3500);
        assert_eq!(Stagger::burst(100).after(2500).delay(49, 50), 2600);
    }

    #[test]
    fn phases_chain() {
        let sea = Phase::new(2500, 1300);
        let mines = sea.then(1000);
        let tank = mines.then(2000);
        assert_eq!((mines.start_ms, tank.start_ms, tank.end()), (3800, 4800, 6800));
    }

    #[test]
    fn staggered_scripts_shift_each_item() {
        let cascade = Cascade::new().staggered_scripts(
            Stagger::fixed(100, 10),
            vec![fade(0).then_at(5, fade(0)), fade(0)],
        );
        let delays: Vec<u32> = cascade.steps().iter().map(|step| step.at_ms).collect();
        assert_eq!(delays, vec![100, 105, 110]);
        assert_eq!(cascade.duration_ms(), 110);
    }

    #[test]
    fn runner_starts_once() {
        let clock = VirtualClock::new();
        let stage: Rc<dyn Stage> = Rc::new(Journal::new(&clock));
        let mut runner = CascadeRunner::new(SectionId::Reveal);
        assert!(runner.start(|| fade(10).then_at(0, fade(20)), &clock, &stage));
        let mut built_again = false;
        assert!(!runner.start(
            || {
                built_again = true;
                fade(10)
            },
            &clock,
            &stage
        ));
        assert!(!built_again);
        assert_eq!(clock.pending(), 2);
        assert_eq!(runner.trigger(), Trigger::Started);
    }

    struct FailsAt {
        clock: VirtualClock,
        at: u64,
        applied: RefCell<Vec<u64>>,
    }

    impl Stage for FailsAt {
        fn apply(&self, _mutation: &Mutation) -> anyhow::Result<()> {
            let now = self.clock.now();
            if now == self.at {
                anyhow::bail!("boom");
            }
            self.applied.borrow_mut().push(now);
            Ok(())
        }
    }

    #[test]
    fn failing_step_does_not_cancel_later_steps() {
        let clock = VirtualClock::new();
        let failing = Rc::new(FailsAt {
            clock: clock.clone(),
            at: 10,
            applied: RefCell::new(Vec::new()),
        });
        let stage: Rc<dyn Stage> = failing.clone();
        fade(5)
            .then_at(0, fade(10))
            .then_at(0, fade(20))
            .schedule("flaky", &clock, &stage);
        assert_eq!(clock.run_until_idle(), 3);
        assert_eq!(*failing.applied.borrow(), vec![5, 20]);
    }

    #[test]
    fn oversized_delays_saturate() {
        let cascade = fade(10).then_at(u32::MAX, fade(10));
        assert_eq!(cascade.duration_ms(), u32::MAX);
        assert_eq!(Stagger::fixed(u32::MAX - 1, 1000).delay(3, 4), u32::MAX);
        assert_eq!(Stagger::burst(u32::MAX).after(1).delay(0, 1), u32::MAX);
        assert_eq!(Phase::new(u32::MAX, 10).end(), u32::MAX);
    }

    #[test]
    fn section_ids_round_trip_through_element_ids() {
        for section in SectionId::ALL {
            assert_eq!(SectionId::from_element_id(section.element_id()), Some(section));
        }
        assert_eq!(SectionId::from_element_id("hero"), None);
    }
}
