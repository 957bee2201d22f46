//! Loading overlay: a simulated percentage counter, then the overlay fades
//! out, the main content shows and the hero section shakes once.
use crate::browser;
use crate::cascade::{Cascade, Stagger};
use crate::config::LoadingOptions;
use crate::engine::{self, Mutation, Scheduler, Stage, Target};
use anyhow::Result;
use rand::Rng;
use std::rc::Rc;

mod html {
    pub const LOADING_SCREEN_ID: &str = "loading-screen";
    pub const MAIN_CONTENT_ID: &str = "main-content";
    pub const PERCENTAGE_SELECTOR: &str = ".loading-percentage";
    pub const HERO_SELECTOR: &str = ".hero-section";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingProgress {
    value: f64,
}

impl LoadingProgress {
    pub fn new() -> Self {
        LoadingProgress { value: 0.0 }
    }

    /// Adds a random step in `[0, max_step)`, clamped at 100.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, max_step: f64) -> f64 {
        self.value = (self.value + rng.gen_range(0.0..max_step)).min(100.0);
        self.value
    }

    pub fn is_complete(&self) -> bool {
        self.value >= 100.0
    }

    pub fn label(&self) -> String {
        format!("{}%", self.value.floor() as u32)
    }
}

impl Default for LoadingProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// What happens once the counter reaches 100, relative to that moment.
pub fn completion(options: &LoadingOptions) -> Cascade {
    let shown = options.settle_ms.saturating_add(options.fade_ms);
    let shake = shown.saturating_add(options.shake_delay_ms);
    let hero = Target::Query(html::HERO_SELECTOR.to_string());
    Cascade::new()
        .at(
            options.settle_ms,
            Mutation::add_class(Target::id(html::LOADING_SCREEN_ID), "fade-out"),
        )
        .staggered(Stagger::burst(shown), reveal_content())
        .at(shake, Mutation::add_class(hero.clone(), "screen-shake"))
        .at(
            shake.saturating_add(options.shake_ms),
            Mutation::remove_class(hero, "screen-shake"),
        )
}

fn reveal_content() -> Vec<Mutation> {
    vec![
        Mutation::set_style(Target::id(html::LOADING_SCREEN_ID), "display", "none"),
        Mutation::remove_class(Target::id(html::MAIN_CONTENT_ID), "hidden"),
    ]
}

pub struct LoadingOverlay {
    options: LoadingOptions,
}

impl LoadingOverlay {
    pub fn new(options: LoadingOptions) -> Self {
        LoadingOverlay { options }
    }

    /// Counts up to 100, then schedules the completion sequence. Returns as
    /// soon as the sequence is scheduled.
    pub async fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scheduler: &dyn Scheduler,
        stage: &Rc<dyn Stage>,
    ) -> Result<()> {
        // the only element whose absence is checked up front
        if browser::query_document(html::PERCENTAGE_SELECTOR).is_err() {
            error!("Loading percentage element not found");
            engine::apply_all(stage.as_ref(), reveal_content(), "loading");
            return Ok(());
        }

        let percentage = Target::Query(html::PERCENTAGE_SELECTOR.to_string());
        let mut progress = LoadingProgress::new();
        while !progress.is_complete() {
            browser::sleep(self.options.tick_ms).await?;
            progress.tick(rng, self.options.max_step);
            stage.apply(&Mutation::SetText {
                target: percentage.clone(),
                text: progress.label(),
            })?;
        }

        completion(&self.options).schedule("loading", scheduler, stage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn progress_clamps_and_labels_whole_percent() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut progress = LoadingProgress::new();
        let mut ticks = 0;
        while !progress.is_complete() {
            let before = progress;
            let value = progress.tick(&mut rng, 8.0);
            assert!(value >= before.value && value - before.value < 8.0);
            ticks += 1;
        }
        assert!(ticks >= 13);
        assert_eq!(progress.label(), "100%");
    }

    #[test]
    fn completion_timeline() {
        let cascade = completion(&LoadingOptions::default());
        let delays: Vec<u32> = cascade.steps().iter().map(|step| step.at_ms).collect();
        assert_eq!(delays, vec![1500, 2000, 2000, 2300, 2900]);
    }
}
