use crate::cascade::{CascadeRunner, SectionId};
use crate::config::PageOptions;
use crate::engine::{
    BrowserScheduler, DomStage, Mutation, Page, Scheduler, Stage, Target, Viewport, Visibility,
    Wiring,
};
use crate::loading::LoadingOverlay;
use crate::missile::MissileEffect;
use crate::scroll::{Direction, ScrollReversalDetector};
use crate::visibility::VisibilityWatcher;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::rc::Rc;
use web_sys::Element;

/// ┌───────────────────── Page Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │   scroll ──► ScrollReversalDetector ──► MissileEffect ──┐               │
/// │                                                        ├──► Stage (DOM) │
/// │   visible ─► VisibilityWatcher ──► CascadeRunner ──────┘       ▲        │
/// │                                         │                      │        │
/// │                                         └──► Scheduler ────────┘        │
/// │                                              (timers fire later)        │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum MemePage {
    /// options fetched, overlay still counting
    Loading(PageOptions),
    Loaded(Battlefield),
}

impl MemePage {
    pub fn new(options: PageOptions) -> Self {
        MemePage::Loading(options)
    }
}

#[async_trait(?Send)]
impl Page for MemePage {
    async fn initialize(&self) -> Result<Box<dyn Page>> {
        match self {
            MemePage::Loading(options) => {
                let viewport = Viewport::query().unwrap_or_else(|err| {
                    log!("MemePage: assuming desktop viewport ({:#})", err);
                    Viewport::DESKTOP
                });
                let mut battlefield = Battlefield::new(
                    options.clone(),
                    viewport,
                    Rc::new(BrowserScheduler),
                    Rc::new(DomStage::new()),
                );
                battlefield
                    .run_loading_overlay()
                    .await
                    .context("Loading overlay failed")?;
                Ok(Box::new(MemePage::Loaded(battlefield)))
            }
            MemePage::Loaded(_) => Err(anyhow!("Page is already initialized")),
        }
    }

    fn on_scroll(&mut self, offset: f64) {
        if let MemePage::Loaded(battlefield) = self {
            battlefield.on_scroll(offset);
        }
    }

    fn on_sections_observed(&mut self, section_ids: &[String]) {
        if let MemePage::Loaded(battlefield) = self {
            battlefield.register_sections(section_ids);
        }
    }

    fn on_section_visible(&mut self, section: &Element, visibility: Visibility) {
        if let MemePage::Loaded(battlefield) = self {
            battlefield.on_section_entry(Target::Node(section.clone()), &section.id(), visibility);
        }
    }

    fn wiring(&self) -> Wiring {
        match self {
            MemePage::Loading(options) => Battlefield::wiring_for(
                options,
                SectionId::ALL
                    .iter()
                    .map(|section| section.element_id().to_string())
                    .collect(),
            ),
            MemePage::Loaded(battlefield) => battlefield.wiring(),
        }
    }
}

/// Every flag and effect of the page, owned in one place.
pub struct Battlefield {
    options: PageOptions,
    mobile: bool,
    detector: ScrollReversalDetector,
    missile: MissileEffect,
    watcher: VisibilityWatcher,
    runners: Vec<CascadeRunner>,
    rng: SmallRng,
    scheduler: Rc<dyn Scheduler>,
    stage: Rc<dyn Stage>,
}

impl Battlefield {
    pub fn new(
        options: PageOptions,
        viewport: Viewport,
        scheduler: Rc<dyn Scheduler>,
        stage: Rc<dyn Stage>,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut watcher = VisibilityWatcher::new(options.visibility.threshold);
        for section in SectionId::ALL {
            watcher.register(section.element_id());
        }
        Battlefield {
            mobile: viewport.is_mobile(options.mobile_max_width),
            detector: ScrollReversalDetector::new(options.scroll.noise_floor),
            missile: MissileEffect::new(options.missile.clone()),
            watcher,
            runners: SectionId::ALL.into_iter().map(CascadeRunner::new).collect(),
            rng,
            scheduler,
            stage,
            options,
        }
    }

    pub fn missile(&self) -> &MissileEffect {
        &self.missile
    }

    pub fn detector(&self) -> &ScrollReversalDetector {
        &self.detector
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub async fn run_loading_overlay(&mut self) -> Result<()> {
        LoadingOverlay::new(self.options.loading.clone())
            .run(&mut self.rng, self.scheduler.as_ref(), &self.stage)
            .await
    }

    /// Parallax, then reversal detection. Returns the direction launched.
    pub fn on_scroll(&mut self, offset: f64) -> Option<Direction> {
        let parallax = Mutation::set_style(
            Target::Query(".warfield-background".to_string()),
            "transform",
            format!("translateY({}px)", offset * self.options.scroll.parallax_factor),
        );
        // the warfield background is optional
        let _ = self.stage.apply(&parallax);

        let direction = self.detector.sample(offset, self.missile.is_busy())?;
        if self
            .missile
            .launch(direction, self.scheduler.as_ref(), &self.stage)
        {
            Some(direction)
        } else {
            None
        }
    }

    /// Adds every id-carrying section to the watcher. Sections without an
    /// id still get `animate-in` but never start a cascade.
    pub fn register_sections(&mut self, section_ids: &[String]) {
        for id in section_ids.iter().filter(|id| !id.is_empty()) {
            self.watcher.register(id);
        }
    }

    pub fn is_watching(&self, element_id: &str) -> bool {
        self.watcher.ids().iter().any(|id| id == element_id)
    }

    /// Report for the section with id `element_id`.
    pub fn on_section_visible(&mut self, element_id: &str, visibility: Visibility) -> Option<SectionId> {
        self.on_section_entry(Target::id(element_id), element_id, visibility)
    }

    /// Marks `section` and returns the section whose cascade this report
    /// started, if any.
    pub fn on_section_entry(
        &mut self,
        section: Target,
        element_id: &str,
        visibility: Visibility,
    ) -> Option<SectionId> {
        if visibility.intersecting {
            if let Err(err) = self
                .stage
                .apply(&Mutation::add_class(section, "animate-in"))
            {
                error!("Battlefield: {:#}", err);
            }
        }
        if !self.watcher.notify(element_id, visibility) {
            return None;
        }

        let section = SectionId::from_element_id(element_id)?;
        let runner = self
            .runners
            .iter_mut()
            .find(|runner| runner.section() == section)?;
        let options = &self.options;
        let mobile = self.mobile;
        let rng = &mut self.rng;
        let started = runner.start(
            || section.script(options, mobile, rng),
            self.scheduler.as_ref(),
            &self.stage,
        );
        started.then_some(section)
    }

    pub fn wiring(&self) -> Wiring {
        Self::wiring_for(&self.options, self.watcher.ids())
    }

    fn wiring_for(options: &PageOptions, section_ids: Vec<String>) -> Wiring {
        Wiring {
            scroll_container_id: options.scroll_container_id.clone(),
            section_ids,
            section_selector: options.visibility.section_selector.clone(),
            threshold: options.visibility.threshold,
            root_margin: options.visibility.root_margin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Journal, VirtualClock};
    use crate::missile::Phase;

    fn battlefield() -> (Battlefield, VirtualClock, Rc<Journal>) {
        let clock = VirtualClock::new();
        let journal = Rc::new(Journal::new(&clock));
        let options = PageOptions {
            seed: Some(17),
            ..PageOptions::default()
        };
        let battlefield = Battlefield::new(
            options,
            Viewport::DESKTOP,
            Rc::new(clock.clone()),
            journal.clone(),
        );
        (battlefield, clock, journal)
    }

    #[test]
    fn scroll_applies_parallax() {
        let (mut battlefield, _clock, journal) = battlefield();
        battlefield.on_scroll(2.0);
        let entries = journal.entries();
        assert_eq!(
            entries[0].1,
            Mutation::set_style(
                Target::Query(".warfield-background".to_string()),
                "transform",
                "translateY(1px)"
            )
        );
    }

    #[test]
    fn missile_rearms_after_reset() {
        let (mut battlefield, clock, _journal) = battlefield();
        assert_eq!(battlefield.on_scroll(40.0), Some(Direction::Down));
        assert_eq!(battlefield.on_scroll(10.0), None);
        clock.advance(1500);
        assert_eq!(battlefield.missile().phase(), Phase::Idle);
        assert_eq!(battlefield.on_scroll(10.0), Some(Direction::Up));
    }

    #[test]
    fn observed_sections_join_the_watcher() {
        let (mut battlefield, clock, journal) = battlefield();
        battlefield.register_sections(&["hero".to_string(), String::new()]);
        assert!(battlefield.is_watching("hero"));
        assert!(battlefield.is_watching("scroll-section-1"));
        assert!(!battlefield.is_watching(""));

        let visible = Visibility {
            intersecting: true,
            ratio: 0.5,
        };
        // no cascade behind it, so nothing is scheduled
        assert_eq!(battlefield.on_section_visible("hero", visible), None);
        assert_eq!(clock.pending(), 0);
        assert_eq!(
            journal.entries()[0].1,
            Mutation::add_class(Target::id("hero"), "animate-in")
        );
    }

    #[test]
    fn section_entry_marks_the_given_target() {
        let (mut battlefield, _clock, journal) = battlefield();
        let visible = Visibility {
            intersecting: true,
            ratio: 0.5,
        };
        assert_eq!(
            battlefield.on_section_entry(Target::Body, "", visible),
            None
        );
        assert_eq!(
            journal.entries()[0].1,
            Mutation::add_class(Target::Body, "animate-in")
        );
    }

    #[test]
    fn portrait_viewports_are_mobile() {
        let portrait = Viewport {
            width: 900.0,
            height: 1600.0,
        };
        assert!(portrait.is_mobile(768.0));
        assert!(!Viewport::DESKTOP.is_mobile(768.0));
    }
}
