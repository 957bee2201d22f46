use crate::browser;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use web_sys::Element;

// ==================== Page ====================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    pub intersecting: bool,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const DESKTOP: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    pub fn query() -> Result<Self> {
        let (width, height) = browser::viewport_size()?;
        Ok(Viewport { width, height })
    }

    /// Narrow or portrait viewports get the mobile layout.
    pub fn is_mobile(&self, max_width: f64) -> bool {
        self.width <= max_width || self.height > self.width
    }
}

/// Host events the page reacts to, once it has left its loading state.
#[async_trait(?Send)]
pub trait Page {
    async fn initialize(&self) -> Result<Box<dyn Page>>;
    fn on_scroll(&mut self, offset: f64);
    /// Called once with every section element that ended up observed.
    fn on_sections_observed(&mut self, section_ids: &[String]);
    fn on_section_visible(&mut self, section: &Element, visibility: Visibility);
    /// Scroll container id plus the observed section elements' ids.
    fn wiring(&self) -> Wiring;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wiring {
    pub scroll_container_id: String,
    pub section_ids: Vec<String>,
    pub section_selector: String,
    pub threshold: f64,
    pub root_margin: String,
}

pub struct PageLoop;

type SharedPage = Rc<RefCell<Box<dyn Page>>>;

impl PageLoop {
    pub async fn start(page: impl Page + 'static) -> Result<()> {
        let page: SharedPage = Rc::new(RefCell::new(page.initialize().await?));
        let wiring = page.borrow().wiring();

        let container = browser::element_by_id(&wiring.scroll_container_id)?;
        let scrolled = page.clone();
        browser::on_scroll(&container, move |offset| {
            scrolled.borrow_mut().on_scroll(offset);
        })?;

        let sections = Self::collect_sections(&wiring)?;
        let section_ids: Vec<String> = sections.iter().map(Element::id).collect();
        page.borrow_mut().on_sections_observed(&section_ids);
        let observed = page.clone();
        browser::observe_intersections(
            &sections,
            wiring.threshold,
            &wiring.root_margin,
            move |element, intersecting, ratio| {
                observed.borrow_mut().on_section_visible(
                    element,
                    Visibility {
                        intersecting,
                        ratio,
                    },
                );
            },
        )?;
        log!("PageLoop: observing {} sections", sections.len());
        Ok(())
    }

    /// Everything matching the section selector plus each listed id. Absent
    /// ids are logged and skipped so the others still get observed.
    pub fn collect_sections(wiring: &Wiring) -> Result<Vec<Element>> {
        let mut sections = browser::query_all(&wiring.section_selector)?;
        for id in &wiring.section_ids {
            if sections.iter().any(|section| section.id() == *id) {
                continue;
            }
            match browser::element_by_id(id) {
                Ok(section) => sections.push(section),
                Err(err) => error!("PageLoop: skipping section '{}' : {:#}", id, err),
            }
        }
        Ok(sections)
    }
}

// ==================== Mutations ====================
/// How a mutation finds the element it changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Id(String),
    /// first match of `selector` below the element with id `section`
    Within { section: String, selector: String },
    Query(String),
    Body,
    /// an element the host handed over, e.g. an observed section
    Node(Element),
    /// a node created earlier by a labelled `Spawn`
    Spawned(String),
}

impl Target {
    pub fn id(id: &str) -> Self {
        Target::Id(id.to_string())
    }

    pub fn within(section: &str, selector: &str) -> Self {
        Target::Within {
            section: section.to_string(),
            selector: selector.to_string(),
        }
    }

    pub fn spawned(label: impl Into<String>) -> Self {
        Target::Spawned(label.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Image { src: &'static str, alt: &'static str },
    Block,
}

/// A node to create and append under `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub parent: Target,
    pub kind: SpriteKind,
    pub class: Option<&'static str>,
    pub styles: Vec<(&'static str, String)>,
    pub label: Option<String>,
}

impl Sprite {
    pub fn image(parent: Target, src: &'static str) -> Self {
        Sprite {
            parent,
            kind: SpriteKind::Image { src, alt: "" },
            class: None,
            styles: Vec::new(),
            label: None,
        }
    }

    pub fn block(parent: Target) -> Self {
        Sprite {
            parent,
            kind: SpriteKind::Block,
            class: None,
            styles: Vec::new(),
            label: None,
        }
    }

    pub fn with_alt(mut self, alt: &'static str) -> Self {
        if let SpriteKind::Image { src, .. } = self.kind {
            self.kind = SpriteKind::Image { src, alt };
        }
        self
    }

    pub fn with_class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        self.styles.push((property, value.into()));
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddClass { target: Target, class: &'static str },
    RemoveClass { target: Target, class: &'static str },
    SetStyle { target: Target, property: &'static str, value: String },
    SetText { target: Target, text: String },
    /// read layout so a removed-then-added animation class restarts
    Reflow { target: Target },
    Spawn(Sprite),
}

impl Mutation {
    pub fn add_class(target: Target, class: &'static str) -> Self {
        Mutation::AddClass { target, class }
    }

    pub fn remove_class(target: Target, class: &'static str) -> Self {
        Mutation::RemoveClass { target, class }
    }

    pub fn set_style(target: Target, property: &'static str, value: impl Into<String>) -> Self {
        Mutation::SetStyle {
            target,
            property,
            value: value.into(),
        }
    }

    pub fn spawned_sprite(&self) -> Option<&Sprite> {
        match self {
            Mutation::Spawn(sprite) => Some(sprite),
            _ => None,
        }
    }
}

/// Where mutations land: the live DOM, or a journal under test.
pub trait Stage {
    fn apply(&self, mutation: &Mutation) -> Result<()>;
}

/// Applies each mutation, logging failures without stopping at them.
pub fn apply_all(stage: &dyn Stage, mutations: impl IntoIterator<Item = Mutation>, what: &str) {
    for mutation in mutations {
        if let Err(err) = stage.apply(&mutation) {
            error!("{}: {:#}", what, err);
        }
    }
}

/// Applies mutations to the live document.
#[derive(Default)]
pub struct DomStage {
    spawned: RefCell<HashMap<String, Element>>,
}

impl DomStage {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, target: &Target) -> Result<Element> {
        match target {
            Target::Id(id) => browser::element_by_id(id),
            Target::Within { section, selector } => {
                browser::query(&browser::element_by_id(section)?, selector)
            }
            Target::Query(selector) => browser::query_document(selector),
            Target::Body => browser::body(),
            Target::Node(element) => Ok(element.clone()),
            Target::Spawned(label) => self
                .spawned
                .borrow()
                .get(label)
                .cloned()
                .ok_or_else(|| anyhow!("No spawned node labelled '{}'", label)),
        }
    }

    fn spawn(&self, sprite: &Sprite) -> Result<()> {
        let tag = match sprite.kind {
            SpriteKind::Image { .. } => "img",
            SpriteKind::Block => "div",
        };
        let node = browser::create_element(tag)?;
        if let SpriteKind::Image { src, alt } = sprite.kind {
            node.set_attribute("src", src)
                .map_err(|err| anyhow!("Could not set src '{}' : {:#?}", src, err))?;
            if !alt.is_empty() {
                node.set_attribute("alt", alt)
                    .map_err(|err| anyhow!("Could not set alt '{}' : {:#?}", alt, err))?;
            }
        }
        if let Some(class) = sprite.class {
            node.set_class_name(class);
        }
        let style = browser::as_html(&node)?.style();
        for (property, value) in &sprite.styles {
            style
                .set_property(property, value)
                .map_err(|err| anyhow!("Could not set {} : {:#?}", property, err))?;
        }
        self.resolve(&sprite.parent)?
            .append_child(&node)
            .map_err(|err| anyhow!("Could not append {} : {:#?}", tag, err))?;
        if let Some(label) = &sprite.label {
            self.spawned.borrow_mut().insert(label.clone(), node);
        }
        Ok(())
    }
}

impl Stage for DomStage {
    fn apply(&self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::AddClass { target, class } => self
                .resolve(target)?
                .class_list()
                .add_1(class)
                .map_err(|err| anyhow!("Could not add class {} : {:#?}", class, err)),
            Mutation::RemoveClass { target, class } => self
                .resolve(target)?
                .class_list()
                .remove_1(class)
                .map_err(|err| anyhow!("Could not remove class {} : {:#?}", class, err)),
            Mutation::SetStyle {
                target,
                property,
                value,
            } => browser::as_html(&self.resolve(target)?)?
                .style()
                .set_property(property, value)
                .map_err(|err| anyhow!("Could not set {} : {:#?}", property, err)),
            Mutation::SetText { target, text } => {
                self.resolve(target)?.set_text_content(Some(text));
                Ok(())
            }
            Mutation::Reflow { target } => {
                let _ = browser::as_html(&self.resolve(target)?)?.offset_width();
                Ok(())
            }
            Mutation::Spawn(sprite) => self.spawn(sprite),
        }
    }
}

/// Records every applied mutation with the virtual time it landed at.
pub struct Journal {
    clock: VirtualClock,
    entries: RefCell<Vec<(u64, Mutation)>>,
}

impl Journal {
    pub fn new(clock: &VirtualClock) -> Self {
        Journal {
            clock: clock.clone(),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(u64, Mutation)> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Times of every spawn whose class is `class`.
    pub fn spawn_times(&self, class: &str) -> Vec<u64> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|(at, mutation)| match mutation.spawned_sprite() {
                Some(sprite) if sprite.class == Some(class) => Some(*at),
                _ => None,
            })
            .collect()
    }
}

impl Stage for Journal {
    fn apply(&self, mutation: &Mutation) -> Result<()> {
        self.entries
            .borrow_mut()
            .push((self.clock.now(), mutation.clone()));
        Ok(())
    }
}

// ==================== Scheduling ====================
pub type Task = Box<dyn FnOnce()>;

/// Non-blocking "run this later". There is no cancellation.
pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Task);
}

pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) {
        if let Err(err) = browser::set_timeout(delay_ms, task) {
            error!("BrowserScheduler: could not schedule task : {:#}", err);
        }
    }
}

/// Deterministic timer queue. Tasks run in (due, insertion) order.
#[derive(Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<u64>>,
    next_seq: Rc<Cell<u64>>,
    pending: Rc<RefCell<BTreeMap<(u64, u64), Task>>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Moves time forward by `ms`, running every task that falls due on the
    /// way, including ones scheduled by those tasks. Returns how many ran.
    pub fn advance(&self, ms: u64) -> usize {
        let until = self.now.get() + ms;
        let mut ran = 0;
        loop {
            // the borrow ends before the task runs so it can schedule more
            let next = {
                let mut pending = self.pending.borrow_mut();
                match pending.first_key_value() {
                    Some((&(due, _), _)) if due <= until => pending.pop_first(),
                    _ => None,
                }
            };
            match next {
                Some(((due, _), task)) => {
                    self.now.set(due);
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        self.now.set(until);
        ran
    }

    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let due = match self.pending.borrow().first_key_value() {
                Some((&(due, _), _)) => due,
                None => break,
            };
            ran += self.advance(due.saturating_sub(self.now.get()));
        }
        ran
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&self, delay_ms: u32, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.pending
            .borrow_mut()
            .insert((self.now.get() + u64::from(delay_ms), seq), task);
    }
}
