use crate::engine::Visibility;

#[derive(Debug, Clone)]
struct Watched {
    id: String,
    entered: bool,
}

/// One-shot "entered" gate per observed section.
#[derive(Debug, Clone)]
pub struct VisibilityWatcher {
    threshold: f64,
    sections: Vec<Watched>,
}

impl VisibilityWatcher {
    pub fn new(threshold: f64) -> Self {
        VisibilityWatcher {
            threshold,
            sections: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn register(&mut self, id: &str) {
        if !self.sections.iter().any(|section| section.id == id) {
            self.sections.push(Watched {
                id: id.to_string(),
                entered: false,
            });
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.sections.iter().map(|section| section.id.clone()).collect()
    }

    pub fn has_entered(&self, id: &str) -> bool {
        self.sections
            .iter()
            .any(|section| section.id == id && section.entered)
    }

    /// True only the first time `id` is seen past the threshold.
    pub fn notify(&mut self, id: &str, visibility: Visibility) -> bool {
        if !visibility.intersecting || visibility.ratio < self.threshold {
            return false;
        }
        match self.sections.iter_mut().find(|section| section.id == id) {
            Some(section) if !section.entered => {
                section.entered = true;
                true
            }
            _ => false,
        }
    }
}
