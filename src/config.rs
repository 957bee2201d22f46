//! Options table for the page.
//!
//! Everything has a default, so a missing or partial `page-options.json`
//! still yields a complete table.

use crate::browser;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    /// fixed seed for every random draw. `None` seeds from the browser
    pub seed: Option<u64>,
    pub scroll_container_id: String,
    pub mobile_max_width: f64,
    pub visibility: VisibilityOptions,
    pub scroll: ScrollOptions,
    pub missile: MissileOptions,
    pub loading: LoadingOptions,
    pub jeets: JeetsOptions,
    pub resistance: ResistanceOptions,
    pub barrage: BarrageOptions,
    pub reveal: RevealOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    pub threshold: f64,
    pub root_margin: String,
    pub section_selector: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollOptions {
    pub noise_floor: f64,
    pub parallax_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MissileOptions {
    /// launch -> explosion
    pub flight_ms: u32,
    /// launch -> back to idle
    pub reset_ms: u32,
    /// explosion -> explosion classes cleared
    pub explosion_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadingOptions {
    pub tick_ms: u32,
    pub max_step: f64,
    pub settle_ms: u32,
    pub fade_ms: u32,
    pub shake_delay_ms: u32,
    pub shake_ms: u32,
}

/// Shared by every section: text shows, fades, then the container activates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntroTiming {
    pub text_fade_ms: u32,
    pub container_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JeetsOptions {
    pub intro: IntroTiming,
    pub candles: usize,
    pub jeets: usize,
    pub spawn_offset_ms: u32,
    pub spawn_duration_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Fixed,
    Sampled,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResistanceOptions {
    pub intro: IntroTiming,
    pub layout: Layout,
    pub sea: usize,
    /// only used by the sampled layout, the fixed one has its own table
    pub landmines: usize,
    pub landmine_attempts: u32,
    pub character_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BarrageOptions {
    pub intro: IntroTiming,
    pub missiles: usize,
    pub spread_ms: u32,
    pub flight_ms: u32,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    pub intro: IntroTiming,
}

impl Default for PageOptions {
    fn default() -> Self {
        PageOptions {
            seed: None,
            scroll_container_id: "main-content".to_string(),
            mobile_max_width: 768.0,
            visibility: VisibilityOptions::default(),
            scroll: ScrollOptions::default(),
            missile: MissileOptions::default(),
            loading: LoadingOptions::default(),
            jeets: JeetsOptions::default(),
            resistance: ResistanceOptions::default(),
            barrage: BarrageOptions::default(),
            reveal: RevealOptions::default(),
        }
    }
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        VisibilityOptions {
            threshold: 0.1,
            root_margin: "0px 0px -100px 0px".to_string(),
            section_selector: ".scroll-section".to_string(),
        }
    }
}

impl Default for ScrollOptions {
    fn default() -> Self {
        ScrollOptions {
            noise_floor: 5.0,
            parallax_factor: 0.5,
        }
    }
}

impl Default for MissileOptions {
    fn default() -> Self {
        MissileOptions {
            flight_ms: 1200,
            reset_ms: 1500,
            explosion_ms: 1200,
        }
    }
}

impl Default for LoadingOptions {
    fn default() -> Self {
        LoadingOptions {
            tick_ms: 100,
            max_step: 8.0,
            settle_ms: 1500,
            fade_ms: 500,
            shake_delay_ms: 300,
            shake_ms: 600,
        }
    }
}

impl Default for IntroTiming {
    fn default() -> Self {
        IntroTiming {
            text_fade_ms: 2000,
            container_ms: 2500,
        }
    }
}

impl Default for JeetsOptions {
    fn default() -> Self {
        JeetsOptions {
            intro: IntroTiming::default(),
            candles: 15,
            jeets: 100,
            spawn_offset_ms: 2500,
            spawn_duration_ms: 2000,
        }
    }
}

impl Default for ResistanceOptions {
    fn default() -> Self {
        ResistanceOptions {
            intro: IntroTiming::default(),
            layout: Layout::Fixed,
            sea: 50,
            landmines: 6,
            landmine_attempts: 50,
            character_attempts: 100,
        }
    }
}

impl Default for BarrageOptions {
    fn default() -> Self {
        BarrageOptions {
            intro: IntroTiming::default(),
            missiles: 12,
            spread_ms: 1500,
            flight_ms: 900,
            attempts: 50,
        }
    }
}

impl Default for RevealOptions {
    fn default() -> Self {
        RevealOptions {
            intro: IntroTiming::default(),
        }
    }
}

impl PageOptions {
    const OPTIONS_PATH: &'static str = "page-options.json";

    /// Fetches the options file, falling back to defaults on any failure.
    pub async fn load() -> Self {
        match Self::fetch().await {
            Ok(options) => options,
            Err(err) => {
                log!("PageOptions: using defaults ({:#})", err);
                PageOptions::default()
            }
        }
    }

    async fn fetch() -> Result<Self> {
        browser::fetch_json::<PageOptions>(Self::OPTIONS_PATH)
            .await
            .with_context(|| format!("Failed to load options from : {}", Self::OPTIONS_PATH))?
            .validate()
    }

    pub fn validate(self) -> Result<Self> {
        let threshold = self.visibility.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            bail!("visibility threshold {} is outside (0, 1]", threshold);
        }
        if self.scroll.noise_floor < 0.0 {
            bail!("scroll noise floor {} is negative", self.scroll.noise_floor);
        }
        if self.missile.reset_ms < self.missile.flight_ms {
            bail!(
                "missile reset ({}ms) happens before the explosion ({}ms)",
                self.missile.reset_ms,
                self.missile.flight_ms
            );
        }
        if self.loading.tick_ms == 0 || self.loading.max_step <= 0.0 {
            bail!("loading progress would never complete");
        }
        let attempts = [
            self.resistance.landmine_attempts,
            self.resistance.character_attempts,
            self.barrage.attempts,
        ];
        if attempts.contains(&0) {
            bail!("placement attempt caps must be at least 1");
        }
        let counts = [
            self.jeets.candles,
            self.jeets.jeets,
            self.resistance.sea,
            self.resistance.landmines,
            self.barrage.missiles,
        ];
        if counts.contains(&0) {
            bail!("sprite counts must be at least 1");
        }
        Ok(self)
    }
}
