//! Section 1: a crashing chart of red candles, then a flood of NPCs.
use super::{intro, jitter, percent, Cascade, Stagger};
use crate::config::JeetsOptions;
use crate::engine::{Mutation, Sprite, Target};
use rand::Rng;

pub const SECTION_ID: &str = "scroll-section-1";
pub const CANDLE_CLASS: &str = "red-candle";
pub const JEET_CLASS: &str = "jeet-character";
const NPC_IMAGE: &str = "img/Character - NPC.png";

// tallest candle on the left, decaying to the right
const PEAK_HEIGHT: f64 = 400.0;
const DECAY: f64 = 3.0;
const MIN_HEIGHT: f64 = 50.0;

pub fn candle_height(index: usize, count: usize, variation: f64) -> f64 {
    let progress = if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        0.0
    };
    (PEAK_HEIGHT * (-DECAY * progress).exp() + variation).max(MIN_HEIGHT)
}

fn candle<R: Rng + ?Sized>(index: usize, count: usize, rng: &mut R) -> Mutation {
    let height = candle_height(index, count, jitter(rng, 15.0));
    Mutation::Spawn(
        Sprite::block(Target::within(SECTION_ID, ".red-candles-container"))
            .with_class(CANDLE_CLASS)
            .with_style("height", format!("{:.1}px", height))
            .with_style("animation-delay", format!("{:.1}s", index as f64 * 0.1)),
    )
}

fn jeet<R: Rng + ?Sized>(candles: usize, rng: &mut R) -> Mutation {
    let candle = rng.gen_range(0..candles);
    let left = candle as f64 / candles as f64 * 100.0 + jitter(rng, 2.5);
    let bottom = rng.gen_range(20.0..50.0);
    Mutation::Spawn(
        Sprite::image(Target::within(SECTION_ID, ".jeets-container"), NPC_IMAGE)
            .with_class(JEET_CLASS)
            .with_style("left", percent(left))
            .with_style("bottom", percent(bottom))
            .with_style("animation-delay", "0s"),
    )
}

pub fn script<R: Rng + ?Sized>(options: &JeetsOptions, rng: &mut R) -> Cascade {
    let candles = options.candles.max(1);
    let candle_sprites = (0..candles).map(|index| candle(index, candles, rng)).collect();
    let jeet_sprites = (0..options.jeets).map(|_| jeet(candles, rng)).collect();

    intro(
        SECTION_ID,
        ".section-1-text",
        ".jeets-animation-container",
        options.intro,
    )
    .staggered(Stagger::burst(options.intro.container_ms), candle_sprites)
    .staggered(
        Stagger::spread(options.spawn_offset_ms, options.spawn_duration_ms),
        jeet_sprites,
    )
}
