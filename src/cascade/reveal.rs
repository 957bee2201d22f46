//! Section 4: one static image revealed after the intro.
use super::{intro, Cascade};
use crate::config::RevealOptions;
use crate::engine::{Mutation, Sprite, Target};

pub const SECTION_ID: &str = "scroll-section-4";
const REVEAL_IMAGE: &str = "img/Reveal.png";
const REVEAL_LABEL: &str = "reveal-image";
const FADE_IN_DELAY_MS: u32 = 50;

pub fn script(options: &RevealOptions) -> Cascade {
    let appear = options.intro.container_ms;
    intro(
        SECTION_ID,
        ".section-4-text",
        ".reveal-animation-container",
        options.intro,
    )
    .at(
        appear,
        Mutation::Spawn(
            Sprite::image(Target::within(SECTION_ID, ".reveal-container"), REVEAL_IMAGE)
                .with_alt("Reveal")
                .with_class("reveal-image")
                .labelled(REVEAL_LABEL),
        ),
    )
    .at(
        appear.saturating_add(FADE_IN_DELAY_MS),
        Mutation::add_class(Target::spawned(REVEAL_LABEL), "visible"),
    )
}
