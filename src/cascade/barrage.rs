//! Section 3: a missile barrage. Each missile flies for its own duration
//! after it appears, then explodes in place.
use super::{intro, percent, Cascade, Stagger};
use crate::config::BarrageOptions;
use crate::engine::{Mutation, Sprite, Target};
use crate::placement::{PlacementSampler, Region};
use rand::Rng;

pub const SECTION_ID: &str = "scroll-section-3";
pub const MISSILE_CLASS: &str = "barrage-missile";
const MISSILE_IMAGE: &str = "img/Aux - Missile.png";

const STRIKE_ZONE: Region = Region::new((5.0, 95.0), (5.0, 70.0));
const SPACING: f64 = 8.0;

pub fn script<R: Rng + ?Sized>(options: &BarrageOptions, rng: &mut R) -> Cascade {
    let targets = PlacementSampler::single(STRIKE_ZONE, options.attempts).scatter(
        rng,
        options.missiles,
        SPACING,
        &[],
    );
    let missiles = targets
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            let label = format!("barrage-{}", index);
            Cascade::new()
                .at(
                    0,
                    Mutation::Spawn(
                        Sprite::image(Target::within(SECTION_ID, ".barrage-container"), MISSILE_IMAGE)
                            .with_class(MISSILE_CLASS)
                            .with_style("left", percent(point.x))
                            .with_style("top", percent(point.y))
                            .labelled(label.clone()),
                    ),
                )
                .at(
                    options.flight_ms,
                    Mutation::add_class(Target::spawned(label), "explode"),
                )
        })
        .collect();

    intro(
        SECTION_ID,
        ".section-3-text",
        ".barrage-animation-container",
        options.intro,
    )
    .staggered_scripts(
        Stagger::spread(options.intro.container_ms, options.spread_ms),
        missiles,
    )
}
