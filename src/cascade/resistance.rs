//! Section 2: a sea of NPCs on the right, landmines, the tank rolling in and
//! the resistance characters spawning one by one.
//!
//! - 2500ms sea container active, all sea sprites 100ms later
//! - 3800ms landmines, 200ms apart
//! - 4800ms tank appended, `enter` 50ms later
//! - 6800ms characters, 300ms apart, `spawn` 50ms after each
use super::{intro, jitter, percent, Cascade, Phase, Stagger};
use crate::config::{Layout, ResistanceOptions};
use crate::engine::{Mutation, Sprite, Target};
use crate::placement::{Exclusion, PlacementSampler, Point, Region};
use rand::Rng;

pub const SECTION_ID: &str = "scroll-section-2";
pub const SEA_CLASS: &str = "jeet-sea-character";
pub const LANDMINE_CLASS: &str = "landmine";
pub const CHARACTER_CLASS: &str = "resistance-character";

const NPC_IMAGE: &str = "img/Character - NPC.png";
const LANDMINE_IMAGE: &str = "img/Aux - Landmine.png";
const TANK_IMAGE: &str = "img/Aux - Tank.png";

const SEA_SPAWN_DELAY_MS: u32 = 100;
const SEA_PHASE_MS: u32 = 1300;
const LANDMINE_STEP_MS: u32 = 200;
const LANDMINE_PHASE_MS: u32 = 1000;
const TANK_PHASE_MS: u32 = 2000;
const CHARACTER_STEP_MS: u32 = 300;
const ENTRANCE_DELAY_MS: u32 = 50;

pub const TANK_POSITION: Point = Point::new(5.0, 50.0);

pub struct Character {
    pub name: &'static str,
    pub image: &'static str,
    /// slot used by the fixed layout
    pub slot: Point,
    pub flipped: bool,
}

/// 4 columns x 2 rows, staggered vertically
pub const CHARACTERS: [Character; 8] = [
    Character { name: "Catpop", image: "img/Character - Catpop.png", slot: Point::new(15.0, 15.0), flipped: false },
    Character { name: "DogeWW1", image: "img/Character - DogeWW1.png", slot: Point::new(30.0, 25.0), flipped: false },
    Character { name: "Dogwifhat", image: "img/Character - Dogwifhat.png", slot: Point::new(45.0, 15.0), flipped: false },
    Character { name: "Moodeng", image: "img/Character - Moodeng.png", slot: Point::new(60.0, 25.0), flipped: true },
    Character { name: "Pepe", image: "img/Character - Pepe.png", slot: Point::new(15.0, 45.0), flipped: false },
    Character { name: "Wojak", image: "img/Character - Wojak.png", slot: Point::new(30.0, 55.0), flipped: true },
    Character { name: "Soyjak", image: "img/Character - Soyjak.png", slot: Point::new(45.0, 45.0), flipped: true },
    Character { name: "Shiba", image: "img/Character - Shiba.png", slot: Point::new(60.0, 55.0), flipped: false },
];

/// Clear of the tank and the characters, concentrated at the bottom.
pub const LANDMINE_SLOTS: [Point; 6] = [
    Point::new(55.0, 65.0),
    Point::new(70.0, 55.0),
    Point::new(45.0, 75.0),
    Point::new(80.0, 70.0),
    Point::new(60.0, 85.0),
    Point::new(75.0, 80.0),
];

const LANDMINE_REGION: Region = Region::new((40.0, 85.0), (55.0, 90.0));
const CHARACTER_REGION: Region = Region::new((12.0, 65.0), (10.0, 60.0));
const LANDMINE_TANK_CLEARANCE: f64 = 20.0;
const LANDMINE_SPACING: f64 = 10.0;
const CHARACTER_TANK_CLEARANCE: f64 = 15.0;
const CHARACTER_LANDMINE_CLEARANCE: f64 = 12.0;
const CHARACTER_SPACING: f64 = 12.0;

pub struct Positions {
    pub landmines: Vec<Point>,
    pub characters: Vec<Point>,
}

pub fn positions<R: Rng + ?Sized>(options: &ResistanceOptions, rng: &mut R) -> Positions {
    match options.layout {
        Layout::Fixed => Positions {
            landmines: LANDMINE_SLOTS.to_vec(),
            characters: CHARACTERS.iter().map(|character| character.slot).collect(),
        },
        Layout::Sampled => {
            let tank = [TANK_POSITION];
            let landmines = PlacementSampler::single(LANDMINE_REGION, options.landmine_attempts)
                .scatter(
                    rng,
                    options.landmines,
                    LANDMINE_SPACING,
                    &[Exclusion::new(&tank, LANDMINE_TANK_CLEARANCE)],
                );
            let characters = PlacementSampler::single(CHARACTER_REGION, options.character_attempts)
                .scatter(
                    rng,
                    CHARACTERS.len(),
                    CHARACTER_SPACING,
                    &[
                        Exclusion::new(&tank, CHARACTER_TANK_CLEARANCE),
                        Exclusion::new(&landmines, CHARACTER_LANDMINE_CLEARANCE),
                    ],
                );
            Positions {
                landmines,
                characters,
            }
        }
    }
}

fn sea_sprite<R: Rng + ?Sized>(index: usize, count: usize, columns: usize, rng: &mut R) -> Mutation {
    let rows = count.div_ceil(columns).max(1);
    let column = index % columns;
    let row = index / columns;
    let left = column as f64 * (100.0 / columns as f64) + jitter(rng, 4.0);
    let top = row as f64 * (100.0 / rows as f64) + jitter(rng, 2.5);
    let delay = index as f64 / count as f64 * 0.8;
    Mutation::Spawn(
        Sprite::image(Target::within(SECTION_ID, ".jeets-sea-container"), NPC_IMAGE)
            .with_class(SEA_CLASS)
            .with_style("left", percent(left))
            .with_style("top", percent(top))
            .with_style("animation-delay", format!("{:.3}s", delay)),
    )
}

fn landmine<R: Rng + ?Sized>(position: Point, rng: &mut R) -> Mutation {
    Mutation::Spawn(
        Sprite::image(Target::within(SECTION_ID, ".landmines-container"), LANDMINE_IMAGE)
            .with_class(LANDMINE_CLASS)
            .with_style("left", percent(position.x))
            .with_style("top", percent(position.y))
            // varied throbbing
            .with_style("animation-delay", format!("{:.2}s", rng.gen_range(0.0..2.0))),
    )
}

fn character(index: usize, character: &Character, position: Point) -> Cascade {
    let label = format!("resistance-{}", character.name);
    let mut sprite = Sprite::image(
        Target::within(SECTION_ID, ".resistance-characters-container"),
        character.image,
    )
    .with_class(CHARACTER_CLASS)
    .with_style("left", percent(position.x))
    .with_style("top", percent(position.y))
    .labelled(label.clone());
    if character.flipped {
        sprite = sprite.with_style("transform", "scaleY(-1)");
    }
    log_placement(index, character.name, position);
    Cascade::new().at(0, Mutation::Spawn(sprite)).at(
        ENTRANCE_DELAY_MS,
        Mutation::add_class(Target::spawned(label), "spawn"),
    )
}

#[cfg(debug_assertions)]
fn log_placement(index: usize, name: &str, position: Point) {
    log!("resistance: #{} {} at ({:.1}%, {:.1}%)", index, name, position.x, position.y);
}

#[cfg(not(debug_assertions))]
fn log_placement(_index: usize, _name: &str, _position: Point) {}

pub fn script<R: Rng + ?Sized>(options: &ResistanceOptions, mobile: bool, rng: &mut R) -> Cascade {
    let Positions {
        landmines,
        characters,
    } = positions(options, rng);

    let sea = Phase::new(options.intro.container_ms, SEA_PHASE_MS);
    let mines = sea.then(LANDMINE_PHASE_MS);
    let tank = mines.then(TANK_PHASE_MS);

    let columns = if mobile { 3 } else { 5 };
    let sea_sprites = (0..options.sea)
        .map(|index| sea_sprite(index, options.sea, columns, rng))
        .collect();
    let landmine_sprites = landmines
        .iter()
        .map(|position| landmine(*position, rng))
        .collect();
    let character_scripts = CHARACTERS
        .iter()
        .zip(characters)
        .enumerate()
        .map(|(index, (character_def, position))| character(index, character_def, position))
        .collect();

    let tank_container = Target::within(SECTION_ID, ".tank-container");
    intro(
        SECTION_ID,
        ".section-2-text",
        ".resistance-animation-container",
        options.intro,
    )
    .at(
        sea.start_ms,
        Mutation::add_class(Target::within(SECTION_ID, ".jeets-sea-container"), "active"),
    )
    .staggered(
        Stagger::burst(SEA_SPAWN_DELAY_MS).after(sea.start_ms),
        sea_sprites,
    )
    .staggered(Stagger::fixed(mines.start_ms, LANDMINE_STEP_MS), landmine_sprites)
    .at(
        tank.start_ms,
        Mutation::Spawn(Sprite::image(tank_container.clone(), TANK_IMAGE).with_alt("Tank")),
    )
    .at(
        tank.start_ms.saturating_add(ENTRANCE_DELAY_MS),
        Mutation::add_class(tank_container, "enter"),
    )
    .staggered_scripts(
        Stagger::fixed(tank.end(), CHARACTER_STEP_MS),
        character_scripts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn spawn_times(cascade: &Cascade, class: &str) -> Vec<u32> {
        cascade
            .steps()
            .iter()
            .filter(|step| {
                step.mutation
                    .spawned_sprite()
                    .map_or(false, |sprite| sprite.class == Some(class))
            })
            .map(|step| step.at_ms)
            .collect()
    }

    #[test]
    fn fixed_layout_timeline() {
        let cascade = script(
            &ResistanceOptions::default(),
            false,
            &mut SmallRng::seed_from_u64(1),
        );
        assert_eq!(spawn_times(&cascade, SEA_CLASS), vec![2600; 50]);
        assert_eq!(
            spawn_times(&cascade, LANDMINE_CLASS),
            vec![3800, 4000, 4200, 4400, 4600, 4800]
        );
        assert_eq!(
            spawn_times(&cascade, CHARACTER_CLASS),
            vec![6800, 7100, 7400, 7700, 8000, 8300, 8600, 8900]
        );
        let enter = cascade.steps().iter().find(|step| {
            step.mutation == Mutation::add_class(Target::within(SECTION_ID, ".tank-container"), "enter")
        });
        assert_eq!(enter.map(|step| step.at_ms), Some(4850));
    }

    #[test]
    fn characters_get_spawn_class_after_creation() {
        let cascade = script(&ResistanceOptions::default(), false, &mut SmallRng::seed_from_u64(1));
        let spawn = cascade.steps().iter().find(|step| {
            step.mutation == Mutation::add_class(Target::spawned("resistance-Catpop"), "spawn")
        });
        assert_eq!(spawn.map(|step| step.at_ms), Some(6850));
    }

    #[test]
    fn flipped_characters_are_mirrored() {
        let cascade = script(&ResistanceOptions::default(), false, &mut SmallRng::seed_from_u64(1));
        let flipped: Vec<&str> = cascade
            .steps()
            .iter()
            .filter_map(|step| step.mutation.spawned_sprite())
            .filter(|sprite| sprite.style("transform") == Some("scaleY(-1)"))
            .filter_map(|sprite| sprite.label.as_deref())
            .collect();
        assert_eq!(
            flipped,
            vec!["resistance-Moodeng", "resistance-Wojak", "resistance-Soyjak"]
        );
    }

    #[test]
    fn sampled_layout_keeps_clear_of_the_tank() {
        let options = ResistanceOptions {
            layout: Layout::Sampled,
            landmines: 10,
            ..ResistanceOptions::default()
        };
        let placed = positions(&options, &mut SmallRng::seed_from_u64(11));
        assert_eq!(placed.landmines.len(), 10);
        assert_eq!(placed.characters.len(), CHARACTERS.len());
        // regions never reach the tank, so these hold even on cap exhaustion
        for mine in &placed.landmines {
            assert!(mine.distance(&TANK_POSITION) >= LANDMINE_TANK_CLEARANCE);
        }
        for spot in &placed.characters {
            assert!(spot.distance(&TANK_POSITION) >= 7.0);
        }
    }

    #[test]
    fn mobile_sea_uses_three_columns() {
        let cascade = script(&ResistanceOptions::default(), true, &mut SmallRng::seed_from_u64(5));
        let sea_lefts: Vec<f64> = cascade
            .steps()
            .iter()
            .filter_map(|step| step.mutation.spawned_sprite())
            .filter(|sprite| sprite.class == Some(SEA_CLASS))
            .map(|sprite| sprite.style("left").unwrap().trim_end_matches('%').parse().unwrap())
            .collect();
        assert!(sea_lefts.iter().all(|left| *left < 71.0));
    }
}
