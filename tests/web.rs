// Browser tests for the DOM-backed stage. Run with `wasm-pack test --headless`.
#![cfg(target_arch = "wasm32")]

use meme_war_page::config::{LoadingOptions, PageOptions};
use meme_war_page::engine::{
    DomStage, Journal, Mutation, PageLoop, Sprite, Stage, Target, Viewport, VirtualClock,
    Visibility, Wiring,
};
use meme_war_page::loading::LoadingOverlay;
use meme_war_page::page::Battlefield;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::rc::Rc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn mount(id: &str) -> web_sys::Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let root = document.create_element("div").unwrap();
    root.set_id(id);
    document.body().unwrap().append_child(&root).unwrap();
    root
}

#[wasm_bindgen_test]
fn spawned_nodes_can_be_targeted_by_label() {
    let root = mount("stage-root");
    let stage = DomStage::new();
    stage
        .apply(&Mutation::Spawn(
            Sprite::block(Target::id("stage-root"))
                .with_class("red-candle")
                .with_style("height", "120px")
                .labelled("candle-0"),
        ))
        .unwrap();
    stage
        .apply(&Mutation::add_class(Target::spawned("candle-0"), "active"))
        .unwrap();

    assert_eq!(root.child_element_count(), 1);
    let candle = root.first_element_child().unwrap();
    assert_eq!(candle.class_name(), "red-candle active");
}

#[wasm_bindgen_test]
fn missing_targets_are_errors_not_panics() {
    let stage = DomStage::new();
    assert!(stage
        .apply(&Mutation::add_class(Target::id("no-such-section"), "active"))
        .is_err());
    assert!(stage
        .apply(&Mutation::add_class(Target::spawned("never-spawned"), "spawn"))
        .is_err());
}

#[wasm_bindgen_test]
fn images_get_their_source() {
    let root = mount("image-root");
    let stage = DomStage::new();
    stage
        .apply(&Mutation::Spawn(
            Sprite::image(Target::id("image-root"), "img/Aux - Tank.png").with_alt("Tank"),
        ))
        .unwrap();
    let tank = root.first_element_child().unwrap();
    assert_eq!(tank.tag_name(), "IMG");
    assert_eq!(tank.get_attribute("alt").as_deref(), Some("Tank"));
}

#[wasm_bindgen_test]
fn absent_sections_are_skipped_and_the_rest_observed() {
    let present = mount("collect-present");
    present.set_class_name("collect-section");
    let anonymous = mount("");
    anonymous.set_class_name("collect-section");
    let listed = mount("collect-listed");

    let wiring = Wiring {
        scroll_container_id: "main-content".to_string(),
        section_ids: vec![
            "collect-present".to_string(),
            "collect-absent".to_string(),
            "collect-listed".to_string(),
        ],
        section_selector: ".collect-section".to_string(),
        threshold: 0.1,
        root_margin: "0px".to_string(),
    };
    let sections = PageLoop::collect_sections(&wiring).unwrap();
    let ids: Vec<String> = sections.iter().map(|section| section.id()).collect();
    assert_eq!(ids, vec!["collect-present", "", "collect-listed"]);
    assert_eq!(sections[2], listed);
}

#[wasm_bindgen_test]
async fn missing_percentage_reveals_content_at_once() {
    let clock = VirtualClock::new();
    let journal = Rc::new(Journal::new(&clock));
    let stage: Rc<dyn Stage> = journal.clone();
    let mut rng = SmallRng::seed_from_u64(8);

    LoadingOverlay::new(LoadingOptions::default())
        .run(&mut rng, &clock, &stage)
        .await
        .unwrap();

    assert_eq!(clock.pending(), 0);
    let applied: Vec<Mutation> = journal
        .entries()
        .into_iter()
        .map(|(_, mutation)| mutation)
        .collect();
    assert_eq!(
        applied,
        vec![
            Mutation::set_style(Target::id("loading-screen"), "display", "none"),
            Mutation::remove_class(Target::id("main-content"), "hidden"),
        ]
    );
}

#[wasm_bindgen_test]
fn sections_without_an_id_still_animate_in() {
    let section = mount("");
    section.set_class_name("scroll-section");
    let mut battlefield = Battlefield::new(
        PageOptions::default(),
        Viewport::DESKTOP,
        Rc::new(VirtualClock::new()),
        Rc::new(DomStage::new()),
    );
    let visible = Visibility {
        intersecting: true,
        ratio: 0.5,
    };
    assert_eq!(
        battlefield.on_section_entry(Target::Node(section.clone()), &section.id(), visible),
        None
    );
    assert!(section.class_list().contains("animate-in"));
}
