//! End-to-end runs of the contact callback demo through real rapier steps.
//!
//! Run with: cargo test --test contact_callback_test

use contact_scene::{CollisionFlags, Color, ContactCallbackDemo, SceneConfig};

// Default grid: 5x1x5 boxes at (-5 + 2x, 0.5, -5 + 2z), ground at index 0,
// boxes at 1..=25 in x-major order.
const FIRST_BOX: usize = 1;
const FAR_CORNER_BOX: usize = 25;

fn demo() -> ContactCallbackDemo {
    let config = SceneConfig {
        seed: Some(5),
        ..SceneConfig::default()
    };
    ContactCallbackDemo::create(config).expect("default config should build")
}

fn run(demo: &mut ContactCallbackDemo, steps: usize) -> usize {
    (0..steps).map(|_| demo.update()).sum()
}

fn callback_enabled(demo: &ContactCallbackDemo, index: usize) -> bool {
    demo.scene()
        .collision_flags(index)
        .unwrap()
        .contains(CollisionFlags::CUSTOM_MATERIAL_CALLBACK)
}

#[test]
fn test_resting_on_ground_marks_nothing() {
    let mut demo = demo();

    let dispatched = run(&mut demo, 120);

    // Boxes touch the ground from the first step, so callbacks do fire.
    assert!(dispatched > 0, "Expected ground contacts to be dispatched");
    assert!(demo.collided().is_empty(), "Ground contacts must not mark boxes");
    for &index in demo.boxes() {
        assert!(callback_enabled(&demo, index));
    }
}

#[test]
fn test_dropped_box_marks_target() {
    let mut demo = demo();
    let original = demo.scene().entity(FAR_CORNER_BOX).unwrap().color;

    let shot = demo.tap([-5.0, 4.0, -5.0], [0.0, -1.0, 0.0]).unwrap();
    run(&mut demo, 60);

    let collided = demo.collided();
    assert!(collided.contains(&FIRST_BOX), "collided = {:?}", collided);
    assert!(!callback_enabled(&demo, FIRST_BOX));
    assert_eq!(demo.scene().entity(FIRST_BOX).unwrap().color, Color::RED);

    // The shot box never opted in, so it keeps its own color.
    assert!(!collided.contains(&shot));
    assert!(!collided.contains(&demo.ground()));

    // Untouched boxes keep their color and flag.
    assert_eq!(demo.scene().entity(FAR_CORNER_BOX).unwrap().color, original);
    assert!(callback_enabled(&demo, FAR_CORNER_BOX));
}

#[test]
fn test_horizontal_shot_marks_first_box_in_row() {
    let mut demo = demo();

    demo.tap([-9.0, 0.5, -5.0], [1.0, 0.0, 0.0]).unwrap();
    run(&mut demo, 90);

    assert!(demo.collided().contains(&FIRST_BOX));
    assert!(!demo.collided().contains(&FAR_CORNER_BOX));
}

#[test]
fn test_marked_box_stays_marked_after_more_contacts() {
    let mut demo = demo();

    demo.tap([-5.0, 4.0, -5.0], [0.0, -1.0, 0.0]).unwrap();
    run(&mut demo, 60);
    assert!(demo.collided().contains(&FIRST_BOX));

    // Hit it again; the flag is already cleared so nothing changes.
    demo.tap([-5.0, 6.0, -5.0], [0.0, -1.0, 0.0]).unwrap();
    run(&mut demo, 60);
    assert!(!callback_enabled(&demo, FIRST_BOX));
    assert_eq!(demo.scene().entity(FIRST_BOX).unwrap().color, Color::RED);
}

#[test]
fn test_no_marking_without_listener() {
    let mut demo = demo();
    assert!(demo.scene_mut().remove_contact_listener().is_some());

    demo.tap([-5.0, 4.0, -5.0], [0.0, -1.0, 0.0]).unwrap();
    let dispatched = run(&mut demo, 60);

    assert_eq!(dispatched, 0);
    assert!(demo.collided().is_empty());
    assert!(callback_enabled(&demo, FIRST_BOX));
}

#[test]
fn test_custom_marker_color() {
    let config = SceneConfig {
        seed: Some(5),
        marker_color: Color::new(0.0, 0.0, 1.0, 1.0),
        ..SceneConfig::default()
    };
    let mut demo = ContactCallbackDemo::create(config).unwrap();

    demo.tap([-5.0, 4.0, -5.0], [0.0, -1.0, 0.0]).unwrap();
    run(&mut demo, 60);

    assert_eq!(
        demo.scene().entity(FIRST_BOX).unwrap().color,
        Color::new(0.0, 0.0, 1.0, 1.0)
    );
}

#[test]
fn test_dispose_releases_every_body() {
    let mut demo = demo();
    demo.tap([0.0, 5.0, 0.0], [0.0, -1.0, 0.0]).unwrap();
    run(&mut demo, 10);

    // ground + 25 boxes + 1 shot
    assert_eq!(demo.dispose(), 27);
}
