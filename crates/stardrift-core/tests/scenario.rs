use glam::Vec2;
use stardrift_core::{
    AnimationEngine, EngineConfig, EngineState, FieldEngine, TrailEngine,
};
use stardrift_platform::{
    DrawingSurface, EventRegistry, HeadlessHost, ListenerKind, RecordingSurface, Viewport,
};

/// Runs one host tick: every fired handle goes to the engine that asked for it.
fn tick(host: &mut HeadlessHost, engines: &mut [&mut dyn AnimationEngine]) -> usize {
    let fired = host.fire_frames();
    let mut stepped = 0;
    for engine in engines.iter_mut() {
        if engine.pending_frame().is_some_and(|h| fired.contains(&h)) {
            engine.step(host);
            stepped += 1;
        }
    }
    stepped
}

fn pointer_move(host: &HeadlessHost, engines: &mut [&mut dyn AnimationEngine], client: Vec2) {
    for id in host.listeners_for(ListenerKind::PointerMove) {
        for engine in engines.iter_mut() {
            if engine.owns_listener(id) {
                engine.on_pointer_move(client);
            }
        }
    }
}

#[test]
fn reference_viewport_scenario() {
    let config = EngineConfig::default();
    let mut host = HeadlessHost::new(Viewport::new(800, 600));
    let mut field = FieldEngine::new(config.field.clone(), Some(RecordingSurface::default()))
        .with_seed(11);
    let mut trail = TrailEngine::new(config.trail.clone(), Some(RecordingSurface::default()))
        .with_seed(12);

    field.create(&mut host);
    trail.create(&mut host);
    assert_eq!(field.particles().len(), 60);
    assert_eq!(host.pending_frames(), 2);

    pointer_move(&host, &mut [&mut field, &mut trail], Vec2::new(10.0, 0.0));
    assert_eq!(trail.particles().len(), 2);
    assert_eq!(field.pointer(), Some(Vec2::new(10.0, 0.0)));

    pointer_move(&host, &mut [&mut field, &mut trail], Vec2::new(13.0, 0.0));
    assert_eq!(trail.particles().len(), 2);

    for _ in 0..5 {
        assert_eq!(tick(&mut host, &mut [&mut field, &mut trail]), 2);
    }
    assert!((field.time() - 0.05).abs() < 1e-5);
    assert_eq!(field.particles().len(), 60);
}

#[test]
fn teardown_is_idempotent_and_final() {
    let mut host = HeadlessHost::new(Viewport::new(640, 480));
    let mut field = FieldEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(5);
    let mut trail = TrailEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(6);
    field.create(&mut host);
    trail.create(&mut host);
    tick(&mut host, &mut [&mut field, &mut trail]);
    assert_eq!(host.pending_frames(), 2);

    field.teardown(&mut host);
    field.teardown(&mut host);
    assert_eq!(field.state(), EngineState::TornDown);
    assert_eq!(host.pending_frames(), 1);
    assert_eq!(host.listener_count(ListenerKind::Resize), 1);

    // the trail keeps running on its own
    assert_eq!(tick(&mut host, &mut [&mut field, &mut trail]), 1);

    trail.teardown(&mut host);
    trail.teardown(&mut host);
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.listener_count(ListenerKind::PointerMove), 0);
    assert_eq!(tick(&mut host, &mut [&mut field, &mut trail]), 0);
    assert!(field.surface().is_none() && trail.surface().is_none());
}

#[test]
fn frame_in_flight_is_cancelled_by_teardown() {
    let mut host = HeadlessHost::new(Viewport::new(320, 240));
    let mut field = FieldEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(1);
    field.create(&mut host);
    let in_flight = field.pending_frame().unwrap();
    field.teardown(&mut host);
    let fired = host.fire_frames();
    assert!(!fired.contains(&in_flight));
}

#[test]
fn resize_dispatch_rebuilds_field_only() {
    let mut host = HeadlessHost::new(Viewport::new(800, 600));
    let mut field = FieldEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(2);
    let mut trail = TrailEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(3);
    field.create(&mut host);
    trail.create(&mut host);
    pointer_move(&host, &mut [&mut field, &mut trail], Vec2::new(100.0, 100.0));
    let trail_live = trail.particles().len();

    let resized = Viewport::new(1600, 1200);
    host.set_viewport(resized);
    for id in host.listeners_for(ListenerKind::Resize) {
        for engine in [&mut field as &mut dyn AnimationEngine, &mut trail] {
            if engine.owns_listener(id) {
                engine.on_resize(resized);
            }
        }
    }
    assert_eq!(field.particles().len(), 150);
    assert_eq!(trail.particles().len(), trail_live);
    assert_eq!(field.surface().unwrap().viewport(), resized);
    assert_eq!(trail.surface().unwrap().viewport(), resized);
}

#[test]
fn engine_without_surface_never_registers() {
    let mut host = HeadlessHost::new(Viewport::new(800, 600));
    let mut field: FieldEngine<RecordingSurface> = FieldEngine::new(Default::default(), None);
    field.create(&mut host);
    assert_eq!(field.state(), EngineState::Uninitialized);
    assert!(field.pending_frame().is_none());
    let stranger = host.add_listener(ListenerKind::PointerMove);
    assert!(!field.owns_listener(stranger));
    assert!(host.fire_frames().is_empty());
}

#[test]
fn config_file_drives_engines() {
    let config = EngineConfig::from_toml_str(
        r#"
        seed = 99
        [field]
        max_count = 12
        [trail]
        burst_cap = 3
        "#,
    )
    .unwrap();
    let mut host = HeadlessHost::new(Viewport::new(800, 600));
    let mut field = FieldEngine::new(config.field.clone(), Some(RecordingSurface::default()))
        .with_seed(config.seed.unwrap());
    let mut trail = TrailEngine::new(config.trail.clone(), Some(RecordingSurface::default()))
        .with_seed(config.seed.unwrap());
    field.create(&mut host);
    trail.create(&mut host);
    trail.on_pointer_move(Vec2::new(300.0, 400.0));
    assert_eq!(field.particles().len(), 12);
    assert_eq!(trail.particles().len(), 3);
}

#[test]
fn stepping_before_frame_fires_leaves_nothing_queued() {
    let mut host = HeadlessHost::new(Viewport::new(200, 200));
    let mut field = FieldEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(8);
    let mut trail = TrailEngine::new(Default::default(), Some(RecordingSurface::default()))
        .with_seed(9);
    field.create(&mut host);
    trail.create(&mut host);

    field.step(&mut host);
    field.step(&mut host);
    trail.step(&mut host);
    assert_eq!(host.pending_frames(), 2);

    field.teardown(&mut host);
    field.teardown(&mut host);
    trail.teardown(&mut host);
    assert_eq!(host.pending_frames(), 0);
    assert!(host.fire_frames().is_empty());
}
