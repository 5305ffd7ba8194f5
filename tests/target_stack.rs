use cgmath::Vector2;

use ember::prelude::*;
use ember::render::headless::{BACKBUFFER_COLOR, BACKBUFFER_DEPTH};

fn target(colors: &[ColorFormat], depth: Option<DepthFormat>) -> TargetParams {
    TargetParams {
        colors: colors.iter().cloned().collect(),
        depth,
        dimensions: Vector2::new(128, 128),
    }
}

fn system() -> (RenderSystem<HeadlessDevice>, TargetHandle, TargetHandle) {
    let registry = Registry::build()
        .target(
            "scene",
            target(
                &[ColorFormat::Rgba16f, ColorFormat::R32f],
                Some(DepthFormat::Depth24Stencil8),
            ),
        )
        .target("blur", target(&[ColorFormat::Rgba8], None))
        .finish();

    let mut sys = RenderSystem::new(HeadlessDevice::new(), registry).unwrap();

    let scene = sys.shared().target_handle("scene").unwrap();
    let blur = sys.shared().target_handle("blur").unwrap();
    assert!(sys.init_target(scene).unwrap());
    assert!(sys.init_target(blur).unwrap());

    (sys, scene, blur)
}

#[test]
fn unwinding_restores_the_back_buffer_exactly() {
    let (mut sys, scene, blur) = system();

    let before = sys.device().bound_surfaces();
    assert_eq!(before.colors[0], Some(BACKBUFFER_COLOR));
    assert_eq!(before.depth, Some(BACKBUFFER_DEPTH));

    sys.push_target(scene).unwrap();
    assert_eq!(sys.active_target(), Some(scene));

    sys.push_target(blur).unwrap();
    assert_eq!(sys.active_target(), Some(blur));

    sys.pop_target(blur).unwrap();
    assert_eq!(sys.active_target(), Some(scene));

    sys.pop_target(scene).unwrap();
    assert_eq!(sys.active_target(), None);
    assert_eq!(sys.device().bound_surfaces(), before);
}

#[test]
fn undeclared_slots_are_cleared_on_every_redirection() {
    let (mut sys, scene, blur) = system();

    sys.push_target(scene).unwrap();
    let bound = sys.device().bound_surfaces();
    assert!(bound.colors[0].is_some());
    assert!(bound.colors[1].is_some());
    assert_eq!(bound.colors[2], None);
    assert!(bound.depth.is_some());

    // A depth-less single-color target must not inherit scene's bindings.
    sys.push_target(blur).unwrap();
    let bound = sys.device().bound_surfaces();
    assert!(bound.colors[0].is_some());
    assert_eq!(bound.colors[1], None);
    assert_eq!(bound.depth, None);

    sys.pop_target(blur).unwrap();
    sys.pop_target(scene).unwrap();
}

#[test]
fn popping_rebinds_the_uncovered_target() {
    let (mut sys, scene, blur) = system();

    sys.push_target(scene).unwrap();
    let scene_bound = sys.device().bound_surfaces();

    sys.push_target(blur).unwrap();
    sys.pop_target(blur).unwrap();

    assert_eq!(sys.device().bound_surfaces(), scene_bound);
    sys.pop_target(scene).unwrap();
}

#[test]
fn scope_guard_restores_on_every_exit_path() {
    let (mut sys, scene, blur) = system();
    let before = sys.device().bound_surfaces();

    {
        let mut scope = sys.target_scope(scene).unwrap();
        assert_eq!(scope.active_target(), Some(scene));

        let inner = scope.target_scope(blur).unwrap();
        assert_eq!(inner.active_target(), Some(blur));
    }
    assert_eq!(sys.active_target(), None);
    assert_eq!(sys.device().bound_surfaces(), before);

    fn failing_pass(
        sys: &mut RenderSystem<HeadlessDevice>,
        target: TargetHandle,
    ) -> Result<()> {
        let _scope = sys.target_scope(target)?;
        Err(Error::Device("simulated mid-pass failure".into()))
    }

    assert!(failing_pass(&mut sys, blur).is_err());
    assert_eq!(sys.active_target(), None);
    assert_eq!(sys.device().bound_surfaces(), before);
}

#[test]
fn redirection_requires_an_initialized_target() {
    let registry = Registry::build()
        .target("late", target(&[ColorFormat::Rgba8], None))
        .finish();

    let mut sys = RenderSystem::new(HeadlessDevice::new(), registry).unwrap();
    let late = sys.shared().target_handle("late").unwrap();

    match sys.push_target(late) {
        Err(Error::NotInitialized(_)) => {}
        v => panic!("unexpected {:?}", v),
    }
}

#[test]
#[should_panic(expected = "nesting violated")]
fn popping_a_non_top_target_is_fatal() {
    let (mut sys, scene, blur) = system();

    sys.push_target(scene).unwrap();
    sys.push_target(blur).unwrap();
    let _ = sys.pop_target(scene);
}

#[test]
#[should_panic(expected = "nesting violated")]
fn deleting_a_pushed_target_is_fatal() {
    let (mut sys, scene, blur) = system();

    sys.push_target(scene).unwrap();
    sys.push_target(blur).unwrap();

    // Covered targets are just as live as the active one; deleting either
    // would leave bound surfaces dangling on the device.
    sys.delete_target(scene);
}
