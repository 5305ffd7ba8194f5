//! The LIFO render-target redirection protocol.
//!
//! Pushing a target redirects rendering to its surfaces; popping returns
//! to the previous one. The back-buffer bindings are captured exactly once,
//! when the stack leaves depth 0, and restored when it unwinds back to
//! depth 0, so a well-nested sequence always ends on the surfaces that were
//! active before the first push. Nesting violations are authoring bugs and
//! fatal.

use crate::render::assets::target::TargetHandle;
use crate::render::device::{BoundSurfaces, Device, SurfaceId};

/// What the caller owes the device after a pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopAction {
    /// The stack unwound to depth 0; the captured back-buffer surfaces were
    /// restored. Nothing left to do.
    Restored,
    /// Another target is now on top; the caller must re-establish its
    /// surface bindings (without pushing) via [`TargetStack::bind`].
    ///
    /// [`TargetStack::bind`]: struct.TargetStack.html#method.bind
    Rebind(TargetHandle),
}

/// The redirection stack itself. It tracks handles and the back-buffer
/// capture; surface resolution stays with the caller, which owns the pools.
pub struct TargetStack {
    stack: Vec<TargetHandle>,
    saved: Option<BoundSurfaces>,
    color_slots: usize,
}

impl TargetStack {
    /// `color_slots` is the device's simultaneous color attachment count;
    /// every bind touches all of them so undeclared slots are left cleared,
    /// never inherited from the previous target.
    pub fn new(color_slots: usize) -> Self {
        TargetStack {
            stack: Vec::new(),
            saved: None,
            color_slots,
        }
    }

    /// Current nesting depth. Depth 0 means the back buffer is active.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The currently active target, if any.
    #[inline]
    pub fn active(&self) -> Option<TargetHandle> {
        self.stack.last().cloned()
    }

    /// Returns true if `handle` is anywhere on the stack, active or
    /// covered.
    #[inline]
    pub fn contains(&self, handle: TargetHandle) -> bool {
        self.stack.contains(&handle)
    }

    /// Binds `colors` to slots `0..n`, clears the remaining slots, and
    /// binds or clears the depth-stencil surface. Does not grow the stack.
    pub fn bind(&self, device: &mut dyn Device, colors: &[SurfaceId], depth: Option<SurfaceId>) {
        for slot in 0..self.color_slots {
            device.bind_color_surface(slot, colors.get(slot).cloned());
        }

        device.bind_depth_surface(depth);
    }

    /// Redirects rendering to `handle`'s surfaces and records it as the new
    /// stack top. Captures the device's bound surfaces first when this is
    /// the outermost push.
    pub fn push(
        &mut self,
        device: &mut dyn Device,
        handle: TargetHandle,
        colors: &[SurfaceId],
        depth: Option<SurfaceId>,
    ) {
        if self.stack.is_empty() {
            self.saved = Some(device.bound_surfaces());
        }

        self.bind(device, colors, depth);
        self.stack.push(handle);
    }

    /// Pops `handle` off the stack. `handle` must be the current top;
    /// anything else is a nesting bug in the calling render pass and
    /// panics.
    ///
    /// When the stack empties, the captured back-buffer surfaces are
    /// restored here and the capture discarded. Otherwise the caller is
    /// handed the uncovered top to re-bind.
    pub fn pop(&mut self, device: &mut dyn Device, handle: TargetHandle) -> PopAction {
        match self.stack.last() {
            Some(&top) if top == handle => {}
            top => panic!(
                "render-target nesting violated: popping {} while the top is {:?}",
                handle, top
            ),
        }

        self.stack.pop();

        if let Some(&next) = self.stack.last() {
            return PopAction::Rebind(next);
        }

        if let Some(saved) = self.saved.take() {
            for slot in 0..self.color_slots {
                device.bind_color_surface(slot, saved.colors.get(slot).cloned().unwrap_or(None));
            }

            device.bind_depth_surface(saved.depth);
        }

        PopAction::Restored
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::headless::{HeadlessDevice, BACKBUFFER_COLOR, BACKBUFFER_DEPTH};

    fn handle(index: u32) -> TargetHandle {
        crate::utils::handle::Handle::new(index, 1).into()
    }

    #[test]
    fn unwinding_restores_the_back_buffer() {
        let mut device = HeadlessDevice::new();
        let mut stack = TargetStack::new(2);

        let a = handle(0);
        let b = handle(1);

        stack.push(&mut device, a, &[SurfaceId(10)], Some(SurfaceId(11)));
        stack.push(&mut device, b, &[SurfaceId(20)], None);
        assert_eq!(stack.active(), Some(b));

        assert_eq!(stack.pop(&mut device, b), PopAction::Rebind(a));
        stack.bind(&mut device, &[SurfaceId(10)], Some(SurfaceId(11)));
        assert_eq!(stack.active(), Some(a));

        assert_eq!(stack.pop(&mut device, a), PopAction::Restored);
        assert_eq!(stack.depth(), 0);

        let bound = device.bound_surfaces();
        assert_eq!(bound.colors[0], Some(BACKBUFFER_COLOR));
        assert_eq!(bound.colors[1], None);
        assert_eq!(bound.depth, Some(BACKBUFFER_DEPTH));
    }

    #[test]
    fn undeclared_slots_are_cleared() {
        let mut device = HeadlessDevice::new();
        let mut stack = TargetStack::new(4);

        stack.push(&mut device, handle(0), &[SurfaceId(10)], None);

        let bound = device.bound_surfaces();
        assert_eq!(bound.colors[0], Some(SurfaceId(10)));
        assert_eq!(bound.colors[1], None);
        assert_eq!(bound.depth, None);
    }

    #[test]
    #[should_panic(expected = "nesting violated")]
    fn popping_a_non_top_target_is_fatal() {
        let mut device = HeadlessDevice::new();
        let mut stack = TargetStack::new(2);

        stack.push(&mut device, handle(0), &[SurfaceId(10)], None);
        stack.push(&mut device, handle(1), &[SurfaceId(20)], None);
        stack.pop(&mut device, handle(0));
    }
}
