// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records real flushes and checks the decoded stream.

use kurbo::{Rect, Size};
use stratum_core::config::RenderConfig;
use stratum_core::device::{GraphicsSurface, SurfaceFactory, SurfaceRequest};
use stratum_core::error::SurfaceError;
use stratum_core::node::{ClipPath, Container, NodeId};
use stratum_core::scene::Scene;
use stratum_core::scheduler::ManualScheduler;
use stratum_core::trace::{PhaseKind, SurfaceAction, Tracer};
use stratum_core::transform::Transform3d;
use stratum_debug::recorder::{RecordedEvent, RecorderSink, decode};

struct NullSurface;

impl GraphicsSurface for NullSurface {
    type Canvas = ();

    fn set_bounds(&mut self, _: Rect) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_transform(&mut self, _: &Transform3d) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_index(&mut self, _: i32) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_z_order(&mut self, _: i32) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_opacity(&mut self, _: f32) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_visible(&mut self, _: bool) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_clip_canvas_to_bounds(&mut self, _: bool) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn set_children_clip_path(&mut self, _: Option<&ClipPath>) -> Result<(), SurfaceError> {
        Ok(())
    }
    fn render(&mut self, paint: &mut dyn FnMut(&mut ())) -> Result<(), SurfaceError> {
        paint(&mut ());
        Ok(())
    }
    fn release(&mut self) {}
}

struct NullFactory;

impl SurfaceFactory for NullFactory {
    type Surface = NullSurface;

    fn create_surface(
        &mut self,
        _: SurfaceRequest<'_, NullSurface>,
    ) -> Result<NullSurface, SurfaceError> {
        Ok(NullSurface)
    }
}

fn scene() -> Scene<NullFactory> {
    let config = RenderConfig::new().with_display_size(Size::new(100.0, 100.0));
    Scene::new(NullFactory, ManualScheduler::new(), config)
}

fn record(scene: &mut Scene<NullFactory>) -> Vec<RecordedEvent> {
    let mut rec = RecorderSink::new();
    scene.on_frame_traced(Tracer::new(&mut rec));
    decode(rec.as_bytes()).map(|r| r.event).collect()
}

fn surface_events(events: &[RecordedEvent]) -> Vec<(NodeId, SurfaceAction)> {
    events
        .iter()
        .filter_map(|e| match e {
            RecordedEvent::Surface(s) => Some((s.node, s.action)),
            _ => None,
        })
        .collect()
}

#[test]
fn first_frame_is_bracketed_and_summarized() {
    let mut scene = scene();
    let a = scene.create_node();
    scene.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
    scene.add_child(Container::Display, a).unwrap();

    let events = record(&mut scene);
    assert!(matches!(events.first(), Some(RecordedEvent::FrameBegin(_))));
    let Some(RecordedEvent::FrameSummary(summary)) = events.last() else {
        panic!("last event should be the summary: {events:?}");
    };
    assert_eq!(summary.surfaces_created, 1);
    assert_eq!(surface_events(&events), [(a, SurfaceAction::Created)]);

    let begins = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::PhaseBegin(_)))
        .count();
    let ends = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::PhaseEnd(_)))
        .count();
    assert_eq!(begins, ends);
    assert!(events.iter().any(|e| matches!(
        e,
        RecordedEvent::PhaseEnd(p) if p.phase == PhaseKind::Paint && p.count == 1
    )));
}

#[test]
fn removal_shows_up_as_a_release() {
    let mut scene = scene();
    let a = scene.create_node();
    scene.set_bounds(a, Rect::new(0.0, 0.0, 10.0, 10.0));
    scene.add_child(Container::Display, a).unwrap();
    record(&mut scene);

    scene.remove_child(Container::Display, a).unwrap();
    let events = record(&mut scene);
    assert_eq!(surface_events(&events), [(a, SurfaceAction::Released)]);
}
