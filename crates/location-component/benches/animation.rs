//! Performance benchmarks for location-component
//!
//! Run with: cargo bench --package location-component
//!
//! Measures the per-fix and per-frame cost of the animation pipeline against the
//! headless map and renderer.

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use location_component::{
    CameraMode, CameraPosition, FeatureLayerRenderer, HeadlessMapCamera, LatLng, Location,
    LocationComponent, LocationComponentOptions, ManualClock, RenderMode,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

/// A started, enabled component in the given modes
fn component(clock: &ManualClock, camera_mode: CameraMode, render_mode: RenderMode) -> LocationComponent {
    let map = Rc::new(RefCell::new(HeadlessMapCamera::new(CameraPosition::new(
        LatLng::new(51.5, -0.1),
        16.0,
        0.0,
        0.0,
    ))));
    let renderer = Rc::new(RefCell::new(FeatureLayerRenderer::new()));
    let mut component = LocationComponent::new(
        map,
        renderer,
        LocationComponentOptions::default(),
        Rc::new(clock.clone()),
    )
    .unwrap();
    component.on_start();
    component.set_location_component_enabled(true);
    component.set_render_mode(render_mode);
    component.set_camera_mode(camera_mode);
    component
}

/// Fixes along a gently curving path, one per second
fn generate_fixes(count: usize) -> Vec<Location> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            Location::new(
                LatLng::new(51.5 + t * 0.05, -0.1 + (t * 20.0).sin() * 0.001),
                (i as f32 * 3.0) % 360.0,
                5.0 + (i % 7) as f32,
                Duration::from_secs(i as u64),
            )
        })
        .collect()
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_feed_location(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed_location");
    let fixes = generate_fixes(1_000);
    group.throughput(Throughput::Elements(fixes.len() as u64));

    for (name, camera_mode) in [
        ("camera_none", CameraMode::None),
        ("tracking_gps", CameraMode::TrackingGps),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let clock = ManualClock::new();
                    let component = component(&clock, camera_mode, RenderMode::Gps);
                    (clock, component)
                },
                |(clock, mut component)| {
                    for fix in &fixes {
                        clock.advance(Duration::from_secs(1));
                        component.on_location_changed(*fix);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("frames");
    let fixes = generate_fixes(100);

    // One fix per second at 60 fps, tracking with compass updates in between
    let frames_per_fix = 60;
    group.throughput(Throughput::Elements((fixes.len() * frames_per_fix) as u64));
    group.bench_function("tracking_compass_100_fixes", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let component = component(&clock, CameraMode::TrackingCompass, RenderMode::Compass);
                (clock, component)
            },
            |(clock, mut component)| {
                for (i, fix) in fixes.iter().enumerate() {
                    component.on_location_changed(*fix);
                    component.on_compass_changed((i as f32 * 7.0) % 360.0);
                    for _ in 0..frames_per_fix {
                        clock.advance(FRAME);
                        component.on_frame();
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_feed_location, bench_frames);

criterion_main!(benches);
