//! # Tactile Fusion Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::tactile::TactileArray;
use hand_lib::{
    coord_map::{DofState, DofVec},
    tactile::{ActivationMask, Params, TactileFusion},
    traj_exec::{self, control_law, masked_error},
};

fn tactile_fusion_benchmark(c: &mut Criterion) {
    // ---- Build readings ----

    // A resting baseline and a reading with a few taxels pressed on finger 2
    let baseline = TactileArray {
        finger1: (0..24).map(|i| 0.1 + 0.001 * i as f64).collect(),
        finger2: vec![0.12; 24],
        finger3: vec![0.09; 24],
        palm: vec![0.1; 24],
    };
    let mut pressed = baseline.clone();
    for t in [3, 4, 9, 10].iter() {
        pressed.finger2[*t] += 1.1;
    }

    let mut fusion = TactileFusion::new(Params::default());
    fusion.reset(Some(&baseline));
    fusion.set_ignore(false);

    // Nominal case, nothing touching
    c.bench_function("TactileFusion::proc::no_contact", |b| {
        b.iter(|| fusion.proc(black_box(&baseline)))
    });

    // Contacts registered, frames already in the set after the first iteration
    c.bench_function("TactileFusion::proc::contact", |b| {
        b.iter(|| fusion.proc(black_box(&pressed)))
    });

    // ---- Control law ----

    let params = traj_exec::Params::default();
    let mut mask = ActivationMask::all_active();
    mask.disable(1);
    let current = DofState {
        spread: 0.0,
        f1: 0.3,
        f2: 0.25,
        f3: 0.4,
    };
    let target = DofVec::new(0.0, 1.0, 1.0, 1.0);

    c.bench_function("traj_exec::control_law", |b| {
        b.iter(|| {
            let error = masked_error(black_box(&current), &target, &mask);
            control_law(&error, &mask, &params)
        })
    });
}

criterion_group!(benches, tactile_fusion_benchmark);
criterion_main!(benches);
