use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skyrise_core::prelude::*;
use skyrise_core::shafts::Shaft;

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.bench_function("call_sweep_4_cars_30_floors", |b| {
        b.iter_batched(
            || {
                let mut shaft = Shaft::new(ShaftId::new(ShaftKind::Passenger, 4), 0, 48.0, 0);
                shaft.max_floor = 30;
                for floor in [10, 20, 30] {
                    shaft.add_car(floor, 48.0);
                }
                shaft
            },
            |mut shaft| {
                for floor in 0..=30 {
                    black_box(shaft.dispatch_call(floor));
                }
                shaft
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

/// A ten-floor office tower with a lobby full of workers
fn busy_tower() -> TowerEngine<Ledger> {
    let mut config = SimConfig::default();
    config.schedule.clear();
    let mut engine = TowerEngine::new(config, Ledger::unlocked(10_000_000)).unwrap();
    for f in 1..=10 {
        engine.handle_grid_click(0, f, BuildMode::Floor).unwrap();
    }
    engine.handle_grid_click(10, 0, BuildMode::Elevator).unwrap();
    engine.handle_grid_click(10, 10, BuildMode::Elevator).unwrap();
    for f in [3, 6, 9] {
        engine.handle_grid_click(10, f, BuildMode::Elevator).unwrap();
    }
    for f in 1..=10 {
        engine
            .handle_grid_click(20, f, BuildMode::Tenant(TenantKind::Office))
            .unwrap();
    }
    for _ in 0..20 {
        for _ in 0..10 {
            let _ = engine.spawn_person(TenantKind::Office);
        }
        engine.tick();
    }
    engine
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(30);
    group.bench_function("busy_tower_100_ticks", |b| {
        b.iter_batched(
            busy_tower,
            |mut engine| {
                for _ in 0..100 {
                    engine.tick();
                }
                engine
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_tick);
criterion_main!(benches);
