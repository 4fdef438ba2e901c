//! Skyrise Headless Simulation Harness
//!
//! Builds the reference tower from `data/tower_config.json`, runs it for
//! several game days and checks the simulation invariants after every tick.
//! Runs entirely in-process: no rendering, no input devices.
//!
//! Usage:
//!   cargo run -p skyrise-simtest
//!   cargo run -p skyrise-simtest -- --verbose
//!   RUST_LOG=skyrise_core=trace cargo run -p skyrise-simtest

use serde::{Deserialize, Serialize};
use skyrise_core::economy::{daily_rent, vip_approves};
use skyrise_core::prelude::*;
use skyrise_core::tenants::TenantCounts;
use tracing_subscriber::EnvFilter;

// ── Reference tower (embedded at compile time) ──────────────────────────
const TOWER_JSON: &str = include_str!("../../../data/tower_config.json");

#[derive(Debug, Deserialize)]
struct TowerManifest {
    money: i64,
    days: u32,
    config: SimConfig,
    floors: Vec<i32>,
    shafts: Vec<ShaftPlan>,
    tenants: Vec<TenantPlan>,
}

#[derive(Debug, Deserialize)]
struct ShaftPlan {
    kind: ShaftKind,
    x: i32,
    /// First click builds the shaft, later clicks extend it
    clicks: Vec<i32>,
    /// Floors where extra cars are added
    cars: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct TenantPlan {
    kind: TenantKind,
    floor: i32,
    x: i32,
}

/// Machine-readable end-of-run report
#[derive(Debug, Serialize)]
struct RunSummary {
    days: i64,
    ticks: u64,
    trips: u64,
    satisfaction: f32,
    angry_departures: u64,
    hotel_complaints: u32,
    rent_collected: i64,
    money: i64,
    population: i32,
    stars: u8,
    vip_approves: bool,
    people_in_building: usize,
    tenants: TenantCounts,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    println!("=== Skyrise Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Manifest and config
    let Some(manifest) = load_manifest(&mut results) else {
        report(&results, verbose);
        return;
    };

    // 2. Tower construction
    let mut engine = match build_tower(&manifest, &mut results) {
        Some(engine) => engine,
        None => {
            report(&results, verbose);
            return;
        }
    };

    // 3. Rejected clicks leave the tower untouched
    results.extend(validate_rejections(&mut engine));

    // 4. Multi-day run with per-tick invariants
    let summary = run_days(&mut engine, manifest.days, verbose, &mut results);

    // 5. Same seed, same run
    results.extend(validate_determinism(&manifest));

    if verbose {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("\n{}", json),
            Err(e) => println!("\nsummary serialization failed: {}", e),
        }
    }

    report(&results, verbose);
}

fn report(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 || total == 0 {
        std::process::exit(1);
    }
}

// ── 1. Manifest ─────────────────────────────────────────────────────────

fn load_manifest(results: &mut Vec<TestResult>) -> Option<TowerManifest> {
    println!("--- Tower Manifest ---");
    let manifest: TowerManifest = match serde_json::from_str(TOWER_JSON) {
        Ok(m) => m,
        Err(e) => {
            results.push(TestResult::new(
                "manifest_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return None;
        }
    };
    results.push(TestResult::new(
        "manifest_parse",
        true,
        format!(
            "{} floors, {} shafts, {} tenants",
            manifest.floors.len(),
            manifest.shafts.len(),
            manifest.tenants.len()
        ),
    ));

    let valid = manifest.config.validate();
    results.push(TestResult::new(
        "config_valid",
        valid.is_ok(),
        match &valid {
            Ok(()) => format!("seed {:#x}", manifest.config.seed),
            Err(e) => e.to_string(),
        },
    ));
    valid.ok().map(|_| manifest)
}

// ── 2. Construction ─────────────────────────────────────────────────────

fn build_tower(
    manifest: &TowerManifest,
    results: &mut Vec<TestResult>,
) -> Option<TowerEngine<Ledger>> {
    println!("--- Construction ---");
    let economy = Ledger::unlocked(manifest.money);
    let mut engine = match TowerEngine::new(manifest.config.clone(), economy) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult::new("engine_new", false, e.to_string()));
            return None;
        }
    };

    let mut failures: Vec<String> = Vec::new();
    let mut click = |engine: &mut TowerEngine<Ledger>, x: i32, floor: i32, mode: BuildMode| {
        if let Err(e) = engine.handle_grid_click(x, floor, mode) {
            failures.push(format!("{:?} at ({}, {}): {}", mode, x, floor, e));
        }
    };

    for &floor in &manifest.floors {
        click(&mut engine, 0, floor, BuildMode::Floor);
    }
    for shaft in &manifest.shafts {
        let mode = match shaft.kind {
            ShaftKind::Passenger => BuildMode::Elevator,
            ShaftKind::Service => BuildMode::ServiceElevator,
        };
        for &floor in shaft.clicks.iter().chain(&shaft.cars) {
            click(&mut engine, shaft.x, floor, mode);
        }
    }
    for tenant in &manifest.tenants {
        click(&mut engine, tenant.x, tenant.floor, BuildMode::Tenant(tenant.kind));
    }

    results.push(TestResult::new(
        "build_all_clicks",
        failures.is_empty(),
        if failures.is_empty() {
            format!(
                "{} floors, {} shafts, {} units, money left {}",
                engine.grid().floor_count(),
                engine.shafts().len(),
                engine.tenants().len(),
                engine.economy().money
            )
        } else {
            failures.join("; ")
        },
    ));

    let expected_units = manifest.tenants.len();
    results.push(TestResult::new(
        "build_unit_count",
        engine.tenant_counts().total() == expected_units,
        format!("{} of {} units placed", engine.tenant_counts().total(), expected_units),
    ));

    engine.drain_events();
    Some(engine)
}

// ── 3. Rejections ───────────────────────────────────────────────────────

fn validate_rejections(engine: &mut TowerEngine<Ledger>) -> Vec<TestResult> {
    println!("--- Rejected Clicks ---");
    let mut results = Vec::new();
    let money = engine.economy().money;
    let floors = engine.grid().floor_count();
    let shafts = engine.shafts().len();

    let top = engine.grid().highest_floor().unwrap_or(0);
    let gap = engine.handle_grid_click(0, top + 2, BuildMode::Floor);
    results.push(TestResult::new(
        "reject_floor_gap",
        gap.is_err() && engine.grid().floor_count() == floors,
        format!("{:?}", gap),
    ));

    let beside = engine.shafts().ids().first().map(|id| id.x + 1);
    let overlap = beside.map(|x| engine.handle_grid_click(x, 0, BuildMode::ServiceElevator));
    results.push(TestResult::new(
        "reject_shaft_overlap",
        matches!(overlap, Some(Err(BuildError::ShaftOverlap { .. })))
            && engine.shafts().len() == shafts,
        format!("{:?}", overlap),
    ));

    let edge = engine.grid().width() - 1;
    let empty = engine.handle_grid_click(edge, 0, BuildMode::Demolish);
    results.push(TestResult::new(
        "demolish_empty_noop",
        matches!(empty, Err(BuildError::NothingToDemolish { .. })),
        format!("{:?}", empty),
    ));

    let rejected = engine
        .drain_events()
        .iter()
        .filter(|e| matches!(e, SimEvent::BuildRejected { .. }))
        .count();
    results.push(TestResult::new(
        "rejections_reported",
        rejected == 3,
        format!("{} BuildRejected events", rejected),
    ));

    results.push(TestResult::new(
        "rejections_free",
        engine.economy().money == money,
        format!("money {} -> {}", money, engine.economy().money),
    ));
    results
}

// ── 4. Multi-day run ────────────────────────────────────────────────────

/// First violated invariant, if any
fn check_invariants(engine: &TowerEngine<Ledger>) -> Option<String> {
    let capacity = engine.config().elevator.capacity;
    for shaft in engine.shafts().iter() {
        for car in &shaft.cars {
            if car.passengers.len() > capacity {
                return Some(format!(
                    "shaft x={} car {} carries {}",
                    shaft.id.x,
                    car.index,
                    car.passengers.len()
                ));
            }
            if car.floor < shaft.min_floor || car.floor > shaft.max_floor {
                return Some(format!("shaft x={} car {} left the shaft", shaft.id.x, car.index));
            }
        }
        for floor in shaft.min_floor..=shaft.max_floor {
            let holders = shaft.cars.iter().filter(|c| c.has_hall_call(floor)).count();
            if holders > 1 {
                return Some(format!(
                    "shaft x={} floor {} held by {} cars",
                    shaft.id.x, floor, holders
                ));
            }
        }
    }

    let max = engine.config().passenger.max_stress;
    for view in engine.people() {
        if !(0.0..=max).contains(&view.stress) {
            return Some(format!("person {} stress {}", view.person.id, view.stress));
        }
        let memberships = engine.queues().memberships(view.entity);
        let expected = usize::from(matches!(view.journey.state, PersonState::Waiting { .. }));
        if memberships != expected {
            return Some(format!(
                "person {} ({}) in {} queues",
                view.person.id,
                view.journey.state.name(),
                memberships
            ));
        }
        if !engine.grid().has_floor(view.position.floor) {
            return Some(format!(
                "person {} on missing floor {}",
                view.person.id, view.position.floor
            ));
        }
    }

    let satisfaction = engine.satisfaction();
    if !(0.0..=1.0).contains(&satisfaction) {
        return Some(format!("satisfaction {}", satisfaction));
    }
    None
}

fn run_days(
    engine: &mut TowerEngine<Ledger>,
    days: u32,
    verbose: bool,
    results: &mut Vec<TestResult>,
) -> RunSummary {
    println!("--- {}-day run ---", days);
    let start_day = engine.day();
    let target_day = start_day + days as i64;
    let tick_seconds = engine.config().clock.tick_seconds as f64;
    let minutes_per_second = engine.config().clock.minutes_per_second;
    let ticks_per_day = (24.0 * 60.0 / minutes_per_second / tick_seconds) as u64;
    let max_ticks = ticks_per_day * (days as u64 + 1);

    let mut ticks = 0u64;
    let mut violation: Option<String> = None;
    let mut rent_collected = 0;
    let mut peak_people = 0;
    let mut angry_events = 0u64;
    let mut spawned = 0u64;

    while engine.day() < target_day && ticks < max_ticks {
        engine.tick();
        ticks += 1;
        peak_people = peak_people.max(engine.person_count());

        if violation.is_none() {
            violation = check_invariants(engine).map(|v| format!("tick {}: {}", ticks, v));
        }

        for event in engine.drain_events() {
            match event {
                SimEvent::DayStarted { day } => {
                    let counts = engine.tenant_counts();
                    let satisfaction = engine.satisfaction();
                    let rent = daily_rent(&counts, satisfaction, &engine.config().tenants);
                    engine.economy_mut().earn_money(rent);
                    rent_collected += rent;
                    tracing::info!(
                        day,
                        rent,
                        satisfaction,
                        people = engine.person_count(),
                        "day rollover"
                    );
                    if verbose {
                        println!(
                            "  day {}: satisfaction {:.3}, rent {}, {} people, {} complaints",
                            day,
                            satisfaction,
                            rent,
                            engine.person_count(),
                            engine.hotel_complaints()
                        );
                    }
                }
                SimEvent::AngryDeparture { .. } => angry_events += 1,
                SimEvent::PersonSpawned { .. } => spawned += 1,
                _ => {}
            }
        }
    }

    results.push(TestResult::new(
        "run_reached_target_day",
        engine.day() >= target_day,
        format!("day {} after {} ticks", engine.day(), ticks),
    ));
    results.push(TestResult::new(
        "run_invariants",
        violation.is_none(),
        violation.unwrap_or_else(|| format!("{} ticks checked", ticks)),
    ));
    results.push(TestResult::new(
        "run_people_flow",
        spawned > 0 && engine.trips_completed() > 0,
        format!(
            "{} spawned, {} trips, peak {} in building",
            spawned,
            engine.trips_completed(),
            peak_people
        ),
    ));
    results.push(TestResult::new(
        "run_angry_tally",
        angry_events == engine.angry_departures(),
        format!("{} angry departures", angry_events),
    ));
    results.push(TestResult::new(
        "run_rent_collected",
        rent_collected > 0,
        format!("{} rent over {} days", rent_collected, days),
    ));

    let complaints = engine.hotel_complaints();
    let summary = RunSummary {
        days: engine.day() - start_day,
        ticks,
        trips: engine.trips_completed(),
        satisfaction: engine.satisfaction(),
        angry_departures: engine.angry_departures(),
        hotel_complaints: complaints,
        rent_collected,
        money: engine.economy().money,
        population: engine.economy().population,
        stars: engine.economy().stars(),
        vip_approves: vip_approves(engine.satisfaction(), complaints),
        people_in_building: engine.person_count(),
        tenants: engine.tenant_counts(),
    };
    engine.reset_hotel_complaints();
    summary
}

// ── 5. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(manifest: &TowerManifest) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let run = || -> Option<(u64, i64, usize, Vec<(u64, &'static str)>)> {
        let mut scratch = Vec::new();
        let mut engine = build_tower(manifest, &mut scratch)?;
        for _ in 0..20_000 {
            engine.tick();
        }
        let states = engine
            .people()
            .iter()
            .map(|v| (v.person.id, v.journey.state.name()))
            .collect();
        Some((
            engine.trips_completed(),
            engine.economy().money,
            engine.person_count(),
            states,
        ))
    };
    let first = run();
    let second = run();
    vec![TestResult::new(
        "same_seed_same_run",
        first.is_some() && first == second,
        match &first {
            Some((trips, money, people, _)) => {
                format!("{} trips, money {}, {} people", trips, money, people)
            }
            None => "tower failed to build".to_string(),
        },
    )]
}
