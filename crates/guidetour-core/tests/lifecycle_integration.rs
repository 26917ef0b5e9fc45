//! Integration tests for the lifecycle scheduler over the SQLite store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use guidetour_core::{
    Config, CycleSteps, FixedClock, Guide, Place, Store, TourDb, TourEngine, Visit, VisitState,
    WorkerPool,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Setup {
    _dir: tempfile::TempDir,
    db: Arc<TourDb>,
    clock: Arc<FixedClock>,
    engine: TourEngine,
}

fn setup(today: NaiveDate) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(TourDb::open_at(dir.path().join("guidetour.db")).unwrap());
    let clock = Arc::new(FixedClock::new(today));
    let engine = TourEngine::new(db.clone(), clock.clone(), &Config::default());
    engine
        .register_place(Place::new("Museo Civico", "", "Via Roma 1").with_categories(["historical"]))
        .unwrap();
    engine
        .register_guide(Guide::new("anna@example.org", "Anna").with_categories(["historical"]))
        .unwrap();
    Setup {
        _dir: dir,
        db,
        clock,
        engine,
    }
}

fn plan(engine: &TourEngine, day: NaiveDate, start_hour: u32, min: u32) -> Visit {
    engine
        .plan_visit(
            Visit::new("Tour", "Museo Civico", day, NaiveTime::from_hms_opt(start_hour, 0, 0), 60)
                .with_categories(["historical"])
                .with_seats(10, min),
        )
        .unwrap()
}

#[test]
fn test_cycle_settles_and_persists() {
    let s = setup(date(2026, 10, 10));
    let full = plan(&s.engine, date(2026, 10, 14), 10, 5);
    let short = plan(&s.engine, date(2026, 10, 14), 12, 5);
    let later = plan(&s.engine, date(2026, 10, 16), 10, 5);
    s.engine.reserve(&full.id, 5).unwrap();
    s.engine.reserve(&short.id, 4).unwrap();

    s.clock.set(date(2026, 10, 15));
    let report = s.engine.lifecycle().run_cycle(CycleSteps::ALL);
    assert_eq!((report.confirmed, report.cancelled), (1, 1));

    let stored: Vec<_> = s.db.load_visits().unwrap();
    let state_of = |id: &str| stored.iter().find(|v| v.id == id).unwrap().state;
    assert_eq!(state_of(&full.id), VisitState::Confirmed);
    assert_eq!(state_of(&short.id), VisitState::Cancelled);
    assert_eq!(state_of(&later.id), VisitState::Proposed);
}

#[test]
fn test_blackouts_pruned_and_new_year_seeded() {
    let s = setup(date(2026, 12, 31));
    s.engine.add_blackout_date(date(2024, 12, 31), "old").unwrap();
    s.engine.add_blackout_date(date(2027, 6, 2), "Republic Day").unwrap();

    s.clock.set(date(2027, 1, 1));
    let report = s.engine.lifecycle().run_cycle(CycleSteps::ALL);
    assert_eq!(report.blackouts_pruned, 1);
    assert_eq!(report.holidays_seeded, 9);

    let stored = s.db.load_blackout_dates().unwrap();
    assert!(!stored.contains_key(&date(2024, 12, 31)));
    assert!(stored.contains_key(&date(2027, 6, 2)));
    assert_eq!(stored.get(&date(2027, 12, 25)).map(String::as_str), Some("Christmas Day"));
    assert_eq!(stored.len(), 10);
}

#[test]
fn test_availability_frozen_after_close_day() {
    let s = setup(date(2026, 10, 10));
    s.engine
        .save_availability("anna@example.org", &[date(2026, 11, 3)])
        .unwrap();
    s.engine
        .register_guide(Guide::new("luca@example.org", "Luca").with_categories(["historical"]))
        .unwrap();

    s.clock.set(date(2026, 10, 16));
    let report = s.engine.lifecycle().run_cycle(CycleSteps::ALL);
    assert_eq!(report.guides_synced, 2);
    assert_eq!(s.db.availability_open().unwrap(), Some(false));
    assert_eq!(s.db.load_availability("luca@example.org").unwrap(), Some(vec![]));
    assert_eq!(
        s.db.load_availability("anna@example.org").unwrap(),
        Some(vec![date(2026, 11, 3)])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_periodic_scheduler_runs_against_engine_state() {
    let s = setup(date(2026, 10, 10));
    let visit = plan(&s.engine, date(2026, 10, 14), 10, 1);
    s.clock.set(date(2026, 10, 15));

    let pool = WorkerPool::current().unwrap();
    let scheduler = s.engine.scheduler(pool.clone());
    assert!(scheduler.start_periodic(Duration::from_millis(25), CycleSteps::default()));
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(s.engine.visit(&visit.id).unwrap().state, VisitState::Cancelled);
    assert!(scheduler.stop_periodic());
    pool.shutdown();
}
