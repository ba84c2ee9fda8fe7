//! Deadline projection and business-time measurement benchmarks

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Australia::Brisbane;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slaclock::calendar::{BuiltinHolidays, BusinessCalendar, OpenWindow};
use slaclock::sla::{BusinessTimeMeasurer, BusinessTimeProjector};

fn head_office() -> BusinessCalendar {
    BusinessCalendar::new(1, "HQ", Brisbane, "AU")
        .with_subdivision("QLD")
        .with_window(OpenWindow::hm((8, 0), (12, 0)).unwrap())
        .with_window(OpenWindow::hm((13, 0), (17, 0)).unwrap())
}

fn projection_benchmark(c: &mut Criterion) {
    let calendar = head_office();
    let holidays = BuiltinHolidays::new();
    let projector = BusinessTimeProjector::new(&calendar, &holidays);
    let start = Utc.with_ymd_and_hms(2024, 12, 20, 5, 0, 0).unwrap();

    let mut group = c.benchmark_group("projection");
    for hours in [4.0, 48.0, 480.0].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(hours), hours, |b, &hours| {
            b.iter(|| projector.project(black_box(start), black_box(hours), false))
        });
    }
    group.finish();
}

fn measurement_benchmark(c: &mut Criterion) {
    let calendar = head_office();
    let holidays = BuiltinHolidays::new();
    let measurer = BusinessTimeMeasurer::new(&calendar, &holidays);
    let start = Utc.with_ymd_and_hms(2024, 12, 20, 5, 0, 0).unwrap();

    let mut group = c.benchmark_group("measurement");
    for days in [1, 30, 365].iter() {
        let end = start + Duration::days(*days);
        group.bench_with_input(BenchmarkId::from_parameter(days), &end, |b, &end| {
            b.iter(|| measurer.measure(black_box(start), black_box(end)))
        });
    }
    group.finish();
}

criterion_group!(benches, projection_benchmark, measurement_benchmark);
criterion_main!(benches);
