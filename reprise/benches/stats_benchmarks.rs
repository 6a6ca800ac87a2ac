use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use reprise::clock::ManualClock;
use reprise::config::Configuration;
use reprise::report::ReportSink;
use reprise::stats::{PlaybackAction, ViewingStats};

/// Discards every line, so formatting cost is measured but not I/O
struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, line: &str) {
        black_box(line);
    }
}

fn session(segments: usize) -> (Rc<ManualClock>, ViewingStats<Rc<ManualClock>, NullSink>) {
    let clock = Rc::new(ManualClock::new(3600.0));
    let mut stats = ViewingStats::with_sink(Rc::clone(&clock), NullSink).with_configuration(
        Configuration {
            include_entry_table: false,
            ..Configuration::default()
        },
    );

    for i in 0..segments {
        clock.set_position(((i * 53) % 900) as f64);
        stats
            .notify_playback_action(PlaybackAction::PlayBegins)
            .unwrap();
        clock.advance(6.0);
        stats
            .notify_playback_action(PlaybackAction::PlayStops)
            .unwrap();
    }

    // Leave one segment playing for the peeks
    stats
        .notify_playback_action(PlaybackAction::PlayBegins)
        .unwrap();
    clock.advance(3.0);

    (clock, stats)
}

fn benchmark_peek(c: &mut Criterion) {
    let mut group = c.benchmark_group("peek_stats");

    for segments in [10, 50, 200] {
        let (_clock, mut stats) = session(segments);
        group.bench_function(BenchmarkId::new("peek", segments), |b| {
            b.iter(|| black_box(stats.peek_stats().unwrap()))
        });
    }

    group.finish();
}

fn benchmark_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewing_session");

    for segments in [10, 50, 200] {
        group.bench_with_input(
            BenchmarkId::new("play_pause_cycles", segments),
            &segments,
            |b, &segments| b.iter(|| black_box(session(segments))),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_peek, benchmark_session);
criterion_main!(benches);
