use criterion::{criterion_group, criterion_main, Criterion, black_box};
use tabiya::board::cozy::Position;
use tabiya::search::alphabeta::{SearchParams, Searcher};
use tabiya::rules::Side;

fn bench_search(c: &mut Criterion) {
    let mut pos = Position::startpos();
    c.bench_function("search_depth_3_startpos", |ben| {
        ben.iter(|| {
            let mut s = Searcher::default();
            let r = s.search_with_params(black_box(&mut pos), SearchParams::full_window(3, Side::White));
            black_box(r.nodes)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
