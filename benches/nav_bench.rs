use std::hint::black_box;
use std::time::Instant;

use scripture_nav::view::{append_to_class_divs, chapters_grid, volumes_grid, CLASS_NAV_HEADING};
use scripture_nav::{
    route, scan_geotags, Catalog, MarkerOverlay, MockTransport, NavConfig, Navigator,
    RecordingMap,
};

const VOLUMES_FIXTURE: &str = "tests/fixtures/volumes.json";
const BOOKS_FIXTURE: &str = "tests/fixtures/books.json";
const CHAPTER_FIXTURE: &str = "tests/fixtures/genesis_2.html";

#[derive(Clone, Debug)]
struct CaseResult {
    case: String,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    mean_ns: u128,
    max_ns: u128,
}

fn read(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path, e))
}

fn percentile(sorted: &[u128], percentile: f64) -> u128 {
    let idx = ((sorted.len().saturating_sub(1) as f64) * percentile).round() as usize;
    sorted[idx]
}

fn run_case<F>(case: &str, warmup_iters: usize, measure_iters: usize, mut op: F) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }

    let mut samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let start = Instant::now();
        black_box(op());
        samples.push(start.elapsed().as_nanos());
    }
    samples.sort_unstable();
    let sum: u128 = samples.iter().copied().sum();

    CaseResult {
        case: case.to_string(),
        iterations: measure_iters,
        min_ns: samples[0],
        median_ns: percentile(&samples, 0.5),
        mean_ns: sum / samples.len() as u128,
        max_ns: samples[samples.len() - 1],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 10 } else { 100 };
    let measure_iters = if quick { 50 } else { 1000 };

    let volumes_json = read(VOLUMES_FIXTURE);
    let books_json = read(BOOKS_FIXTURE);
    // Repeat the chapter so scanning cost is visible over timer noise.
    let chapter = read(CHAPTER_FIXTURE).repeat(20);
    let catalog = Catalog::from_json(&volumes_json, &books_json)
        .unwrap_or_else(|e| panic!("catalog failed: {}", e));
    let genesis = catalog
        .book(101)
        .unwrap_or_else(|| panic!("fixture lacks Genesis"));

    println!("# scripture-nav benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!("case,iterations,min_ns,median_ns,mean_ns,max_ns");

    let results = vec![
        run_case("catalog_join", warmup_iters, measure_iters, || {
            Catalog::from_json(&volumes_json, &books_json)
                .map(|c| c.book_count())
                .unwrap_or(0)
        }),
        run_case("route_hashes", warmup_iters, measure_iters, || {
            ["", "3", "1:101", "5:404", "1:101:2", "1:101:99", "bogus"]
                .iter()
                .map(|hash| route(hash, &catalog))
                .count()
        }),
        run_case("volumes_grid", warmup_iters, measure_iters, || {
            volumes_grid(&catalog, None).len()
        }),
        run_case("chapters_grid", warmup_iters, measure_iters, || {
            chapters_grid(genesis).len()
        }),
        run_case("scan_geotags", warmup_iters, measure_iters, || {
            scan_geotags(&chapter).len()
        }),
        run_case("inject_next_prev", warmup_iters, measure_iters, || {
            append_to_class_divs(&chapter, CLASS_NAV_HEADING, "<div class=\"nextprev\"></div>")
                .len()
        }),
        run_case("overlay_redraw", warmup_iters, measure_iters, || {
            let mut overlay = MarkerOverlay::default();
            let mut map = RecordingMap::default();
            overlay.setup_from_html(&chapter, &mut map)
        }),
        run_case("navigate_cached_chapter", warmup_iters, measure_iters / 10, {
            let config = NavConfig::default();
            let transport = MockTransport::new()
                .with_body(config.volumes_url(), volumes_json.clone())
                .with_body(config.books_url(), books_json.clone())
                .with_body(config.chapter_url(101, 2, None, false), chapter.clone());
            let mut navigator = Navigator::init(transport, config)
                .unwrap_or_else(|e| panic!("navigator failed: {}", e));
            let mut map = RecordingMap::default();
            move || {
                map.calls.clear();
                navigator.on_hash_changed("#1:101:2", &mut map).scriptures.len()
            }
        }),
    ];

    for result in &results {
        println!(
            "{},{},{},{},{},{}",
            result.case,
            result.iterations,
            result.min_ns,
            result.median_ns,
            result.mean_ns,
            result.max_ns
        );
    }
}
