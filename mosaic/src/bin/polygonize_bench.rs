#[cfg(feature = "bench_polygonize")]
use geo::LineString;
#[cfg(feature = "bench_polygonize")]
use std::time::Instant;

#[cfg(not(feature = "bench_polygonize"))]
fn main() {
    panic!("polygonize_bench requires --features bench_polygonize");
}

#[cfg(feature = "bench_polygonize")]
fn grid_lines(w: usize, h: usize, step: f64) -> Vec<LineString<f64>> {
    let mut lines = Vec::with_capacity(w + h + 2);
    for i in 0..=w {
        let x = i as f64 * step;
        lines.push(LineString::from(vec![(x, -step), (x, (h as f64 + 1.0) * step)]));
    }
    for j in 0..=h {
        let y = j as f64 * step;
        lines.push(LineString::from(vec![(-step, y), ((w as f64 + 1.0) * step, y)]));
    }
    lines
}

#[cfg(feature = "bench_polygonize")]
fn random_lines(n: usize, seed: u64, size: f64) -> Vec<LineString<f64>> {
    // Deterministic LCG
    let mut s = seed;
    let mut next = move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((s >> 24) & 0xFFFF_FFFF) as f64 / u32::MAX as f64
    };
    (0..n)
        .map(|_| LineString::from(vec![(size * next(), size * next()), (size * next(), size * next())]))
        .collect()
}

#[cfg(feature = "bench_polygonize")]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut w = 60usize;
    let mut h = 60usize;
    let mut random = 0usize;
    let mut seed = 0x1234_5678_9ABC_DEF0u64;
    let mut repeats = 5usize;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--w=") {
            if let Ok(v) = val.parse() {
                w = v;
            }
        } else if let Some(val) = a.strip_prefix("--h=") {
            if let Ok(v) = val.parse() {
                h = v;
            }
        } else if let Some(val) = a.strip_prefix("--random=") {
            if let Ok(v) = val.parse() {
                random = v;
            }
        } else if let Some(val) = a.strip_prefix("--seed=") {
            if let Ok(v) = val.parse() {
                seed = v;
            }
        } else if let Some(val) = a.strip_prefix("--repeats=") {
            if let Ok(v) = val.parse() {
                repeats = v;
            }
        } else {
            log::warn!("ignoring unknown argument {}", a);
        }
    }

    let mut lines = grid_lines(w, h, 6.0);
    lines.extend(random_lines(random, seed, 6.0 * w.max(h) as f64));

    let mut times = Vec::with_capacity(repeats);
    let mut faces = 0usize;
    for _ in 0..repeats.max(1) {
        let t0 = Instant::now();
        faces = mosaic::polygonize(&lines).len();
        times.push(t0.elapsed().as_secs_f64() * 1000.0);
    }
    let avg = times.iter().sum::<f64>() / times.len() as f64;
    log::info!("polygonize runs: {:?}", times);

    println!(
        "grid={}x{} random={} lines={} faces={} avg_ms={:.3}",
        w,
        h,
        random,
        lines.len(),
        faces,
        avg
    );
}
