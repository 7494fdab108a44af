use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tof_core::MedianFilter;

// Triangle sweep with a spike every 7th sample, like the simulated sensor.
fn synth_trace(n: usize) -> Vec<i32> {
    (0..n)
        .map(|i| {
            if i % 7 == 6 {
                2000
            } else {
                let phase = (i % 80) as i32;
                let ramp = if phase < 40 { phase } else { 80 - phase };
                250 + ramp * 300 / 40
            }
        })
        .collect()
}

fn bench_median(c: &mut Criterion) {
    let trace = synth_trace(4096);
    for window in [5usize, 25, 101] {
        c.bench_function(&format!("median_add_and_query_w{window}"), |b| {
            b.iter_batched(
                || MedianFilter::new(window),
                |mut f| {
                    let mut acc = 0i64;
                    for &s in &trace {
                        f.add_sample(s);
                        acc += i64::from(f.get_median().unwrap_or(0));
                    }
                    black_box(acc)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_median);
criterion_main!(benches);
