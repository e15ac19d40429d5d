//! Criterion benchmarks for the HID report encoder.
//!
//! Run with:
//! ```bash
//! cargo bench --package rb-core --bench hid_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rb_core::{encode_intent, intents_for_text, HidKeyCode, InputIntent, MouseButton};

fn bench_encode_intent(c: &mut Criterion) {
    let fixtures = [
        ("move", InputIntent::Move { dx: 12, dy: -7 }),
        ("move_clamped", InputIntent::Move { dx: 900, dy: -900 }),
        (
            "click",
            InputIntent::Click {
                button: MouseButton::Left,
            },
        ),
        (
            "scroll",
            InputIntent::Scroll {
                delta_x: 0,
                delta_y: 40,
            },
        ),
        (
            "keypress_shift",
            InputIntent::KeyPress {
                key: HidKeyCode::KeyQ,
                shift: true,
            },
        ),
    ];

    let mut group = c.benchmark_group("encode_intent");
    for (name, intent) in fixtures {
        group.bench_with_input(BenchmarkId::from_parameter(name), &intent, |b, intent| {
            b.iter(|| encode_intent(black_box(intent)))
        });
    }
    group.finish();
}

fn bench_type_sentence(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog 1234567890\n";
    c.bench_function("type_sentence", |b| {
        b.iter(|| {
            intents_for_text(black_box(text))
                .flat_map(|intent| encode_intent(&intent))
                .count()
        })
    });
}

criterion_group!(benches, bench_encode_intent, bench_type_sentence);
criterion_main!(benches);
