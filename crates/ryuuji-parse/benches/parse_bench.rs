use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ryuuji_parse::{parse, parse_with, ParseOptions};

fn bench_parse(c: &mut Criterion) {
    let inputs = vec![
        "[SubsPlease] Jujutsu Kaisen - 24 (1080p) [A1B2C3D4].mkv",
        "[TaigaSubs]_Toradora!_(2008)_-_01v2_-_Tiger_and_Dragon_[1280x720_H.264_FLAC][1234ABCD].mkv",
        "[Judas] Golden Kamuy S3 - 01-12 (1080p) [Batch]",
        "One.Piece.1084.VOSTFR.1080p.WEB.x264-AAC.mkv",
        "[Commie] Steins;Gate - 01 [BD 720p AAC] [5765F5A5].mkv",
    ];

    c.bench_function("parse_single", |b| {
        b.iter(|| parse(black_box(inputs[0])).unwrap());
    });

    c.bench_function("parse_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = parse(black_box(input)).unwrap();
            }
        });
    });

    let options = ParseOptions {
        parse_episode_title: false,
        parse_release_group: false,
        ..Default::default()
    };
    c.bench_function("parse_minimal_options", |b| {
        b.iter(|| parse_with(black_box(inputs[1]), &options).unwrap());
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
