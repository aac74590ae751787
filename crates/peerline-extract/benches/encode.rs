use peerline_extract::Encoder;

fn sample_identifiers() -> Vec<String> {
    (0..1_000)
        .map(|i| format!("10.{}/journal.pone.{i:07}", 1000 + i % 97))
        .collect()
}

#[divan::bench]
fn pair_identifiers(bencher: divan::Bencher) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut encoder = Encoder::open(&dir.path().join("lookup.csv")).unwrap();
    let ids = sample_identifiers();
    // Warm the table so the bench measures lookups, not appends
    for id in &ids {
        encoder.identifier_code(id).unwrap();
    }
    bencher.bench_local(|| {
        for pair in ids.windows(2) {
            let _ = encoder.pair_identifier(&pair[0], &pair[1]).unwrap();
        }
    });
}

fn main() {
    divan::main();
}
