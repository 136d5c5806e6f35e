use std::hint::black_box;

use bionet::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};

const FBC_MODEL: &str = include_str!("../tests/data/fbc_model.xml");

/// Scales the fixture up by copying its reactions under new ids.
fn setup_network(copies: usize) -> BioNetwork {
    let mut network = SbmlReader::default()
        .read_str(FBC_MODEL)
        .expect("Failed to read SBML fixture")
        .network;

    let reactions: Vec<Reaction> = network.reactions.values().cloned().collect();
    for index in 0..copies {
        for reaction in &reactions {
            let mut copy = reaction.clone();
            copy.id = format!("{}_{index}", reaction.id);
            network.add_reaction(copy).expect("Duplicate reaction id");
        }
    }
    network
}

fn benchmark_sbml(c: &mut Criterion) {
    let network = setup_network(500);
    let writer = SbmlWriter::default();
    let xml = writer
        .write_string(&network)
        .expect("Failed to write SBML");

    c.bench_function("sbml_read", |b| {
        b.iter(|| {
            let _ = black_box(SbmlReader::default().read_str(black_box(&xml)));
        })
    });

    c.bench_function("sbml_write", |b| {
        b.iter(|| {
            let _ = black_box(writer.write_string(black_box(&network)));
        })
    });

    c.bench_function("consistency_check", |b| {
        b.iter(|| {
            let _ = black_box(check_consistency(black_box(&network)));
        })
    });
}

criterion_group!(benches, benchmark_sbml);
criterion_main!(benches);
