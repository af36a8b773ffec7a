use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jack::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    let source = include_str!("../tests/Main.jack");

    c.bench_function("compile main", |b| {
        b.iter(|| black_box(jack::compile_str("Main.jack", black_box(source))))
    });

    c.bench_function("tokenize main", |b| {
        b.iter(|| {
            let lexer = Lexer::new("Main.jack", black_box(source));
            black_box(TokenListing::new(Vec::new()).write_tokens(lexer))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
