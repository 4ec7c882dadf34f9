use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jack::{prelude::*, syntax::Lexer};

fn criterion_benchmark(c: &mut Criterion) {
    let source_code = include_str!("../tests/Sort.jack");

    c.bench_function("sort lexer", |b| {
        b.iter(|| black_box(Lexer::new(black_box(source_code)).tokenize()))
    });

    c.bench_function("sort compile", |b| {
        b.iter(|| black_box(compile_str(black_box(source_code))))
    });

    c.bench_function("sort vm text", |b| {
        b.iter(|| {
            let tokens = TokenStream::from_source(source_code).unwrap();
            let mut writer = VmWriter::new(Vec::<u8>::with_capacity(4096));
            compile_class(tokens, &mut writer).unwrap();
            black_box(writer.finish())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
