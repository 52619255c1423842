use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fa_rust::{compile, FiniteAutomaton};

const PATTERN: &str = "(a|b)*a(a|b)(a|b)";

fn do_the_work(pattern: &str, inputs: &[String]) -> usize {
    let dfa = compile(pattern).unwrap().to_dfa().unwrap();
    inputs
        .iter()
        .filter(|input| dfa.accepts(input).unwrap())
        .count()
}

fn criterion_benchmark_compile(c: &mut Criterion) {
    c.bench_function("compile third-from-last", |b| {
        b.iter(|| compile(black_box(PATTERN)).unwrap())
    });
}

fn criterion_benchmark_subset_construction(c: &mut Criterion) {
    let nfa = compile(PATTERN).unwrap();
    c.bench_function("subset construction third-from-last", |b| {
        b.iter(|| black_box(&nfa).to_dfa().unwrap())
    });
}

fn criterion_benchmark_simulation(c: &mut Criterion) {
    let inputs: Vec<String> = (0..1024u32)
        .map(|n| format!("{:b}", n).replace('0', "a").replace('1', "b"))
        .collect();
    let expected = regex::Regex::new(&format!("^(?:{})$", PATTERN))
        .unwrap();
    let expected = inputs.iter().filter(|input| expected.is_match(input)).count();
    c.bench_function("compile and run 1024 inputs", |b| {
        b.iter(|| {
            assert_eq!(
                do_the_work(black_box(PATTERN), black_box(&inputs)),
                expected
            )
        })
    });
}

criterion_group!(
    benches,
    criterion_benchmark_compile,
    criterion_benchmark_subset_construction,
    criterion_benchmark_simulation
);
criterion_main!(benches);
