//! Benchmarks for the Light toolchain: lexer and parser throughput plus
//! full interpretation of small representative programs.

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use light_lang::lexer::lex;
use light_lang::parser::parse;
use light_lang::runtime::Interpreter;

/// Simple arithmetic expression
const SIMPLE_EXPR: &str = "print(1 + 2 * 3 - 4 / 5)";

/// Recursive fibonacci
const FIB: &str = r#"
function fib(n) {
  if (n <= 1) {
    return n
  }
  return fib(n - 1) + fib(n - 2)
}
print(fib(15))
"#;

/// Loop with string building
const STRING_LOOP: &str = r#"
var out = ""
for (var i = 0; i < 100; i = i + 1) {
  out = out + i + ","
}
print(out.length)
"#;

/// Array pipeline over closures
const ARRAY_PIPELINE: &str = r#"
var nums = [5, 3, 8, 1, 9, 2, 7, 4, 6]
var result = nums.filter(n => n % 2 == 1).map(n => n * n).sort()
print(result.join("-"))
"#;

/// Class dispatch through a super chain
const CLASSES: &str = r#"
class A {
  constructor(x) { this.x = x }
  get() { return this.x }
}
class B extends A {
  get() { return super.get() * 2 }
}
var total = 0
for (var i = 0; i < 50; i = i + 1) {
  total = total + new B(i).get()
}
print(total)
"#;

const CASES: [(&str, &str); 5] = [
    ("simple", SIMPLE_EXPR),
    ("fib", FIB),
    ("string_loop", STRING_LOOP),
    ("array_pipeline", ARRAY_PIPELINE),
    ("classes", CLASSES),
];

fn run(source: &str) {
    let (tokens, _) = lex(source);
    let (file, _) = parse(tokens);
    let sink = Rc::new(RefCell::new(std::io::sink()));
    let interpreter = Interpreter::new(sink);
    interpreter.run(&file).unwrap();
}

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for (name, source) in CASES {
        group.bench_with_input(BenchmarkId::new("lex", name), source, |b, source| {
            b.iter(|| lex(black_box(source)))
        });
    }
    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    for (name, source) in CASES {
        let (tokens, _) = lex(source);
        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| parse(black_box(tokens.clone())))
        });
    }
    group.finish();
}

fn bench_interpreter(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter");
    for (name, source) in CASES {
        group.bench_with_input(BenchmarkId::new("run", name), source, |b, source| {
            b.iter(|| run(black_box(source)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parser, bench_interpreter);
criterion_main!(benches);
