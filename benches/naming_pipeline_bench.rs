//! Benchmarks for the classify + evaluate pipeline
//!
//! Synthetic projects mix framework handlers, CLI commands and plain
//! functions so every classifier branch is taken.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use grammarops::analysis::{analyze_project, classify, FrameworkDetector};
use grammarops::analyzers::extract_declarations;
use grammarops::core::{CancellationToken, Language, SourceFile};
use grammarops::naming::{evaluate_all, RuleSet};
use std::hint::black_box;

fn python_module(index: usize) -> String {
    format!(
        r#"
import logging
import typer
from fastapi import FastAPI

app = FastAPI()
cli = typer.Typer()
logger = logging.getLogger(__name__)
MAX_ITEMS_{index} = 10

@app.get("/items/{index}")
def items_{index}():
    return []

@cli.command()
def start_{index}():
    pass

def userData{index}():
    pass

def get_user_{index}():
    pass

def success_response_{index}(data):
    return data

def test_items_{index}():
    pass
"#
    )
}

fn typescript_module(index: usize) -> String {
    format!(
        r#"
import {{ Injectable }} from "@angular/core";

export function fetchUser{index}(id: string) {{
    return id;
}}

export function userList{index}() {{
    return [];
}}

export const apiClient{index} = createClient();
"#
    )
}

fn synthetic_project(modules: usize) -> Vec<SourceFile> {
    (0..modules)
        .flat_map(|i| {
            [
                SourceFile::new(format!("app/mod_{i}.py"), Language::Python, python_module(i)),
                SourceFile::new(
                    format!("web/mod_{i}.ts"),
                    Language::TypeScript,
                    typescript_module(i),
                ),
            ]
        })
        .collect()
}

fn bench_classify_and_evaluate(c: &mut Criterion) {
    let files = synthetic_project(20);
    let profile = FrameworkDetector::new().detect(&files);
    let rules = RuleSet::defaults();
    let declarations: Vec<_> = files
        .iter()
        .filter_map(|f| extract_declarations(f).ok())
        .flatten()
        .collect();

    c.bench_function("classify_and_evaluate_declarations", |b| {
        b.iter(|| {
            declarations
                .iter()
                .map(|decl| evaluate_all(decl, classify(decl, &profile), &rules).len())
                .sum::<usize>()
        });
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_project");
    let rules = RuleSet::defaults();

    for modules in [5, 25, 100] {
        let files = synthetic_project(modules);
        group.bench_with_input(BenchmarkId::from_parameter(modules), &files, |b, files| {
            b.iter(|| {
                let profile = FrameworkDetector::new().detect(black_box(files));
                analyze_project(files, profile, &rules, &CancellationToken::new())
                    .violations
                    .len()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify_and_evaluate, bench_full_pipeline);
criterion_main!(benches);
