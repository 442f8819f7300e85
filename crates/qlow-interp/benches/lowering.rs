//! Benchmarks for program lowering
//!
//! Run with: cargo bench -p qlow-interp

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use qlow_interp::ast::{
    BinOp, Expression, ForIterable, GateCall, GateDefinition, GateModifier, IndexElement, Operand,
    Program, RangeExpr, Statement, TypeExpr,
};
use qlow_interp::Interpreter;

/// qubit[n] q; for int i in [0:n-2] { h q[i]; cx q[i], q[i+1]; }
fn ghz_program(n: i64) -> Program {
    let at = |offset: i64| {
        let index = if offset == 0 {
            Expression::ident("i")
        } else {
            Expression::binary(Expression::ident("i"), BinOp::Add, Expression::Int(offset))
        };
        Operand::name("q").with_index(IndexElement::Single(index))
    };
    Program::new(vec![
        Statement::QubitDecl {
            name: "q".into(),
            size: Some(Expression::Int(n)),
        },
        Statement::For {
            ty: TypeExpr::Int(None),
            variable: "i".into(),
            iterable: ForIterable::Range(RangeExpr::new(Expression::Int(0), Expression::Int(n - 2))),
            body: vec![
                Statement::Gate(GateCall::new("h", vec![at(0)])),
                Statement::Gate(GateCall::new("cx", vec![at(0), at(1)])),
            ],
        },
    ])
}

/// A two-level user gate applied with control and inverse modifiers.
fn nested_gate_program(repeats: i64) -> Program {
    let body_gate = |name: &str, params: Vec<Expression>, operands: Vec<&str>| {
        Statement::Gate(
            GateCall::new(name, operands.into_iter().map(Operand::name).collect())
                .with_params(params),
        )
    };
    Program::new(vec![
        Statement::GateDef(GateDefinition {
            name: "inner".into(),
            params: vec!["t".into()],
            qubits: vec!["a".into(), "b".into()],
            body: vec![
                body_gate("rz", vec![Expression::ident("t")], vec!["a"]),
                body_gate("cx", vec![], vec!["a", "b"]),
            ],
        }),
        Statement::GateDef(GateDefinition {
            name: "outer".into(),
            params: vec![],
            qubits: vec!["a".into(), "b".into()],
            body: vec![
                body_gate("inner", vec![Expression::Pi], vec!["a", "b"]),
                body_gate("inner", vec![Expression::Tau], vec!["b", "a"]),
            ],
        }),
        Statement::QubitDecl {
            name: "q".into(),
            size: Some(Expression::Int(3)),
        },
        Statement::Gate(
            GateCall::new(
                "outer",
                vec![Operand::indexed("q", 0), Operand::indexed("q", 1), Operand::indexed("q", 2)],
            )
            .with_modifiers(vec![
                GateModifier::Ctrl(None),
                GateModifier::Inv,
                GateModifier::Pow(Expression::Int(repeats)),
            ]),
        ),
    ])
}

fn bench_ghz(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghz_loop");

    for n in &[4_i64, 16, 64, 256] {
        let program = ghz_program(*n);
        group.bench_with_input(BenchmarkId::new("qubits", n), &program, |b, program| {
            b.iter(|| Interpreter::default().run(black_box(program)).unwrap());
        });
    }

    group.finish();
}

fn bench_inlining(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_inlining");

    for repeats in &[1_i64, 8, 64] {
        let program = nested_gate_program(*repeats);
        group.bench_with_input(BenchmarkId::new("pow", repeats), &program, |b, program| {
            b.iter(|| Interpreter::default().run(black_box(program)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ghz, bench_inlining);
criterion_main!(benches);
