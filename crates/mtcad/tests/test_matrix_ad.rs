//! End-to-end tests of forward and reverse mode on small matrix programs.
//!
//! Covers:
//! - forward propagation of trace and matrix products
//! - reverse sweeps through dot, inverse, trace and block assembly
//! - Hessian columns from forward-over-reverse and a full Newton step

use approx::assert_relative_eq;
use mtcad::{CGraph, Matrix, Mtc, Operand, newton_step};

fn mat(rows: &[[f64; 2]]) -> Matrix {
    Matrix::from_rows(rows).unwrap()
}

fn assert_matrix_eq(actual: &Matrix, expected: &Matrix, eps: f64) {
    assert_eq!(actual.shape(), expected.shape());
    for (a, e) in actual.data().iter().zip(expected.data()) {
        assert_relative_eq!(*a, *e, epsilon = eps);
    }
}

#[test]
fn test_trace_forward() {
    let x = Mtc::new(Matrix::ones(2, 2), Matrix::ones(2, 2)).unwrap();
    let y = x.trace().unwrap();
    assert_eq!(y.x()[(0, 0)], x.x().trace().unwrap());
    assert_eq!(y.xdot()[(0, 0)], x.xdot().trace().unwrap());
}

/// f = x.dot(y) with x = 1, y = 2: grad f = (2, 1), hess f = [[0, 1], [1, 0]].
#[test]
fn test_1x1_dot_reverse() {
    let cg = CGraph::new();
    let x = cg.variable(Mtc::scalar(1.0, 1.0));
    let y = cg.variable(Mtc::scalar(2.0, 0.0));
    let r = x.dot(y).unwrap();

    cg.set_independents(&[x, y]).unwrap();
    cg.set_dependents(&[r]).unwrap();
    cg.reverse(&[Mtc::constant(Matrix::scalar(1.0))]).unwrap();

    let xbar = x.xbar().unwrap();
    let ybar = y.xbar().unwrap();
    assert_eq!(xbar.x()[(0, 0)], 2.0);
    assert_eq!(ybar.x()[(0, 0)], 1.0);

    // first column of the Hessian
    assert_eq!(xbar.xdot()[(0, 0)], 0.0);
    assert_eq!(ybar.xdot()[(0, 0)], 1.0);
}

#[test]
fn test_2x2_dot_reverse() {
    let a = mat(&[[3.0, 1.0], [2.0, 4.0]]);
    let adot = mat(&[[1.0, 0.0], [0.0, 0.0]]);
    let b = mat(&[[5.0, 2.0], [1.0, 7.0]]);
    let bdot = Matrix::zeros(2, 2);
    let cbar = mat(&[[1.0, 0.0], [0.0, 0.0]]);

    let cg = CGraph::new();
    let fa = cg.variable(Mtc::new(a, adot).unwrap());
    let fb = cg.variable(Mtc::new(b, bdot).unwrap());
    let fc = fa.dot(fb).unwrap();

    cg.set_independents(&[fa, fb]).unwrap();
    cg.set_dependents(&[fc]).unwrap();
    cg.reverse(&[Mtc::constant(cbar)]).unwrap();

    // forward evaluation
    assert_eq!(fc.value().x(), &mat(&[[16.0, 13.0], [14.0, 32.0]]));
    assert_eq!(fc.value().xdot(), &mat(&[[5.0, 2.0], [0.0, 0.0]]));

    // reverse evaluation: Abar = Cbar @ B^T, Bbar = A^T @ Cbar
    let abar = fa.xbar().unwrap();
    let bbar = fb.xbar().unwrap();
    assert_eq!(abar.x(), &mat(&[[5.0, 1.0], [0.0, 0.0]]));
    assert_eq!(bbar.x(), &mat(&[[3.0, 0.0], [1.0, 0.0]]));

    // directional parts: Abar' = Cbar @ Bdot^T = 0, Bbar' = Adot^T @ Cbar
    assert_eq!(abar.xdot(), &Matrix::zeros(2, 2));
    assert_eq!(bbar.xdot(), &mat(&[[1.0, 0.0], [0.0, 0.0]]));
}

/// C = [[A, B], [B, A]]: each block's adjoint is the sum over both positions.
#[test]
fn test_matrix_assembly_2x2() {
    let a = Mtc::new(Matrix::ones(2, 2), Matrix::filled(2, 2, 2.0)).unwrap();
    let b = Mtc::new(Matrix::filled(2, 2, 3.0), Matrix::filled(2, 2, 4.0)).unwrap();

    let cg = CGraph::new();
    let fa = cg.variable(a.clone());
    let fb = cg.variable(b.clone());
    let fc = cg.block(vec![vec![fa, fb], vec![fb, fa]]).unwrap();

    let cbar = Mtc::new(Matrix::filled(4, 4, 5.0), Matrix::filled(4, 4, 6.0)).unwrap();
    cg.set_independents(&[fa, fb]).unwrap();
    cg.set_dependents(&[fc]).unwrap();
    cg.reverse(&[cbar]).unwrap();

    // forward evaluation
    let c = fc.value();
    assert_eq!(c.slice(0..2, 0..2).unwrap(), a);
    assert_eq!(c.slice(0..2, 2..4).unwrap(), b);
    assert_eq!(c.slice(2..4, 0..2).unwrap(), b);
    assert_eq!(c.slice(2..4, 2..4).unwrap(), a);

    // reverse evaluation
    let fcbar = fc.xbar().unwrap();
    let abar = fa.xbar().unwrap();
    let bbar = fb.xbar().unwrap();
    assert_eq!(abar, fcbar.slice(0..2, 0..2).unwrap().scale(2.0));
    assert_eq!(bbar, fcbar.slice(2..4, 2..4).unwrap().scale(2.0));
    assert!(abar.x().data().iter().all(|&v| v == 10.0));
    assert!(abar.xdot().data().iter().all(|&v| v == 12.0));
}

#[test]
fn test_inverse_2x2() {
    let a = mat(&[[3.0, 0.0], [0.0, 7.0]]);
    let adot = mat(&[[1.0, 0.0], [0.0, 0.0]]);

    let cg = CGraph::new();
    let fa = cg.variable(Mtc::new(a, adot).unwrap());
    let finv = fa.inv().unwrap();
    let cbar = Matrix::identity(2);
    cg.set_independents(&[fa]).unwrap();
    cg.set_dependents(&[finv]).unwrap();
    cg.reverse(&[Mtc::constant(cbar)]).unwrap();

    let c = mat(&[[1.0 / 3.0, 0.0], [0.0, 1.0 / 7.0]]);
    assert_matrix_eq(finv.value().x(), &c, 1e-15);

    // Abar = -C^T @ Cbar @ C^T
    let expected = mat(&[[-1.0 / 9.0, 0.0], [0.0, -1.0 / 49.0]]);
    assert_matrix_eq(fa.xbar().unwrap().x(), &expected, 1e-15);
}

#[test]
fn test_trace_2x2() {
    let a = Mtc::new(Matrix::ones(2, 2), Matrix::filled(2, 2, 2.0)).unwrap();

    let cg = CGraph::new();
    let fa = cg.variable(a);
    let ftr = fa.trace().unwrap();
    cg.set_independents(&[fa]).unwrap();
    cg.set_dependents(&[ftr]).unwrap();
    cg.reverse(&[Mtc::scalar(13.0, 0.0)]).unwrap();

    let abar = fa.xbar().unwrap();
    assert_eq!(abar.x(), &mat(&[[13.0, 0.0], [0.0, 13.0]]));
    assert_eq!(abar.xdot(), &Matrix::zeros(2, 2));
}

/// min_q Phi(C(q)) with Phi(C) = trace(C), C = [[q1^2, 0], [0, q2^2]].
///
/// Starting at (13, 17), a full Newton step lands on (0, 0).
#[test]
fn test_newtons_method() {
    let mut h = Matrix::zeros(2, 2);
    let mut g = Matrix::zeros(2, 2);

    for n in 0..2 {
        let cg = CGraph::new();
        let q1 = cg.variable(Mtc::scalar(13.0, if n == 0 { 1.0 } else { 0.0 }));
        let q2 = cg.variable(Mtc::scalar(17.0, if n == 1 { 1.0 } else { 0.0 }));
        let ze = cg.constant(Mtc::scalar(0.0, 0.0));
        let c = cg
            .block(vec![
                vec![q1.mul(q1).unwrap(), ze],
                vec![ze, q2.mul(q2).unwrap()],
            ])
            .unwrap();
        let phi = c.trace().unwrap();

        cg.set_independents(&[q1, q2]).unwrap();
        cg.set_dependents(&[phi]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();

        let q1bar = q1.xbar().unwrap();
        let q2bar = q2.xbar().unwrap();
        g[(0, n)] = q1bar.x()[(0, 0)];
        g[(1, n)] = q2bar.x()[(0, 0)];
        h[(0, n)] = q1bar.xdot()[(0, 0)];
        h[(1, n)] = q2bar.xdot()[(0, 0)];
    }

    // both directions see the same gradient
    assert_eq!(g, mat(&[[26.0, 26.0], [34.0, 34.0]]));
    assert_eq!(h, mat(&[[2.0, 0.0], [0.0, 2.0]]));

    let q_plus = newton_step(&[13.0, 17.0], |cg, q| {
        let c = cg.block(vec![
            vec![Operand::from(q[0].mul(q[0])?), Operand::from(0.0)],
            vec![Operand::from(0.0), Operand::from(q[1].mul(q[1])?)],
        ])?;
        c.trace()
    })
    .unwrap();
    assert_eq!(q_plus, vec![0.0, 0.0]);
}

#[test]
fn test_graph_dump() {
    let cg = CGraph::new();
    let a = cg.variable(Mtc::new(mat(&[[3.0, 1.0], [2.0, 4.0]]), mat(&[[1.0, 0.0], [0.0, 0.0]])).unwrap());
    let b = cg.variable(Mtc::constant(mat(&[[5.0, 2.0], [1.0, 7.0]])));
    let t = a.dot(b).unwrap().trace().unwrap();
    cg.set_independents(&[a, b]).unwrap();
    cg.set_dependents(&[t]).unwrap();
    cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();

    let dump = cg.to_string();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines[0], "CGraph with 4 nodes");
    assert_eq!(lines[3].trim(), "2: dot [0, 1] 2x2");
    assert_eq!(lines[4].trim(), "3: trace [2] 1x1");
    assert_eq!(lines[5], "independents: [0, 1]");
    assert_eq!(lines[6], "dependents: [3]");

    // d tr(AB) / dA = B^T
    assert_eq!(a.xbar().unwrap().x(), &mat(&[[5.0, 1.0], [2.0, 7.0]]));
}

#[test]
fn test_independent_graphs_do_not_interact() {
    let cg1 = CGraph::new();
    let cg2 = CGraph::new();
    let x1 = cg1.variable(Mtc::scalar(2.0, 0.0));
    let x2 = cg2.variable(Mtc::scalar(5.0, 0.0));
    let y1 = x1.mul(x1).unwrap();
    let y2 = x2.scale(3.0);

    assert_eq!(cg1.len(), 2);
    assert_eq!(cg2.len(), 2);

    cg1.set_independents(&[x1]).unwrap();
    cg1.set_dependents(&[y1]).unwrap();
    cg1.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();

    assert_eq!(x1.xbar().unwrap().x()[(0, 0)], 4.0);
    assert!(x2.xbar().is_none());
    assert!(y2.xbar().is_none());
}
