//! L2-regularized logistic regression, one-vs-rest.
//!
//! Each binary sub-problem minimizes
//! `0.5 * |w|^2 + C * sum(log(1 + exp(-y_i * w.x_i)))` over the features plus
//! a constant intercept column, which is regularized like any other weight.
//! Two-class problems fit a single sub-problem for the second class.

use super::Classifier;
use crate::error::{MlError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    /// Inverse regularization strength.
    #[serde(default = "default_c")]
    pub c: f64,
    /// Newton iterations per sub-problem.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Stop once the gradient norm falls below `tol` times its initial value.
    #[serde(default = "default_tol")]
    pub tol: f64,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            c: default_c(),
            max_iter: default_max_iter(),
            tol: default_tol(),
        }
    }
}

fn default_c() -> f64 {
    1.0
}

fn default_max_iter() -> usize {
    100
}

fn default_tol() -> f64 {
    1e-4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LinearParams,
    n_classes: usize,
    /// One weight vector per sub-problem; the last entry is the intercept.
    coef: Vec<Vec<f64>>,
}

impl LogisticRegression {
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            n_classes: 0,
            coef: Vec::new(),
        }
    }

    pub fn coef(&self) -> &[Vec<f64>] {
        &self.coef
    }

    fn decision(w: &[f64], row: ArrayView1<'_, f64>) -> f64 {
        let d = row.len();
        row.iter().zip(&w[..d]).map(|(x, w)| x * w).sum::<f64>() + w[d]
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if n_classes < 2 {
            return Err(MlError::training(format!(
                "LogisticRegression needs samples of at least 2 classes; got {n_classes}"
            )));
        }
        if x.nrows() != y.len() {
            return Err(MlError::training("feature rows and labels differ in length"));
        }

        let augmented = with_intercept(x);
        let positives: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };

        self.coef = positives
            .into_iter()
            .map(|class| {
                let signs: Vec<f64> = y
                    .iter()
                    .map(|&label| if label == class { 1.0 } else { -1.0 })
                    .collect();
                newton(&augmented, &signs, &self.params)
            })
            .collect::<Result<_>>()?;
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if self.coef.is_empty() {
            return Err(MlError::model("LogisticRegression used before fit"));
        }
        let expected = self.coef[0].len() - 1;
        if x.ncols() != expected {
            return Err(MlError::model(format!(
                "expected {expected} features, got {}",
                x.ncols()
            )));
        }

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            if self.n_classes == 2 {
                let p = sigmoid(Self::decision(&self.coef[0], row));
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            } else {
                let scores: Vec<f64> = self
                    .coef
                    .iter()
                    .map(|w| sigmoid(Self::decision(w, row)))
                    .collect();
                let total: f64 = scores.iter().sum();
                for (k, s) in scores.into_iter().enumerate() {
                    proba[[i, k]] = if total > 0.0 {
                        s / total
                    } else {
                        1.0 / self.n_classes as f64
                    };
                }
            }
        }
        Ok(proba)
    }
}

fn with_intercept(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let (n, d) = x.dim();
    let mut out = Array2::ones((n, d + 1));
    out.slice_mut(ndarray::s![.., ..d]).assign(&x);
    out
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(-m))` without overflow.
fn log_loss(margin: f64) -> f64 {
    if margin > 0.0 {
        (-margin).exp().ln_1p()
    } else {
        -margin + margin.exp().ln_1p()
    }
}

fn objective(x: &Array2<f64>, signs: &[f64], w: &Array1<f64>, c: f64) -> f64 {
    let margins = x.dot(w);
    let loss: f64 = margins
        .iter()
        .zip(signs)
        .map(|(z, y)| log_loss(y * z))
        .sum();
    0.5 * w.dot(w) + c * loss
}

/// Damped Newton iterations for one binary sub-problem.
fn newton(x: &Array2<f64>, signs: &[f64], params: &LinearParams) -> Result<Vec<f64>> {
    let d = x.ncols();
    let c = params.c;
    let mut w = Array1::<f64>::zeros(d);
    let mut f = objective(x, signs, &w, c);
    let mut initial_norm = None;

    for iter in 0..params.max_iter {
        let margins = x.dot(&w);
        let mut grad = w.clone();
        let mut hess = Array2::<f64>::eye(d);
        for (i, row) in x.rows().into_iter().enumerate() {
            let s = sigmoid(signs[i] * margins[i]);
            grad.scaled_add(c * (s - 1.0) * signs[i], &row);
            let curvature = c * s * (1.0 - s);
            if curvature > 0.0 {
                for a in 0..d {
                    let ra = row[a] * curvature;
                    if ra == 0.0 {
                        continue;
                    }
                    for b in 0..d {
                        hess[[a, b]] += ra * row[b];
                    }
                }
            }
        }

        let norm = grad.dot(&grad).sqrt();
        let reference = *initial_norm.get_or_insert(norm.max(1.0));
        if norm <= params.tol * reference {
            tracing::trace!(iter, norm, "newton converged");
            break;
        }

        let step = Array1::from(solve_spd(&hess, &(-&grad))?);
        let slope = grad.dot(&step);
        let mut t = 1.0;
        let mut accepted = false;
        for _ in 0..30 {
            let candidate = &w + &(&step * t);
            let fc = objective(x, signs, &candidate, c);
            if fc <= f + 1e-4 * t * slope {
                w = candidate;
                f = fc;
                accepted = true;
                break;
            }
            t *= 0.5;
        }
        if !accepted {
            break;
        }
    }

    if w.iter().any(|v| !v.is_finite()) {
        return Err(MlError::training("logistic regression diverged"));
    }
    Ok(w.to_vec())
}

/// Solve `a * x = b` for symmetric positive-definite `a` via Cholesky.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Result<Vec<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(MlError::training("Hessian is not positive definite"));
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in i + 1..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_symmetric_binary_problem() {
        let x = array![[-2.0], [-1.0], [-2.0], [2.0], [1.0], [2.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let mut clf = LogisticRegression::new(LinearParams::default());
        clf.fit(x.view(), &y, 2).unwrap();

        assert_eq!(clf.predict(x.view()).unwrap(), y.to_vec());
        let w = &clf.coef()[0];
        assert!(w[0] > 0.0);
        assert!(w[1].abs() < 1e-6);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [2.0, 2.0], [3.0, 0.5]];
        let y = [0, 1, 2, 0, 2, 1];
        let mut clf = LogisticRegression::new(LinearParams::default());
        clf.fit(x.view(), &y, 3).unwrap();
        let proba = clf.predict_proba(x.view()).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let mut clf = LogisticRegression::new(LinearParams::default());
        assert!(matches!(
            clf.fit(x.view(), &[0, 0], 1),
            Err(MlError::Training(_))
        ));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let x = array![[1.0], [2.0]];
        let mut clf = LogisticRegression::new(LinearParams::default());
        clf.fit(x.view(), &[0, 1], 2).unwrap();
        assert!(clf.predict_proba(array![[1.0, 2.0]].view()).is_err());
    }

    #[test]
    fn test_solve_spd() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, &b).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
    }
}
