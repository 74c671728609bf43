use ndarray::prelude::*;

/// Cosine similarity rescaled from [-1, 1] to [0, 1].
/// Assumes both vectors are already L2-normalized.
pub fn pcos(u: ArrayView1<f32>, v: ArrayView1<f32>) -> f32 {
    (u.dot(&v) + 1.) / 2.
}

/// Multiplicative contextual similarity: compare a potential substitute
/// vector `s` to the target vector `t` and the n context vectors `c`.
/// All inputs must be L2-normalized already.
///
/// The exponent is (n+1), not 1/(n+1): with context this is NOT the
/// geometric mean of the pairwise similarities, and the value shrinks as
/// context grows. Deliberate; keep the literal arithmetic.
pub fn sim_mult(s: ArrayView1<f32>, t: ArrayView1<f32>, c: ArrayView2<f32>) -> f32 {
    let n = c.len_of(Axis(0));
    let left = pcos(s, t);
    if n == 0 {
        return left;
    }
    let right: f32 = c.rows().into_iter().map(|cv| pcos(s, cv)).product();
    (left * right).powi((n + 1) as i32)
}

/// Additive contextual similarity: the arithmetic mean of the
/// target-similarity and the n context-similarities. Assumes all inputs
/// are L2-normalized, so a plain dot product is the cosine.
pub fn sim_add(s: ArrayView1<f32>, t: ArrayView1<f32>, c: ArrayView2<f32>) -> f32 {
    let n = c.len_of(Axis(0));
    let left = s.dot(&t);
    if n == 0 {
        return left;
    }
    let right: f32 = c.rows().into_iter().map(|cv| s.dot(&cv)).sum();
    (left + right) / (n + 1) as f32
}

/// Up to `n` tokens on each side of `ind`, clipped at the sequence
/// boundaries, in original left-to-right order. No padding.
pub fn context_window(toks: &[String], ind: usize, n: usize) -> Vec<&str> {
    let before = &toks[ind.saturating_sub(n)..ind];
    let after = &toks[(ind + 1).min(toks.len())..(ind + n + 1).min(toks.len())];
    before.iter().chain(after.iter()).map(|t| t.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use crate::addcos::*;
    use ndarray::prelude::*;

    fn unit(v: Vec<f32>) -> Array1<f32> {
        let n = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        Array1::from_vec(v).mapv(|x| x / n)
    }

    #[test]
    fn test_pcos_bounds() {
        let v = unit(vec![0.3, -0.4, 0.5]);
        let neg = v.mapv(|x| -x);
        assert!((pcos(v.view(), v.view()) - 1.0).abs() < 1e-6);
        assert!(pcos(v.view(), neg.view()).abs() < 1e-6);
    }

    #[test]
    fn test_sim_add_empty_context() {
        let s = unit(vec![1., 0., 0.]);
        let t = unit(vec![0.6, 0.8, 0.]);
        let c = Array2::<f32>::zeros((0, 3));
        assert_eq!(sim_add(s.view(), t.view(), c.view()), s.view().dot(&t.view()));
    }

    #[test]
    fn test_sim_add_context_permutation() {
        let s = unit(vec![0.2, 0.5, -0.1]);
        let t = unit(vec![0.9, 0.1, 0.3]);
        let c1 = unit(vec![0.1, 0.1, 0.8]);
        let c2 = unit(vec![-0.5, 0.4, 0.2]);
        let mut cmat = Array2::<f32>::zeros((2, 3));
        cmat.row_mut(0).assign(&c1);
        cmat.row_mut(1).assign(&c2);
        let mut cmat_rev = Array2::<f32>::zeros((2, 3));
        cmat_rev.row_mut(0).assign(&c2);
        cmat_rev.row_mut(1).assign(&c1);
        let a = sim_add(s.view(), t.view(), cmat.view());
        let b = sim_add(s.view(), t.view(), cmat_rev.view());
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_sim_add_is_mean() {
        let s = unit(vec![1., 0.]);
        let t = unit(vec![0., 1.]);
        let mut cmat = Array2::<f32>::zeros((1, 2));
        cmat.row_mut(0).assign(&unit(vec![1., 0.]));
        // (dot(s,t) + dot(s,c)) / 2 = (0 + 1) / 2
        assert!((sim_add(s.view(), t.view(), cmat.view()) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sim_add_zero_sentinel_degrades() {
        // an out-of-vocabulary substitute scores 0 against anything
        let s = Array1::<f32>::zeros(3);
        let t = unit(vec![0.6, 0.8, 0.]);
        let mut cmat = Array2::<f32>::zeros((1, 3));
        cmat.row_mut(0).assign(&unit(vec![1., 0., 0.]));
        assert_eq!(sim_add(s.view(), t.view(), cmat.view()), 0.0);
    }

    #[test]
    fn test_sim_mult_literal_exponent() {
        let s = unit(vec![1., 0.]);
        let t = unit(vec![0.6, 0.8]);
        let c1 = unit(vec![0., 1.]);
        let mut cmat = Array2::<f32>::zeros((1, 2));
        cmat.row_mut(0).assign(&c1);
        let left = pcos(s.view(), t.view());
        let right = pcos(s.view(), c1.view());
        let expect = (left * right).powi(2);
        assert!((sim_mult(s.view(), t.view(), cmat.view()) - expect).abs() < 1e-6);
        // empty context returns the rescaled target similarity
        let empty = Array2::<f32>::zeros((0, 2));
        assert_eq!(sim_mult(s.view(), t.view(), empty.view()), left);
    }

    fn toks(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_context_window() {
        let ts = toks(&["w0", "w1", "w2", "w3", "w4"]);
        assert_eq!(context_window(&ts, 2, 2), vec!["w0", "w1", "w3", "w4"]);
        assert_eq!(context_window(&ts, 0, 2), vec!["w1", "w2"]);
        assert_eq!(context_window(&ts, 4, 2), vec!["w2", "w3"]);
        assert_eq!(context_window(&ts, 1, 1), vec!["w0", "w2"]);
        let one = toks(&["only"]);
        assert!(context_window(&one, 0, 2).is_empty());
    }
}
