/// Dot product. For unit-norm inputs this is the cosine similarity in [-1, 1].
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Scales `vector` to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_of_identical_unit_vectors_is_one() {
        let mut a = vec![3.0, 4.0];
        l2_normalize(&mut a);

        assert!((dot(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dot_of_opposite_vectors_is_negative() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];

        assert_eq!(dot(&a, &b), -1.0);
    }

    #[test]
    fn dot_returns_zero_on_dimension_mismatch() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0];

        assert_eq!(dot(&a, &b), 0.0);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);

        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
