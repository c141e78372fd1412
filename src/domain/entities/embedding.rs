use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Scales the vector to unit L2 norm. Zero vectors are returned unchanged.
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for x in &mut self.0 {
                *x /= norm;
            }
        }
        self
    }

    pub fn is_normalized(&self) -> bool {
        (self.norm() - 1.0).abs() < 1e-4
    }

    /// Inner product; equals cosine similarity when both sides are normalized.
    pub fn inner_product(&self, other: &[f32]) -> f32 {
        self.0.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized() {
        let emb = Embedding::new(vec![3.0, 4.0]).normalized();
        assert!(emb.is_normalized());
        assert!((emb.0[0] - 0.6).abs() < 1e-6);
        assert!((emb.0[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let emb = Embedding::new(vec![0.0, 0.0, 0.0]).normalized();
        assert_eq!(emb.as_slice(), &[0.0, 0.0, 0.0]);
        assert!(!emb.is_normalized());
    }

    #[test]
    fn test_inner_product_of_unit_vectors() {
        let a = Embedding::new(vec![1.0, 0.0]);
        assert!((a.inner_product(&[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(a.inner_product(&[0.0, 1.0]).abs() < 1e-6);
    }
}
