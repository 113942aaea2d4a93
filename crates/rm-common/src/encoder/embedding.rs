#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub dimension: usize,
    pub source: EmbeddingSource,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, dimension: usize, source: EmbeddingSource) -> Self {
        Self {
            vector,
            dimension,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    Profile,
    Occupation,
}
