use crate::error::RetrievalError;

/// Exact brute-force L2 nearest-neighbor index over one document's chunk
/// embeddings. Rebuilt from the store on every query; there is no
/// incremental update path.
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn build(embeddings: &[Vec<f32>]) -> Result<Self, RetrievalError> {
        let first = embeddings.first().ok_or(RetrievalError::EmptyCorpus)?;
        let dimensions = first.len();

        for vector in embeddings {
            if vector.len() != dimensions {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimensions,
                    found: vector.len(),
                });
            }
        }

        Ok(Self {
            dimensions,
            vectors: embeddings.to_vec(),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Returns up to `top_k` `(position, distance)` pairs ordered by
    /// ascending L2 distance. Ties keep insertion order (stable sort).
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>, RetrievalError> {
        if query.len() != self.dimensions {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimensions,
                found: query.len(),
            });
        }

        let mut distances: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, l2_distance(query, vector)))
            .collect();

        distances.sort_by(|left, right| left.1.total_cmp(&right.1));
        distances.truncate(top_k);
        Ok(distances)
    }
}

fn l2_distance(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_embedding_set_is_rejected() {
        let result = FlatIndex::build(&[]);
        assert!(matches!(result, Err(RetrievalError::EmptyCorpus)));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let result = FlatIndex::build(&[vec![0.0, 1.0], vec![0.0, 1.0, 2.0]]);
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn query_dimension_is_validated() {
        let index = FlatIndex::build(&[vec![0.0, 1.0]]).unwrap();
        let result = index.search(&[1.0], 1);
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn nearest_vectors_come_first() {
        let index = FlatIndex::build(&[
            vec![10.0, 0.0],
            vec![1.0, 0.0],
            vec![5.0, 0.0],
        ])
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|(position, _)| *position).collect();
        assert_eq!(order, vec![1, 2, 0]);

        let distances: Vec<f32> = hits.iter().map(|(_, distance)| *distance).collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = FlatIndex::build(&[vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let hits = index.search(&[0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|(position, _)| *position).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn top_k_larger_than_corpus_returns_everything() {
        let index = FlatIndex::build(&[vec![0.0], vec![2.0]]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), 1);
        assert!(!index.is_empty());

        let hits = index.search(&[0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
    }
}
