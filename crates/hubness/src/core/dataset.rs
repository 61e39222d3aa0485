//! Labeled datasets over which neighbor sets are computed.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::HubnessError;

/// The narrow view of a dataset that neighbor-set computations need.
///
/// Every indexed item carries a class label in `0..num_classes()`. Neighbor
/// sets only depend on the labels and on pairwise distances; the items
/// themselves are only touched when a `Metric` has to be evaluated.
pub trait LabeledDataset {
    /// Returns the number of items in the dataset.
    fn cardinality(&self) -> usize;

    /// Returns the class label of an indexed item.
    ///
    /// The implementor may choose to panic if the index is out of bounds.
    fn label(&self, index: usize) -> usize;

    /// Returns the number of classes, i.e. one more than the largest label.
    fn num_classes(&self) -> usize;

    /// Returns all labels in index order.
    fn labels(&self) -> Vec<usize> {
        (0..self.cardinality()).map(|i| self.label(i)).collect()
    }

    /// Returns the number of items in each class.
    fn class_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_classes()];
        for i in 0..self.cardinality() {
            sizes[self.label(i)] += 1;
        }
        sizes
    }

    /// Returns the relative frequency of each class.
    fn class_priors(&self) -> Vec<f64> {
        let n = self.cardinality();
        self.class_sizes()
            .into_iter()
            .map(|s| if n == 0 { 0.0 } else { crate::utils::ratio(s, n) })
            .collect()
    }

    /// Returns the indices of the items in each class.
    fn class_indices(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.num_classes()];
        for i in 0..self.cardinality() {
            members[self.label(i)].push(i);
        }
        members
    }
}

/// A dataset of items with class labels.
///
/// # Type Parameters
///
/// - `I`: The type of the items in the dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Labeled<I> {
    /// The items in the dataset.
    items: Vec<I>,
    /// The class label of each item.
    labels: Vec<usize>,
    /// The number of classes.
    num_classes: usize,
    /// The name of the dataset.
    name: String,
}

impl<I> Labeled<I> {
    /// Creates a new `Labeled` dataset.
    ///
    /// The number of classes is one more than the largest label.
    ///
    /// # Errors
    ///
    /// * If the items are empty.
    /// * If the number of labels does not match the number of items.
    pub fn new(items: Vec<I>, labels: Vec<usize>) -> Result<Self, HubnessError> {
        let num_classes = labels.iter().max().map_or(0, |&c| c + 1);
        Self::with_num_classes(items, labels, num_classes)
    }

    /// Creates a new `Labeled` dataset with an explicit number of classes.
    ///
    /// Some classes may be empty, e.g. after a dataset has been subsampled.
    ///
    /// # Errors
    ///
    /// * If the items are empty.
    /// * If the number of labels does not match the number of items.
    /// * If a label is not smaller than `num_classes`.
    pub fn with_num_classes(items: Vec<I>, labels: Vec<usize>, num_classes: usize) -> Result<Self, HubnessError> {
        if items.is_empty() {
            return Err(HubnessError::config("The items are empty."));
        }
        if items.len() != labels.len() {
            return Err(HubnessError::config(format!(
                "The number of labels does not match the number of items. {} vs {}",
                labels.len(),
                items.len()
            )));
        }
        if let Some(&c) = labels.iter().find(|&&c| c >= num_classes) {
            return Err(HubnessError::config(format!(
                "Label {c} is out of range for {num_classes} classes."
            )));
        }
        Ok(Self {
            items,
            labels,
            num_classes,
            name: "Unknown Labeled".to_string(),
        })
    }

    /// Changes the name of the dataset.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Returns the name of the dataset.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to an indexed item.
    #[must_use]
    pub fn get(&self, index: usize) -> &I {
        &self.items[index]
    }

    /// Returns the items in the dataset.
    #[must_use]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Chooses `n` unique indices from the dataset, e.g. as a random set of
    /// prototypes. If `n` is not smaller than the cardinality, all indices
    /// are returned. The returned indices are sorted.
    #[must_use]
    pub fn choose_unique(&self, n: usize, seed: Option<u64>) -> Vec<usize> {
        let mut indices = (0..self.items.len()).collect::<Vec<_>>();
        if n < indices.len() {
            let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            indices.shuffle(&mut rng);
            indices.truncate(n);
            indices.sort_unstable();
        }
        indices
    }
}

impl<I: Clone> Labeled<I> {
    /// Returns a new dataset with the items at the given indices, in the
    /// order given. The number of classes is kept.
    ///
    /// # Errors
    ///
    /// * If `indices` is empty.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, HubnessError> {
        let items = indices.iter().map(|&i| self.items[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        Self::with_num_classes(items, labels, self.num_classes).map(|d| d.with_name(&format!("{}-subset", self.name)))
    }
}

impl<I> LabeledDataset for Labeled<I> {
    fn cardinality(&self) -> usize {
        self.items.len()
    }

    fn label(&self, index: usize) -> usize {
        self.labels[index]
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn labels(&self) -> Vec<usize> {
        self.labels.clone()
    }
}

/// A bare list of labels is a dataset whose items are only known through a
/// precomputed distance matrix.
impl LabeledDataset for [usize] {
    fn cardinality(&self) -> usize {
        self.len()
    }

    fn label(&self, index: usize) -> usize {
        self[index]
    }

    fn num_classes(&self) -> usize {
        self.iter().max().map_or(0, |&c| c + 1)
    }

    fn labels(&self) -> Vec<usize> {
        self.to_vec()
    }
}

impl LabeledDataset for Vec<usize> {
    fn cardinality(&self) -> usize {
        self.len()
    }

    fn label(&self, index: usize) -> usize {
        self[index]
    }

    fn num_classes(&self) -> usize {
        self.as_slice().num_classes()
    }

    fn labels(&self) -> Vec<usize> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{Labeled, LabeledDataset};

    #[test]
    fn creation() -> Result<(), String> {
        let data = Labeled::new(vec![[0.0_f32], [1.0], [2.0], [3.0]], vec![0, 0, 1, 2])?;
        assert_eq!(data.cardinality(), 4);
        assert_eq!(data.num_classes(), 3);
        assert_eq!(data.class_sizes(), vec![2, 1, 1]);
        assert_eq!(data.class_indices(), vec![vec![0, 1], vec![2], vec![3]]);
        assert!((data.class_priors()[0] - 0.5).abs() < 1e-12);

        assert!(Labeled::new(Vec::<[f32; 1]>::new(), vec![]).is_err());
        assert!(Labeled::new(vec![[0.0_f32]], vec![0, 1]).is_err());
        assert!(Labeled::with_num_classes(vec![[0.0_f32]], vec![3], 2).is_err());

        Ok(())
    }

    #[test]
    fn choose_unique() -> Result<(), String> {
        let data = Labeled::new((0..20).collect::<Vec<i32>>(), vec![0; 20])?;
        let chosen = data.choose_unique(5, Some(42));
        assert_eq!(chosen.len(), 5);
        assert!(chosen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(chosen, data.choose_unique(5, Some(42)));
        assert_eq!(data.choose_unique(50, None).len(), 20);

        let sub = data.subset(&chosen)?;
        assert_eq!(sub.cardinality(), 5);
        assert_eq!(sub.items(), chosen.iter().map(|&i| i as i32).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn bare_labels() {
        let labels = vec![1, 1, 0, 2];
        assert_eq!(labels.num_classes(), 3);
        assert_eq!(labels.class_sizes(), vec![1, 2, 1]);
        assert_eq!(labels.as_slice().label(3), 2);
    }
}
