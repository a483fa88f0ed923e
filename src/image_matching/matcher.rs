//! Brute-force Hamming matching with cross-check

use super::descriptor::Descriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Index and distance of the closest descriptor in `to`; ties go to the lower index
fn nearest(descriptor: &Descriptor, to: &[Descriptor]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, candidate) in to.iter().enumerate() {
        let distance = descriptor.hamming(candidate);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best
}

/// Pairs that are each other's nearest neighbour, in `query` order
pub fn cross_check(query: &[Descriptor], train: &[Descriptor]) -> Vec<FeatureMatch> {
    let backward: Vec<Option<usize>> = train
        .iter()
        .map(|d| nearest(d, query).map(|(i, _)| i))
        .collect();

    query
        .iter()
        .enumerate()
        .filter_map(|(qi, descriptor)| {
            let (ti, distance) = nearest(descriptor, train)?;
            (backward[ti] == Some(qi)).then_some(FeatureMatch {
                query: qi,
                train: ti,
                distance,
            })
        })
        .collect()
}
