//! Histogram regression trees grown on gradient statistics.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Quantile bin edges per feature, computed once per training matrix.
///
/// Bin `b` of feature `j` holds values `v` with `upper[j][b - 1] < v <= upper[j][b]`;
/// the last upper edge is `+inf`.
#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    bins: Array2<u16>,
    upper: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    pub(crate) fn new(x: ArrayView2<'_, f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, u16::MAX as usize);
        let upper: Vec<Vec<f64>> = x
            .axis_iter(Axis(1))
            .map(|column| bin_edges(column, max_bins))
            .collect();

        let mut bins = Array2::<u16>::zeros(x.dim());
        for (j, edges) in upper.iter().enumerate() {
            for (i, value) in x.column(j).iter().enumerate() {
                bins[[i, j]] = edges.partition_point(|edge| edge < value) as u16;
            }
        }
        Self { bins, upper }
    }

    pub(crate) fn n_bins(&self, feature: usize) -> usize {
        self.upper[feature].len()
    }

    fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.upper[feature][bin]
    }
}

fn bin_edges(column: ArrayView1<'_, f64>, max_bins: usize) -> Vec<f64> {
    let mut unique = column.to_vec();
    unique.sort_by(f64::total_cmp);
    unique.dedup();

    let mut edges = Vec::new();
    let m = unique.len();
    if m <= max_bins {
        edges.extend(unique.windows(2).map(|w| 0.5 * (w[0] + w[1])));
    } else {
        for i in 1..max_bins {
            let pos = i * m / max_bins;
            edges.push(0.5 * (unique[pos - 1] + unique[pos]));
        }
        edges.dedup();
    }
    edges.push(f64::INFINITY);
    edges
}

/// Growth limits shared by every tree of an ensemble.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: usize,
    pub(crate) lambda: f64,
    pub(crate) min_child_weight: f64,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub(crate) fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Gradient statistics of one boosting round.
#[derive(Debug)]
pub(crate) struct Growth<'a> {
    pub(crate) binned: &'a BinnedMatrix,
    pub(crate) grad: &'a [f64],
    pub(crate) hess: &'a [f64],
    pub(crate) params: TreeParams,
    pub(crate) shrinkage: f64,
}

impl Growth<'_> {
    /// Grow a tree on `rows`, splitting only on `features`.
    ///
    /// Leaves hold `-G / (H + lambda) * shrinkage`; every split's gain is added
    /// to `gains[feature]`.
    pub(crate) fn tree(&self, rows: Vec<usize>, features: &[usize], gains: &mut [f64]) -> Tree {
        let mut builder = Builder {
            growth: self,
            features,
            gains,
            nodes: Vec::new(),
        };
        builder.build(rows, 0);
        Tree {
            nodes: builder.nodes,
        }
    }
}

struct Builder<'g, 'a> {
    growth: &'g Growth<'a>,
    features: &'g [usize],
    gains: &'g mut [f64],
    nodes: Vec<Node>,
}

struct Candidate {
    gain: f64,
    feature: usize,
    bin: usize,
}

impl Builder<'_, '_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let (g, h) = self.totals(&rows);
        self.nodes.push(Node::Leaf {
            value: -g / (h + self.growth.params.lambda) * self.growth.shrinkage,
        });

        if depth >= self.growth.params.max_depth || rows.len() < 2 {
            return index;
        }
        let Some(best) = self.best_split(&rows, g, h) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.growth.binned.bins[[i, best.feature]] as usize <= best.bin);
        self.gains[best.feature] += best.gain;

        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: self.growth.binned.threshold(best.feature, best.bin),
            left,
            right,
        };
        index
    }

    fn totals(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.growth.grad[i], h + self.growth.hess[i]))
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<Candidate> {
        let lambda = self.growth.params.lambda;
        let parent = g * g / (h + lambda);
        let mut best: Option<Candidate> = None;

        for &feature in self.features {
            let n_bins = self.growth.binned.n_bins(feature);
            if n_bins < 2 {
                continue;
            }
            let mut hist_g = vec![0.0; n_bins];
            let mut hist_h = vec![0.0; n_bins];
            for &i in rows {
                let b = self.growth.binned.bins[[i, feature]] as usize;
                hist_g[b] += self.growth.grad[i];
                hist_h[b] += self.growth.hess[i];
            }

            let (mut gl, mut hl) = (0.0, 0.0);
            for bin in 0..n_bins - 1 {
                gl += hist_g[bin];
                hl += hist_h[bin];
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.growth.params.min_child_weight || hr < self.growth.params.min_child_weight {
                    continue;
                }
                let gain =
                    0.5 * (gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent);
                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(Candidate { gain, feature, bin });
                }
            }
        }
        best
    }
}
