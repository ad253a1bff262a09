//! Dense feed-forward classifier.
//!
//! Layers are stored as `(neurons × inputs)` weight matrices and work on
//! column batches: a batch of `m` samples is a `(features × m)` matrix, so
//!
//! ```text
//! z_l = W_l a_{l−1} + b_l        a_l = f_l(z_l)
//! ```
//!
//! The public API takes and returns one row per sample.
//!
//! Training is mini-batch gradient descent with backpropagation, optional L2
//! regularization, and either plain SGD or Adam updates. A fraction of the
//! training rows can be held out to log validation metrics during training.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::activation::{Activation, Cost};

/// Gradient update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Optimizer {
    Sgd {
        learning_rate: f64,
    },
    Adam {
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
        epsilon: f64,
    },
}

impl Optimizer {
    pub fn sgd(learning_rate: f64) -> Self {
        Optimizer::Sgd { learning_rate }
    }

    pub fn adam(learning_rate: f64) -> Self {
        Optimizer::Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    fn learning_rate(&self) -> f64 {
        match *self {
            Optimizer::Sgd { learning_rate } | Optimizer::Adam { learning_rate, .. } => learning_rate,
        }
    }
}

/// Training schedule.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub batch_size: usize,
    pub epochs: usize,
    /// Share of the rows held out for validation (0 disables validation).
    pub validation_fraction: f64,
    /// Evaluate the validation set every `validation_skip` epochs (and at the end).
    pub validation_skip: usize,
    pub optimizer: Optimizer,
    /// L2 regularization strength applied to the weights.
    pub lambda: f64,
    /// Seed for the validation hold-out and per-epoch shuffles.
    pub seed: u64,
}

/// Metrics recorded for one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    /// Mean mini-batch cost over the epoch.
    pub train_cost: f64,
    pub validation_cost: Option<f64>,
    pub validation_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }
}

#[derive(Debug, Clone)]
struct Layer {
    /// matrix of shape (neurons, inputs)
    weights: DMatrix<f64>,
    /// vector of length neurons
    biases: DVector<f64>,
    activation: Activation,
}

impl Layer {
    /// Weights ~ N(0, 1)/√inputs, biases ~ N(0, 1).
    fn new<R: Rng>(inputs: usize, neurons: usize, activation: Activation, rng: &mut R) -> Self {
        let scale = 1.0 / (inputs as f64).sqrt();
        let weights = DMatrix::from_fn(neurons, inputs, |_, _| {
            rng.sample::<f64, _>(StandardNormal) * scale
        });
        let biases = DVector::from_fn(neurons, |_, _| rng.sample::<f64, _>(StandardNormal));
        Self {
            weights,
            biases,
            activation,
        }
    }

    fn size(&self) -> usize {
        self.biases.len()
    }

    /// Returns `(z, a)` for a column batch.
    fn feedforward(&self, input: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let mut z = &self.weights * input;
        for mut col in z.column_iter_mut() {
            col += &self.biases;
        }
        let a = self.activation.apply(&z);
        (z, a)
    }
}

struct Gradient {
    weights: DMatrix<f64>,
    biases: DVector<f64>,
}

/// First and second moment estimates for one layer (Adam).
struct Moments {
    m_w: DMatrix<f64>,
    v_w: DMatrix<f64>,
    m_b: DVector<f64>,
    v_b: DVector<f64>,
}

pub struct NeuralNetwork {
    inputs: usize,
    outputs: usize,
    cost: Cost,
    layers: Vec<Layer>,
    complete: bool,
    rng: StdRng,
}

impl NeuralNetwork {
    /// Start a network with `inputs` features and `outputs` classes.
    ///
    /// Add hidden layers with [`add_layer`](Self::add_layer) and finish with
    /// [`add_output_layer`](Self::add_output_layer).
    pub fn new(inputs: usize, outputs: usize, cost: Cost, seed: u64) -> Result<Self, AppError> {
        if inputs == 0 || outputs == 0 {
            return Err(AppError::usage("Network needs at least one input and one output."));
        }
        Ok(Self {
            inputs,
            outputs,
            cost,
            layers: Vec::new(),
            complete: false,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn next_input_size(&self) -> usize {
        self.layers.last().map_or(self.inputs, Layer::size)
    }

    pub fn add_layer(&mut self, activation: Activation, neurons: usize) -> Result<&mut Self, AppError> {
        if self.complete {
            return Err(AppError::usage("Cannot add a hidden layer after the output layer."));
        }
        if neurons == 0 {
            return Err(AppError::usage("Hidden layers need at least one neuron."));
        }
        if activation == Activation::Softmax {
            return Err(AppError::usage("Softmax is only supported on the output layer."));
        }
        let inputs = self.next_input_size();
        self.layers.push(Layer::new(inputs, neurons, activation, &mut self.rng));
        Ok(self)
    }

    pub fn add_output_layer(&mut self, activation: Activation) -> Result<&mut Self, AppError> {
        if self.complete {
            return Err(AppError::usage("Output layer already added."));
        }
        if activation == Activation::Softmax && self.cost == Cost::Quadratic {
            return Err(AppError::usage("Softmax output requires the cross-entropy cost."));
        }
        let inputs = self.next_input_size();
        self.layers.push(Layer::new(inputs, self.outputs, activation, &mut self.rng));
        self.complete = true;
        Ok(self)
    }

    /// Layer widths including the input layer, e.g. `[784, 100, 50, 10]`.
    pub fn shape(&self) -> Vec<usize> {
        std::iter::once(self.inputs)
            .chain(self.layers.iter().map(Layer::size))
            .collect()
    }

    /// Train on `x` (one row per sample) against one-hot targets `y`.
    pub fn fit(
        &mut self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        options: &FitOptions,
    ) -> Result<TrainingHistory, AppError> {
        self.check_ready(x)?;
        if y.shape() != (x.nrows(), self.outputs) {
            return Err(AppError::data(format!(
                "Targets have shape {:?}, expected ({}, {}).",
                y.shape(),
                x.nrows(),
                self.outputs
            )));
        }
        if options.batch_size == 0 || options.epochs == 0 {
            return Err(AppError::usage("Batch size and epochs must be > 0."));
        }
        if !(0.0..1.0).contains(&options.validation_fraction) {
            return Err(AppError::usage(format!(
                "Validation fraction must be in [0, 1) (got {}).",
                options.validation_fraction
            )));
        }
        if !(options.optimizer.learning_rate() > 0.0 && options.lambda >= 0.0) {
            return Err(AppError::usage("Learning rate must be > 0 and lambda >= 0."));
        }

        let mut rng = StdRng::seed_from_u64(options.seed);
        let n = x.nrows();
        let n_validation = (options.validation_fraction * n as f64) as usize;
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);
        let (validation_idx, train_idx) = order.split_at(n_validation);
        let mut train_idx = train_idx.to_vec();
        if train_idx.is_empty() {
            return Err(AppError::usage("Validation hold-out leaves no training rows."));
        }

        // Work in column-batch layout from here on.
        let xt = x.transpose();
        let yt = y.transpose();
        let x_validation = xt.select_columns(validation_idx.iter());
        let y_validation = yt.select_columns(validation_idx.iter());

        info!(
            shape = ?self.shape(),
            train = train_idx.len(),
            validation = validation_idx.len(),
            epochs = options.epochs,
            batch_size = options.batch_size,
            "training network"
        );

        let mut moments: Vec<Moments> = self
            .layers
            .iter()
            .map(|l| Moments {
                m_w: DMatrix::zeros(l.weights.nrows(), l.weights.ncols()),
                v_w: DMatrix::zeros(l.weights.nrows(), l.weights.ncols()),
                m_b: DVector::zeros(l.biases.len()),
                v_b: DVector::zeros(l.biases.len()),
            })
            .collect();
        let mut step = 0usize;
        let mut history = TrainingHistory::default();
        let skip = options.validation_skip.max(1);

        for epoch in 1..=options.epochs {
            train_idx.shuffle(&mut rng);
            let mut cost_sum = 0.0;

            for batch in train_idx.chunks(options.batch_size) {
                let xb = xt.select_columns(batch.iter());
                let yb = yt.select_columns(batch.iter());
                let (gradients, cost) = self.backprop(&xb, &yb, options.lambda);
                cost_sum += cost * batch.len() as f64;
                step += 1;
                self.apply_gradients(&gradients, &mut moments, &options.optimizer, step);
            }

            let train_cost = cost_sum / train_idx.len() as f64;
            if !train_cost.is_finite() {
                return Err(AppError::runtime(format!(
                    "Training diverged at epoch {epoch} (non-finite cost)."
                )));
            }

            let mut record = EpochRecord {
                epoch,
                train_cost,
                validation_cost: None,
                validation_accuracy: None,
            };
            if n_validation > 0 && (epoch % skip == 0 || epoch == options.epochs) {
                let (cost, accuracy) = self.evaluate(&x_validation, &y_validation);
                record.validation_cost = Some(cost);
                record.validation_accuracy = Some(accuracy);
                info!(epoch, train_cost, validation_cost = cost, validation_accuracy = accuracy, "epoch");
            } else {
                debug!(epoch, train_cost, "epoch");
            }
            history.epochs.push(record);
        }

        Ok(history)
    }

    /// Class probabilities, one row per sample of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        self.check_ready(x)?;
        let a = self.feedforward(&x.transpose());
        Ok(a.transpose())
    }

    fn check_ready(&self, x: &DMatrix<f64>) -> Result<(), AppError> {
        if !self.complete {
            return Err(AppError::usage("Network has no output layer."));
        }
        if x.ncols() != self.inputs {
            return Err(AppError::data(format!(
                "Input has {} features, network expects {}.",
                x.ncols(),
                self.inputs
            )));
        }
        if x.nrows() == 0 {
            return Err(AppError::data("Input has no samples."));
        }
        Ok(())
    }

    fn output_activation(&self) -> Activation {
        self.layers.last().map_or(Activation::Identity, |l| l.activation)
    }

    fn feedforward(&self, input: &DMatrix<f64>) -> DMatrix<f64> {
        self.layers
            .iter()
            .fold(input.clone(), |a, layer| layer.feedforward(&a).1)
    }

    /// Mean cost and accuracy of column batch `x` against one-hot columns `y`.
    fn evaluate(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> (f64, f64) {
        let a = self.feedforward(x);
        let cost = self.cost.value(self.output_activation(), &a, y);
        let correct = a
            .column_iter()
            .zip(y.column_iter())
            .filter(|(a, y)| a.imax() == y.imax())
            .count();
        (cost, correct as f64 / x.ncols().max(1) as f64)
    }

    /// Gradients of the mean batch cost (plus L2 term) and the batch cost itself.
    fn backprop(&self, x: &DMatrix<f64>, y: &DMatrix<f64>, lambda: f64) -> (Vec<Gradient>, f64) {
        let m = x.ncols() as f64;

        // feedforward, keeping every (z, a)
        let mut zs: Vec<DMatrix<f64>> = Vec::with_capacity(self.layers.len());
        let mut activations: Vec<DMatrix<f64>> = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.clone());
        for layer in &self.layers {
            let (z, a) = layer.feedforward(&activations[activations.len() - 1]);
            zs.push(z);
            activations.push(a);
        }

        let last = self.layers.len() - 1;
        let output = &activations[last + 1];
        let cost = self.cost.value(self.output_activation(), output, y);
        let mut delta = self.cost.delta(self.output_activation(), &zs[last], output, y);

        // backward pass
        let mut reversed: Vec<Gradient> = Vec::with_capacity(self.layers.len());
        for l in (0..=last).rev() {
            let layer = &self.layers[l];
            let mut weights = (&delta * activations[l].transpose()) / m;
            if lambda > 0.0 {
                weights += &layer.weights * lambda;
            }
            let biases = delta.column_sum() / m;

            if l > 0 {
                let below = &self.layers[l - 1];
                let sp = below.activation.derivative(&zs[l - 1], &activations[l]);
                delta = layer.weights.tr_mul(&delta).component_mul(&sp);
            }
            reversed.push(Gradient { weights, biases });
        }
        reversed.reverse();
        (reversed, cost)
    }

    fn apply_gradients(
        &mut self,
        gradients: &[Gradient],
        moments: &mut [Moments],
        optimizer: &Optimizer,
        step: usize,
    ) {
        for ((layer, grad), mom) in self.layers.iter_mut().zip(gradients).zip(moments.iter_mut()) {
            match *optimizer {
                Optimizer::Sgd { learning_rate } => {
                    layer.weights -= &grad.weights * learning_rate;
                    layer.biases -= &grad.biases * learning_rate;
                }
                Optimizer::Adam {
                    learning_rate,
                    beta1,
                    beta2,
                    epsilon,
                } => {
                    let adam = AdamStep {
                        learning_rate,
                        beta1,
                        beta2,
                        epsilon,
                        step,
                    };
                    adam.update(
                        layer.weights.as_mut_slice(),
                        grad.weights.as_slice(),
                        mom.m_w.as_mut_slice(),
                        mom.v_w.as_mut_slice(),
                    );
                    adam.update(
                        layer.biases.as_mut_slice(),
                        grad.biases.as_slice(),
                        mom.m_b.as_mut_slice(),
                        mom.v_b.as_mut_slice(),
                    );
                }
            }
        }
    }
}

struct AdamStep {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: usize,
}

impl AdamStep {
    fn update(&self, params: &mut [f64], grads: &[f64], m: &mut [f64], v: &mut [f64]) {
        let t = self.step as i32;
        let correction1 = 1.0 - self.beta1.powi(t);
        let correction2 = 1.0 - self.beta2.powi(t);
        for i in 0..params.len() {
            let g = grads[i];
            m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
            v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;
            let m_hat = m[i] / correction1;
            let v_hat = v[i] / correction2;
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{to_label, to_onehot};
    use rand_distr::Normal;

    /// Two Gaussian blobs centred at (−2, −2) and (2, 2).
    fn blobs(n: usize, seed: u64) -> (DMatrix<f64>, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.5).unwrap();
        let labels: Vec<usize> = (0..n).map(|i| i % 2).collect();
        let x = DMatrix::from_fn(n, 2, |r, _| {
            let centre = if labels[r] == 1 { 2.0 } else { -2.0 };
            centre + rng.sample(noise)
        });
        (x, labels)
    }

    fn options(optimizer: Optimizer) -> FitOptions {
        FitOptions {
            batch_size: 16,
            epochs: 60,
            validation_fraction: 0.2,
            validation_skip: 20,
            optimizer,
            lambda: 0.0,
            seed: 9,
        }
    }

    fn classifier() -> NeuralNetwork {
        let mut nn = NeuralNetwork::new(2, 2, Cost::CrossEntropy, 1).unwrap();
        nn.add_layer(Activation::Sigmoid, 8)
            .unwrap()
            .add_output_layer(Activation::Softmax)
            .unwrap();
        nn
    }

    #[test]
    fn adam_learns_separable_blobs() {
        let (x, labels) = blobs(200, 3);
        let y = to_onehot(&labels).unwrap();
        let mut nn = classifier();

        let history = nn.fit(&x, &y, &options(Optimizer::adam(0.05))).unwrap();
        assert_eq!(history.epochs.len(), 60);
        let last = history.last().unwrap();
        assert!(last.validation_accuracy.unwrap() > 0.95);
        assert!(history.epochs[59].train_cost < history.epochs[0].train_cost);

        let (x_test, labels_test) = blobs(100, 4);
        let predicted = to_label(&nn.predict(&x_test).unwrap());
        let correct = predicted.iter().zip(&labels_test).filter(|(a, b)| a == b).count();
        assert!(correct >= 95, "correct = {correct}");
    }

    #[test]
    fn weight_gradients_match_finite_differences() {
        let mut nn = classifier();
        // column batch: 2 inputs x 4 samples
        let x = DMatrix::from_row_slice(2, 4, &[0.5, -1.0, 2.0, -0.3, 1.5, 0.2, -0.7, -2.0]);
        let y = DMatrix::from_row_slice(2, 4, &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]);

        let (grads, _) = nn.backprop(&x, &y, 0.0);
        assert_eq!(grads.len(), 2);
        for (grad, layer) in grads.iter().zip(&nn.layers) {
            assert_eq!(grad.weights.shape(), layer.weights.shape());
            assert_eq!(grad.biases.len(), layer.biases.len());
        }

        let eps = 1e-6;
        for (l, (i, j)) in [(0, (0, 0)), (0, (5, 1)), (1, (1, 3)), (1, (0, 7))] {
            nn.layers[l].weights[(i, j)] += eps;
            let (_, up) = nn.backprop(&x, &y, 0.0);
            nn.layers[l].weights[(i, j)] -= 2.0 * eps;
            let (_, down) = nn.backprop(&x, &y, 0.0);
            nn.layers[l].weights[(i, j)] += eps;

            let numeric = (up - down) / (2.0 * eps);
            let analytic = grads[l].weights[(i, j)];
            assert!(
                (numeric - analytic).abs() < 1e-6,
                "layer {l} ({i}, {j}): numeric {numeric} vs backprop {analytic}"
            );
        }
    }

    #[test]
    fn sgd_reduces_training_cost() {
        let (x, labels) = blobs(200, 5);
        let y = to_onehot(&labels).unwrap();
        let mut nn = classifier();
        let history = nn.fit(&x, &y, &options(Optimizer::sgd(0.5))).unwrap();
        assert!(history.epochs[59].train_cost < history.epochs[0].train_cost);
    }

    #[test]
    fn predictions_are_probabilities() {
        let nn = classifier();
        let p = nn.predict(&DMatrix::from_row_slice(3, 2, &[0.0, 1.0, -1.0, 2.0, 5.0, 5.0])).unwrap();
        assert_eq!(p.shape(), (3, 2));
        for row in p.row_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn shape_lists_every_layer() {
        let mut nn = NeuralNetwork::new(64, 10, Cost::CrossEntropy, 0).unwrap();
        nn.add_layer(Activation::Sigmoid, 100)
            .unwrap()
            .add_layer(Activation::Sigmoid, 50)
            .unwrap()
            .add_output_layer(Activation::Softmax)
            .unwrap();
        assert_eq!(nn.shape(), vec![64, 100, 50, 10]);
    }

    #[test]
    fn invalid_architectures_are_rejected() {
        let mut nn = NeuralNetwork::new(2, 2, Cost::Quadratic, 0).unwrap();
        assert!(nn.add_layer(Activation::Softmax, 4).is_err());
        assert!(nn.add_output_layer(Activation::Softmax).is_err());
        assert!(nn.predict(&DMatrix::zeros(1, 2)).is_err());

        let mut nn = classifier();
        assert!(nn.add_layer(Activation::Relu, 3).is_err());
        assert!(nn.predict(&DMatrix::zeros(1, 3)).is_err());
    }

    #[test]
    fn mismatched_targets_are_rejected() {
        let mut nn = classifier();
        let x = DMatrix::zeros(4, 2);
        let y = DMatrix::zeros(4, 3);
        assert!(nn.fit(&x, &y, &options(Optimizer::adam(0.01))).is_err());
    }
}
