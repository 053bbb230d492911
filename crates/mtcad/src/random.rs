//! Random matrix construction.
//!
//! Used to draw test inputs and forward-mode seed directions.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::matrix::Matrix;
use crate::mtc::Mtc;

impl Matrix {
    /// Create a matrix with uniform random values in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::Matrix;
    ///
    /// let m = Matrix::random(2, 3);
    /// assert_eq!(m.shape(), (2, 3));
    /// assert!(m.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    /// ```
    pub fn random(rows: usize, cols: usize) -> Self {
        Self::random_with_rng(rows, cols, &mut rand::rng())
    }

    /// Create a matrix with uniform random values using a specific RNG.
    ///
    /// This is useful for reproducible results with a seeded RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::Matrix;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let m1 = Matrix::random_with_rng(2, 3, &mut rng);
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let m2 = Matrix::random_with_rng(2, 3, &mut rng);
    ///
    /// assert_eq!(m1, m2);
    /// ```
    pub fn random_with_rng<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data: Vec<f64> = (0..rows * cols)
            .map(|_| rng.sample(StandardUniform))
            .collect();
        Self::from_raw_parts(data, rows, cols)
    }

    /// Create a matrix with standard normal random values.
    pub fn randn(rows: usize, cols: usize) -> Self {
        Self::randn_with_rng(rows, cols, &mut rand::rng())
    }

    /// Create a matrix with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data: Vec<f64> = (0..rows * cols)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Self::from_raw_parts(data, rows, cols)
    }
}

impl Mtc {
    /// Taylor pair with standard normal value and direction.
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::Mtc;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let a = Mtc::randn_with_rng(3, 2, &mut rng);
    /// assert_eq!(a.shape(), (3, 2));
    /// assert_ne!(a.x(), a.xdot());
    /// ```
    pub fn randn_with_rng<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let x = Matrix::randn_with_rng(rows, cols, rng);
        let xdot = Matrix::randn_with_rng(rows, cols, rng);
        Self::from_parts_unchecked(x, xdot)
    }
}
