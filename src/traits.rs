use alloc::vec::Vec;

pub trait Filter {
    /// Clears the delay memory, as at the first sample of a fresh run.
    fn reset(&mut self);
}

pub trait BasicFilter: Filter {
    /// Returns the polynomial coefficients of the filter transfer function in the z-plane,
    /// for the coefficients set most recently.
    /// The returned array contains the top and bottom coefficients of the rational fraction, ordered in ascending powers.
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>>;
    /// Perform one step of a filter.
    fn step(&mut self, x: f64) -> f64;
}
