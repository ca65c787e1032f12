use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for optimizer constructors.
pub type Result<T> = std::result::Result<T, HyperparamErr>;

/// Error returned by the optimizer constructors whenever a hyperparameter is out of its
/// valid range.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperparamErr {
    pub name: &'static str,
    pub value: f64,
    pub expected: &'static str,
}

impl HyperparamErr {
    /// Checks that `value` satisfies `valid`, naming the hyperparameter on failure.
    pub(super) fn check(
        name: &'static str,
        value: f64,
        expected: &'static str,
        valid: impl FnOnce(f64) -> bool,
    ) -> Result<f64> {
        if valid(value) {
            Ok(value)
        } else {
            Err(Self {
                name,
                value,
                expected,
            })
        }
    }
}

impl Display for HyperparamErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {}: got {}, expected {}",
            self.name, self.value, self.expected
        )
    }
}

impl Error for HyperparamErr {}
