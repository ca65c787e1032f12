use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for the different instances of `RandWeightGen` generators.
pub type Result<T> = std::result::Result<T, RandErr>;

/// A weight distribution that can't be sampled from, together with the parameters that
/// were asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum RandErr {
    Uniform { low: f64, high: f64, reason: String },
    Normal { mean: f64, std_dev: f64, reason: String },
}

impl Display for RandErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform { low, high, reason } => {
                write!(f, "can't draw uniform weights from [{low}, {high}): {reason}")
            }
            Self::Normal {
                mean,
                std_dev,
                reason,
            } => write!(
                f,
                "can't draw normal weights with mean {mean} and std_dev {std_dev}: {reason}"
            ),
        }
    }
}

impl Error for RandErr {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_failing_distribution() {
        let err = RandErr::Uniform {
            low: 1.,
            high: -1.,
            reason: "empty range".into(),
        };
        assert_eq!(
            err.to_string(),
            "can't draw uniform weights from [1, -1): empty range"
        );
    }
}
