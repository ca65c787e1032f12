use std::{
    error::Error,
    fmt::{self, Display},
};

/// Error returned by `margin_loss` when the target isn't a valid class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetErr(pub i32);

impl Display for TargetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a target of +1 or -1, got {}", self.0)
    }
}

impl Error for TargetErr {}

/// The maximum margin (hinge) loss of a single score.
///
/// # Arguments
/// * `score` - The raw network output.
/// * `target` - The class label, either `1` or `-1`.
///
/// # Returns
/// The pair `(loss, grad)` where `grad` is the derivative of the loss with respect to
/// `score`, or an error if `target` is not a class label.
pub fn margin_loss(score: f64, target: i32) -> Result<(f64, f64), TargetErr> {
    if target != 1 && target != -1 {
        return Err(TargetErr(target));
    }

    let target = target as f64;
    let margin = score * target;

    let loss = (1. - margin).max(0.);
    let grad = if margin >= 1. { 0. } else { -target };
    Ok((loss, grad))
}
