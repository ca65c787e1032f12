/// A `WeightGen` generates the initial value of every connection weight.
///
/// The topology builder draws exactly one sample per edge, in wiring order, so a
/// deterministic generator yields a reproducible network.
pub trait WeightGen {
    /// Draws the next weight.
    fn sample(&mut self) -> f64;
}

impl<G: WeightGen + ?Sized> WeightGen for &mut G {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

impl<G: WeightGen + ?Sized> WeightGen for Box<G> {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}
