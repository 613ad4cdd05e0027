/// The VB20 positive accumulator
pub mod vb20;
