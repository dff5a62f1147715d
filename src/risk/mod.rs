pub mod calculator;
pub mod exposure;
pub mod validation;
