pub mod green;
pub mod input;
pub mod pak;
