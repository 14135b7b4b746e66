pub mod dna;
pub mod process;
