pub mod fasta;
pub mod modomics;
pub mod modtable;
pub mod trnascan;
