pub mod analyze;
pub mod describe;
pub mod gyrate;
pub mod rmsd;
