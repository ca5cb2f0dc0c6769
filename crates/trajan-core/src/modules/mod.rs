pub mod gyrate;
pub mod rmsd;
