pub mod check;
pub mod checkpoint;
pub mod run;
