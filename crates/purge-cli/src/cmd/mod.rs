pub mod check;
pub mod config;
pub mod roleless;
pub mod run;
