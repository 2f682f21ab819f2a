pub mod car;
pub mod moments;
pub mod regression;
pub mod ttest;
