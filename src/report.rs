pub mod io;
pub mod monte_carlo;
pub mod polars_ext;
pub mod test_table;
