pub mod coords;
pub mod output;
pub mod sampler;
pub mod significance;
pub mod tsv_reader;
pub mod types;
