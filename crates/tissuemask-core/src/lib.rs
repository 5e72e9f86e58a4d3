pub mod channels;
pub mod config;
pub mod consts;
pub mod error;
pub mod io;
pub mod mask;
pub mod preprocess;
pub mod process;
pub mod qc;
pub mod threshold;
