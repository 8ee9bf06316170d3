pub mod log_parser;
pub mod snapshot;
