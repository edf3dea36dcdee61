pub mod cli_utils;
pub mod file_processor;
pub mod point_matcher;
