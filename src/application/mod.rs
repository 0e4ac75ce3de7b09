pub mod aggregator;
pub mod analyzer;
pub mod dto;
pub mod ports;
pub mod services;
