pub mod defect;
pub mod detection;
pub mod errors;
pub mod history;
pub mod model;
pub mod reason;
pub mod verdict;
