pub mod pipeline;
pub mod predict;
pub mod results;
pub mod upload;
