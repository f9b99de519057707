pub mod configmaps;
pub mod context;
pub mod resolve;
