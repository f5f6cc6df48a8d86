pub mod logger;
pub mod topo_pipeline;
