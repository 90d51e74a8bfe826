use crate::problem::vrptw::VRPTWInstance;

pub mod solomon_reader;
pub mod solution_writer;

pub fn load_instance(path: impl Into<String>) -> anyhow::Result<VRPTWInstance> {
    solomon_reader::load_instance(path)
}
