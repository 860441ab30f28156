pub mod rotate_policy;
pub mod writer_state;
