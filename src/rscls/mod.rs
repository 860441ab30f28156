pub mod compressor;
pub mod log_writer;
pub mod rotate_worker;
