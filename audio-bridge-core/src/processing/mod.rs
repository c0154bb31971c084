pub mod interleave;
pub mod port_set;
pub mod scratch_buffer;
