pub mod disk;
pub mod memory;
pub mod serial;
