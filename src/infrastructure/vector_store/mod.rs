mod in_memory;
mod local;

pub use in_memory::InMemoryIndexStore;
pub use local::LocalIndexStore;
