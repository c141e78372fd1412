mod file;

pub use file::FileTextExtractor;
