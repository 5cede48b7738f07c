// Filesystem families, one module per supported on-disk format
pub mod f2fs;
pub mod udf;
