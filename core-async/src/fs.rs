//! Async filesystem helpers re-exported from tokio.

pub use tokio::fs::{
    create_dir_all, metadata, read, read_dir, read_to_string, remove_dir_all, remove_file,
    rename, write, DirEntry, File, OpenOptions,
};
