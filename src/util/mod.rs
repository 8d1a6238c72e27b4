pub mod path;
pub mod testing;

pub use path::{expand_env_vars, expand_path, parent_dir};
