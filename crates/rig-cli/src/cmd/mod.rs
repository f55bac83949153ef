pub mod check;
pub mod completions;
pub mod install;
pub mod install_one;
pub mod list;
pub mod validate;
