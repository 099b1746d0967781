pub mod burden;
pub mod carriers;
pub mod core;
pub mod rewrite;
