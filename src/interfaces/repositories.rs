pub mod in_memory;
pub mod project;
pub mod sqlx_repo;
