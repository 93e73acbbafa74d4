pub mod date_codec;
pub mod entities;
pub mod media;
pub mod use_cases;
