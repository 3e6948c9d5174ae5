pub mod analyzer;
pub mod category;
pub mod error;
pub mod export;
pub mod keywords;
pub mod model;
pub mod prepare;
pub mod segmenter;
pub mod store;
pub mod taxonomy;
