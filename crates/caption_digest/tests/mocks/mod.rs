pub mod caption_source;
pub mod summarizer;
pub mod title_lookup;
