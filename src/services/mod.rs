pub mod blob;
pub mod day_buckets;
pub mod outcome;
pub mod scoring;
