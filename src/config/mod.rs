mod seed;

pub use seed::{SeedError, TreeSeed};
