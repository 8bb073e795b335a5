pub mod audit;
pub mod classify;
pub mod collection;
pub mod config;
pub mod materialize;
pub mod normalize;
pub mod order;
pub mod paths;
pub mod pipeline;
pub mod recorder;
pub mod rules;
pub mod scanner;
#[cfg(test)]
mod test_support;
pub mod timestamps;
pub mod util;
pub mod vcs;
pub mod versions;
pub mod warn;
