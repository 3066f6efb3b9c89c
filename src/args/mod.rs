mod cli;
mod pattern;
#[cfg(test)]
mod test_support;

pub use cli::CoordinatorArgs;
pub use pattern::{parse_pattern, LoadPattern, PatternSpec};
#[cfg(test)]
pub use test_support::test_args;
