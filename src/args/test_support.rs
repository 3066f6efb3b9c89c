use clap::Parser;

use super::CoordinatorArgs;

/// Default arguments for unit tests, equivalent to an empty command line.
pub fn test_args() -> CoordinatorArgs {
    CoordinatorArgs::parse_from(["loadctl"])
}
