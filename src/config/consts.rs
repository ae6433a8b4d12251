/// Absolute maximum number of iterations of one update on one unit (also the `"*"` limit)
pub const HARD_ITERATION_CAP: u32 = 999;
/// Iteration indexes after which a textual snapshot is taken for the next change check
pub const CHECKPOINTS: [u32; 7] = [3, 10, 25, 50, 100, 200, 500];
/// Name given to updates whose script text was supplied inline
pub const DEFAULT_UPDATE_NAME: &str = "DIRECTUPDATE";
/// Iterations run when an update entry does not say
pub const DEFAULT_ITERATIONS: u32 = 1;
