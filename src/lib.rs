//! Automatic configuration of solver parameters.
//!
//! Tunes the parameters of an external solver (a SAT solver, a MIP solver,
//! a local search) for runtime on a set of problem instances:
//!
//! - **Tuner**: An adaptive genetic algorithm whose individuals are solver
//!   configurations. Fitness is measured by actually running the solver,
//!   crossover and mutation probabilities adapt to each individual's
//!   fitness, and the search stops once the population mean stalls.
//! - **Service**: The interface to the experiment registry and the job
//!   execution backend, plus an in-memory implementation.
//! - **Space**: The interface to the representation of configurations, plus
//!   a bounded real/integer parameter vector.
//!
//! # Architecture
//!
//! The engine is single-threaded and deterministic for a given seed. All
//! parallelism lives behind [`service::ExecutionService`], which runs jobs
//! on its own resources; the engine only dispatches and polls.

pub mod error;
pub mod service;
pub mod space;
pub mod tuner;
