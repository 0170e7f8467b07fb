pub mod states;
pub mod params;
pub mod engine;
pub mod geometry;
pub mod border;
pub mod interaction;
pub mod integrator;
pub mod observables;
pub mod scenario;
pub mod ensemble;
