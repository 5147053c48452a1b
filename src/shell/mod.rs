// Composition root for the offers service.
//
// Responsibilities
// - Read config from environment.
// - Instantiate concrete infrastructure implementations.
// - Wire implementations into the offer service.
// - Spawn background workers (outbox relay).

pub mod config;
pub mod health;
pub mod http;
pub mod state;
pub mod workers;
