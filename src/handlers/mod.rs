// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer token + per-route role allow-list)
pub mod public;
pub mod protected;
