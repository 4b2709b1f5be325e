//! Shared primitive types used across the engine.

/// Identifier of a match row in the match record store.
pub type MatchId = i64;

/// Identifier of a team. Teams live outside this subsystem; the engine
/// only ever compares and forwards these.
pub type TeamId = i64;

/// Identifier of a rostered player.
pub type PlayerId = i64;

/// Simulated game time, in seconds from kickoff.
pub type GameSeconds = u32;
