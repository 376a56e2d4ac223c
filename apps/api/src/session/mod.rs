// Per-session résumé state: the controller state machine, the in-memory store that owns
// one controller per session, and the HTTP handlers that drive them.

pub mod controller;
pub mod handlers;
pub mod store;
