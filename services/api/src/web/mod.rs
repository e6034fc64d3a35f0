pub mod chat;
pub mod errors;
pub mod fallback;
pub mod health;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the pieces the binary needs to assemble the server.
pub use router::build_router;
pub use state::AppState;
