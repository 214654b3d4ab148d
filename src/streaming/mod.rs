mod handlers;
mod responses;
mod server;
#[cfg(test)]
mod tests;

pub use responses::ApiError;
pub use server::{router, ServerState, StreamServer, StreamServerBuilder};
