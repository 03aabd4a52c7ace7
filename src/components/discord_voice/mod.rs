mod guilds_voice_sessions;
mod songbird_transport;
#[cfg(test)]
mod testing;
mod transport;
mod voice_session;

pub use guilds_voice_sessions::*;
pub use songbird_transport::*;
#[cfg(test)]
pub use testing::*;
pub use transport::*;
pub use voice_session::*;
