pub mod connection;
pub mod provider;

pub use connection::{Connection, ConnectionConfig, QueryResult};
pub use provider::MySqlProvider;
