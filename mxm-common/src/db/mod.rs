//! Database access: connections, table schemas and the row model

pub mod init;
pub mod models;
pub mod schema;
pub mod table_schemas;

pub use init::*;
pub use models::*;
pub use schema::*;
pub use table_schemas::*;
