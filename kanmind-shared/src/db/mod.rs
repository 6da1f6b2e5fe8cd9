/// Database layer for KanMind
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Entity types and their queries live in the `models` module; list
/// visibility rules live in `scope`.

pub mod migrations;
pub mod pool;
