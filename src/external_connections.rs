use sqlx::PgConnection;

/// A borrowed handle to a live database connection. Driven adapters run their queries
/// against whatever connection the handle lends out.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Provides access to the external systems driven adapters talk to. Business logic only ever
/// sees this trait, so tests can substitute a fake that never reaches a real database.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection for the duration of the returned handle
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
