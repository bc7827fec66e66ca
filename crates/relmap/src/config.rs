//! Connection configuration.

/// Connection settings handed to [`crate::Database::open`].
///
/// The facade does not interpret these beyond carrying them; each connector
/// reads the fields it needs. An in-memory store needs none of them, a
/// network-backed connector typically needs all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    driver: String,
    host: String,
    port: Option<u16>,
    database: String,
    username: String,
    password: String,
}

impl DatabaseConfig {
    /// Configuration for the named driver.
    #[must_use]
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the login user.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the login password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// The configured driver name.
    #[must_use]
    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    /// The configured host.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host
    }

    /// The configured port, if any.
    #[must_use]
    pub const fn port_number(&self) -> Option<u16> {
        self.port
    }

    /// The configured database name.
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// The configured user.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::new("memory")
            .host("localhost")
            .port(5432)
            .database("weblog")
            .username("app");
        assert_eq!(config.driver_name(), "memory");
        assert_eq!(config.port_number(), Some(5432));
        assert_eq!(config.database_name(), "weblog");
    }
}
