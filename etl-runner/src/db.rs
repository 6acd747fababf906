use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::time::Duration;

use crate::service::settings::PostgresSettings;

pub fn connect_options(settings: &PostgresSettings) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(&settings.database)
        .username(&settings.user)
        .application_name("etl-runner");

    match &settings.password {
        Some(password) => options.password(password),
        None => options,
    }
}

pub async fn create_pool(settings: &PostgresSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options(settings))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_carry_settings() {
        let settings = PostgresSettings {
            host: "db.internal".to_string(),
            port: 6543,
            database: "retail".to_string(),
            user: "etl".to_string(),
            password: Some("secret".to_string()),
        };

        let options = connect_options(&settings);

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("retail"));
        assert_eq!(options.get_username(), "etl");
    }
}
