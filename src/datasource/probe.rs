//! Data-source connectivity probes.
//!
//! A probe attempts a real connection with the supplied credentials and
//! closes it immediately. The result is a plain boolean: format errors,
//! unreachable hosts, bad credentials, and timeouts all collapse to
//! `false`. No distinction is retained and the probe never errors — the
//! call sites only branch on success.

use std::time::Duration;

use sqlx::Connection;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use tracing::debug;

use super::DataSourceKind;
use super::descriptor::ConnectionDescriptor;

/// Cap on one connection attempt. Unroutable hosts otherwise hang for the
/// kernel's TCP timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Validate `connection_string` and attempt to connect to the database.
pub async fn probe(
    kind: DataSourceKind,
    connection_string: &str,
    username: &str,
    password: &str,
) -> bool {
    let Some(descriptor) = ConnectionDescriptor::parse(connection_string) else {
        debug!(connection_string, "Invalid connection descriptor format");
        return false;
    };

    let attempt = connect_and_close(kind, &descriptor, username, password);
    match tokio::time::timeout(PROBE_TIMEOUT, attempt).await {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            debug!(host = %descriptor.host, port = descriptor.port, "Probe failed: {err}");
            false
        }
        Err(_) => {
            debug!(host = %descriptor.host, port = descriptor.port, "Probe timed out");
            false
        }
    }
}

async fn connect_and_close(
    kind: DataSourceKind,
    descriptor: &ConnectionDescriptor,
    username: &str,
    password: &str,
) -> Result<(), sqlx::Error> {
    match kind {
        DataSourceKind::MySql => {
            let options = MySqlConnectOptions::new()
                .host(&descriptor.host)
                .port(descriptor.port)
                .database(&descriptor.database)
                .username(username)
                .password(password);
            let conn = MySqlConnection::connect_with(&options).await?;
            conn.close().await
        }
        DataSourceKind::Postgres => {
            let options = PgConnectOptions::new()
                .host(&descriptor.host)
                .port(descriptor.port)
                .database(&descriptor.database)
                .username(username)
                .password(password);
            let conn = PgConnection::connect_with(&options).await?;
            conn.close().await
        }
    }
}
