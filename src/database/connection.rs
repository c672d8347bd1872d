use anyhow::Result;
use mysql::prelude::*;
use mysql::{Conn, Opts, OptsBuilder, Value};
use tracing::debug;

/// Where and as whom to connect
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl ConnectionConfig {
    pub fn opts(&self) -> Opts {
        OptsBuilder::new()
            .ip_or_hostname(Some(self.host.as_str()))
            .tcp_port(self.port)
            .user(Some(self.user.as_str()))
            .pass(Some(self.password.as_str()))
            .db_name(self.database.as_deref())
            .into()
    }
}

pub struct Connection {
    conn: Conn,
    connection_id: u32,
    server_version: String,
}

impl Connection {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let mut conn = Conn::new(config.opts())?;

        let connection_id: u32 = conn.query_first("SELECT CONNECTION_ID()")?.unwrap_or(0);
        let server_version: String = conn.query_first("SELECT VERSION()")?.unwrap_or_default();
        debug!(connection_id, %server_version, host = %config.host, "connected");

        Ok(Self {
            conn,
            connection_id,
            server_version,
        })
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn execute_query(&mut self, query: &str) -> Result<QueryResult> {
        let result = self.conn.query_iter(query)?;
        let affected_rows = result.affected_rows();

        let columns: Vec<String> = result
            .columns()
            .as_ref()
            .iter()
            .map(|col| col.name_str().to_string())
            .collect();

        let mut rows = Vec::new();
        for row in result {
            let row = row?;
            let values = (0..row.len())
                .map(|i| match row.get_opt::<Value, usize>(i) {
                    Some(Ok(value)) => format_value(&value),
                    Some(Err(_)) => "ERROR".to_string(),
                    None => "NULL".to_string(),
                })
                .collect();
            rows.push(values);
        }

        Ok(QueryResult {
            columns,
            rows,
            affected_rows,
        })
    }
}

pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub affected_rows: u64,
}

fn format_value(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => {
            format!("{:04}-{:02}-{:02}", year, month, day)
        }
        Value::Date(year, month, day, hour, minute, second, _) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        ),
        Value::Time(neg, _days, hours, minutes, seconds, _micro) => {
            let sign = if *neg { "-" } else { "" };
            format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
        }
    }
}
