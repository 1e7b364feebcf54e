// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Test utilities for MySQL-based testing using testcontainers

#![allow(dead_code)]

use drasi_notifier_mysql_command::ConnectionConfig;
use mysql_async::{Conn, OptsBuilder};
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::mysql::Mysql;

pub const TEST_DATABASE: &str = "test";
pub const TEST_USER: &str = "test";
pub const TEST_PASSWORD: &str = "test";

/// A running MySQL container. Stopped when dropped.
pub struct MysqlGuard {
    _container: ContainerAsync<Mysql>,
    pub host: String,
    pub port: u16,
}

impl MysqlGuard {
    /// Notifier configuration pointing at this container
    pub fn connection_config(&self, buffered: bool) -> ConnectionConfig {
        ConnectionConfig::builder()
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_username(TEST_USER)
            .with_password(TEST_PASSWORD)
            .with_database(TEST_DATABASE)
            .with_buffered(buffered)
            .build()
            .expect("valid test config")
    }

    /// Open a direct connection for setup and assertions
    pub async fn conn(&self) -> Conn {
        let opts = OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(TEST_USER))
            .pass(Some(TEST_PASSWORD))
            .db_name(Some(TEST_DATABASE));
        Conn::new(opts).await.expect("Failed to connect to database")
    }
}

/// Start a MySQL container with a `test` user owning the `test` database
#[allow(clippy::unwrap_used)]
pub async fn setup_mysql() -> MysqlGuard {
    let container = Mysql::default()
        .with_env_var("MYSQL_DATABASE", TEST_DATABASE)
        .with_env_var("MYSQL_USER", TEST_USER)
        .with_env_var("MYSQL_PASSWORD", TEST_PASSWORD)
        .with_env_var("MYSQL_ROOT_PASSWORD", "root")
        .start()
        .await
        .unwrap();
    let port = container.get_host_port_ipv4(3306).await.unwrap();

    MysqlGuard {
        _container: container,
        host: "127.0.0.1".to_string(),
        port,
    }
}
