//! Shared models and site builders for the admin integration tests
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod admin_harness;
//! use admin_harness::*;
//! ```

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};
use stark::prelude::*;

// ---------------------------------------------------------------------------
// Host: plain text fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub ip: String,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Model for Host {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("app", "host")
                .field(FieldMeta::new("name", FieldKind::Text).verbose_name("Host name"))
                .field(FieldMeta::new("ip", FieldKind::Text).verbose_name("IP"))
        });
        &META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = pk;
    }
}

pub fn host(name: &str, ip: &str) -> Host {
    Host {
        id: 0,
        name: name.to_string(),
        ip: ip.to_string(),
    }
}

/// Five hosts, three of them named `web-*`, with ids 1..=5
pub fn host_rows() -> Vec<Host> {
    vec![
        host("web-1", "10.0.0.1"),
        host("db-1", "10.0.0.2"),
        host("web-2", "10.0.0.3"),
        host("cache-1", "10.0.0.4"),
        host("web-3", "10.0.0.5"),
    ]
}

// ---------------------------------------------------------------------------
// Department / UserInfo: relation and choice fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(default)]
    pub id: i64,
    pub title: String,
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Model for Department {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("app", "department")
                .field(FieldMeta::new("title", FieldKind::Text).verbose_name("Title"))
        });
        &META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = pk;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub gender: i64,
    pub depart: i64,
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Model for UserInfo {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("app", "userinfo")
                .field(FieldMeta::new("name", FieldKind::Text).verbose_name("Name"))
                .field(
                    FieldMeta::new(
                        "gender",
                        FieldKind::Choice(vec![Choice::new(1, "Male"), Choice::new(2, "Female")]),
                    )
                    .verbose_name("Gender"),
                )
                .field(
                    FieldMeta::new("depart", FieldKind::ForeignKey("app.department".to_string()))
                        .verbose_name("Department"),
                )
        });
        &META
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn set_pk(&mut self, pk: i64) {
        self.id = pk;
    }
}

pub fn department_rows() -> Vec<Department> {
    ["Sales", "Engineering", "Support"]
        .into_iter()
        .map(|title| Department {
            id: 0,
            title: title.to_string(),
        })
        .collect()
}

pub fn user_rows() -> Vec<UserInfo> {
    [("alice", 2, 1), ("bob", 1, 2), ("carol", 2, 2), ("dave", 1, 3)]
        .into_iter()
        .map(|(name, gender, depart)| UserInfo {
            id: 0,
            name: name.to_string(),
            gender,
            depart,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Site builders
// ---------------------------------------------------------------------------

/// Site serving one host handler; returns the URLs and the shared store
pub fn host_site(config: HandlerConfig<Host>) -> (Arc<SiteUrls>, InMemorySource<Host>) {
    host_site_with(config, host_rows())
}

pub fn host_site_with(
    config: HandlerConfig<Host>,
    rows: Vec<Host>,
) -> (Arc<SiteUrls>, InMemorySource<Host>) {
    let hosts = InMemorySource::with_rows(rows).expect("seed hosts");
    let mut site = StarkSite::new();
    site.register_handler(StarkHandler::new(hosts.clone(), config), None)
        .expect("register host handler");
    (site.urls().expect("compile urls"), hosts)
}

/// Site serving user infos, with departments available to relation facets
pub fn user_site(config: HandlerConfig<UserInfo>) -> (Arc<SiteUrls>, InMemorySource<UserInfo>) {
    let users = InMemorySource::with_rows(user_rows()).expect("seed users");
    let departments = InMemorySource::with_rows(department_rows()).expect("seed departments");
    let mut site = StarkSite::new();
    site.add_source::<Department>(departments);
    site.register_handler(StarkHandler::new(users.clone(), config), None)
        .expect("register user handler");
    (site.urls().expect("compile urls"), users)
}

/// POST body from pairs
pub fn form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> QueryDict {
    pairs.into_iter().collect()
}

/// GET a path and return the rendered context
pub async fn render(urls: &Arc<SiteUrls>, path: &str) -> Value {
    let response = urls
        .dispatch(urls.get(path).expect("request"))
        .await
        .expect("dispatch");
    response.context().cloned().expect("rendered response")
}

/// Column of the body rows as plain values
pub fn column(context: &Value, index: usize) -> Vec<Value> {
    context["body_list"]
        .as_array()
        .expect("body_list")
        .iter()
        .map(|row| row[index].clone())
        .collect()
}
