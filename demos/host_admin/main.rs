//! Host inventory admin
//!
//! Serves hosts, departments and users on `http://127.0.0.1:8000/stark/`.
//! An optional YAML file passed as first argument overrides the site
//! configuration.
//!
//! ```bash
//! RUST_LOG=stark=debug,tower_http=debug cargo run --example host_admin
//! curl 'http://127.0.0.1:8000/stark/app/host/list/?q=web'
//! ```

use serde::{Deserialize, Serialize};
use stark::prelude::*;
use std::fmt;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Host {
    #[serde(default)]
    id: i64,
    hostname: String,
    ip: String,
    depart: i64,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hostname)
    }
}

impl Model for Host {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("app", "host")
                .field(FieldMeta::new("hostname", FieldKind::Text).verbose_name("Hostname"))
                .field(FieldMeta::new("ip", FieldKind::Text).verbose_name("IP"))
                .field(
                    FieldMeta::new("depart", FieldKind::ForeignKey("app.depart".to_string()))
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

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Depart {
    #[serde(default)]
    id: i64,
    title: String,
}

impl fmt::Display for Depart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Model for Depart {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("app", "depart")
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

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserInfo {
    #[serde(default)]
    id: i64,
    name: String,
    email: String,
    gender: i64,
    depart: i64,
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
                .field(FieldMeta::new("email", FieldKind::Text).verbose_name("Email"))
                .field(
                    FieldMeta::new(
                        "gender",
                        FieldKind::Choice(vec![Choice::new(1, "Male"), Choice::new(2, "Female")]),
                    )
                    .verbose_name("Gender"),
                )
                .field(
                    FieldMeta::new("depart", FieldKind::ForeignKey("app.depart".to_string()))
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

fn host(hostname: &str, ip: &str, depart: i64) -> Host {
    Host {
        id: 0,
        hostname: hostname.to_string(),
        ip: ip.to_string(),
        depart,
    }
}

fn user(name: &str, gender: i64, depart: i64) -> UserInfo {
    UserInfo {
        id: 0,
        name: name.to_string(),
        email: format!("{}@example.com", name),
        gender,
        depart,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stark=info,tower_http=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SiteConfig::from_yaml_file(path)?,
        None => SiteConfig::default(),
    };

    let departs = InMemorySource::with_rows(
        ["Operations", "Platform", "Support"].map(|title| Depart {
            id: 0,
            title: title.to_string(),
        }),
    )?;
    let hosts = InMemorySource::with_rows([
        host("web-1", "10.0.0.1", 1),
        host("web-2", "10.0.0.2", 1),
        host("db-1", "10.0.1.1", 2),
        host("cache-1", "10.0.2.1", 2),
        host("mail-1", "10.0.3.1", 3),
    ])?;
    let users = InMemorySource::with_rows([
        user("alice", 2, 1),
        user("bob", 1, 2),
        user("carol", 2, 2),
        user("dave", 1, 3),
    ])?;

    let mut site = StarkSite::with_config(config);
    site.register::<Depart>(departs)?;

    site.register_handler(
        StarkHandler::new(
            hosts.clone(),
            HandlerConfig::new()
                .list_display([
                    display_check(),
                    Column::from("hostname"),
                    "ip".into(),
                    display_edit(),
                    display_del(),
                ])
                .search_list(["hostname__contains", "ip__startswith"])
                .search_group([FacetOption::new("depart").multi()])
                .action_list([BulkAction::multi_delete()])
                .model_form_class(
                    ModelFormSpec::all()
                        .filter("hostname", filters::trim())
                        .validator("ip", validators::ipv4()),
                ),
        ),
        None,
    )?;

    // Read-only view of the same hosts under its own prefix
    site.register_handler(
        StarkHandler::new(
            hosts,
            HandlerConfig::new()
                .list_display(["hostname", "ip"])
                .order_list(["hostname"])
                .has_add_btn(false),
        ),
        Some("readonly"),
    )?;

    site.register_handler(
        StarkHandler::new(
            users,
            HandlerConfig::new()
                .list_display([
                    Column::from("name"),
                    get_choice_text("Gender", "gender"),
                    "email".into(),
                    display_edit(),
                ])
                .search_list(["name__contains", "email__contains"])
                .search_group([FacetOption::new("gender"), FacetOption::new("depart").multi()])
                .per_page_count(2),
        ),
        None,
    )?;

    for path in site.urls()?.paths() {
        tracing::info!(path, "admin route");
    }

    site.serve("127.0.0.1:8000").await
}
