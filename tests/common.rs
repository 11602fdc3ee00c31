#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use frame_orders_server::config::{AppConfig, SmtpConfig};
use frame_orders_server::email::{MailError, Mailer, OutgoingEmail};
use frame_orders_server::store::{Filter, Record, RecordStore, StoreConfig, StoreError};
use frame_orders_server::AppState;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TEST_USER_ID: &str = "staff_user_1";
pub const TEST_USER_EMAIL: &str = "staff@example.com";
/// 2100-01-01, so the staff token is identical on every call.
const STAFF_TOKEN_EXP: i64 = 4_102_444_800;

/// A token shaped like the store's user auth tokens, signed with a key the
/// service does not know.
pub fn store_token(user_id: &str, exp: i64) -> String {
    let claims = serde_json::json!({
        "id": user_id,
        "type": "auth",
        "collectionId": "_pb_users_auth_",
        "exp": exp,
        "refreshable": true,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"store-side-user-key"),
    )
    .expect("Failed to encode store token")
}

pub fn staff_token() -> String {
    store_token(TEST_USER_ID, STAFF_TOKEN_EXP)
}

/// Same comparison the store applies: on the string form of the field, which
/// orders `YYYY-MM-DD HH:MM:SS` timestamps correctly.
pub fn filter_matches(filter: &Filter, record: &Record) -> bool {
    match filter {
        Filter::Eq(field, value) => record.get_string(field) == *value,
        Filter::Gte(field, value) => record.get_string(field).as_str() >= value.as_str(),
        Filter::Lte(field, value) => record.get_string(field).as_str() <= value.as_str(),
        Filter::And(parts) => parts.iter().all(|p| filter_matches(p, record)),
        Filter::Or(parts) => parts.iter().any(|p| filter_matches(p, record)),
    }
}

/// In-memory record store that remembers every query it was asked. Knows one
/// signed-in staff user, reachable with [`staff_token`].
#[derive(Default)]
pub struct MockRecordStore {
    collections: Mutex<HashMap<String, Vec<Record>>>,
    queries: Mutex<Vec<(String, String)>>,
    sessions: Mutex<HashMap<String, Record>>,
    auth_calls: AtomicUsize,
    fail_creates: AtomicBool,
    failing_collection: Mutex<Option<String>>,
}

impl MockRecordStore {
    pub fn new() -> Arc<Self> {
        let staff = Record::new(TEST_USER_ID).with("email", TEST_USER_EMAIL);
        Arc::new(Self {
            sessions: Mutex::new(HashMap::from([(staff_token(), staff)])),
            ..Self::default()
        })
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub async fn insert(&self, collection: &str, record: Record) {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub async fn records(&self, collection: &str) -> Vec<Record> {
        let collections = self.collections.lock().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    /// Filter expressions sent for `collection`, in order.
    pub async fn queries_for(&self, collection: &str) -> Vec<String> {
        let queries = self.queries.lock().await;
        queries
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, expression)| expression.clone())
            .collect()
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub async fn fail_queries_on(&self, collection: &str) {
        *self.failing_collection.lock().await = Some(collection.to_string());
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn find_records(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.queries.lock().await.push((
            collection.to_string(),
            filter.map(Filter::to_expression).unwrap_or_default(),
        ));

        if self.failing_collection.lock().await.as_deref() == Some(collection) {
            return Err(StoreError::Status {
                status: 500,
                body: "something went wrong".to_string(),
            });
        }

        let mut records: Vec<Record> = self
            .records(collection)
            .await
            .into_iter()
            .filter(|record| filter.map_or(true, |f| filter_matches(f, record)))
            .collect();

        if sort == "-created" {
            records.sort_by(|a, b| b.get_string("created").cmp(&a.get_string("created")));
        }
        records.truncate(limit);
        Ok(records)
    }

    async fn create_record(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 400,
                body: "failed to create record".to_string(),
            });
        }

        let record = Record {
            id: uuid::Uuid::new_v4().simple().to_string()[..15].to_string(),
            fields,
        };
        self.insert(collection, record.clone()).await;
        Ok(record)
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let mut collections = self.collections.lock().await;
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::Status {
                status: 404,
                body: format!("record {} not found in {}", id, collection),
            })?;

        for (key, value) in fields {
            record.fields.insert(key, value);
        }
        Ok(record.clone())
    }

    async fn authenticate(&self, token: &str) -> Result<Record, StoreError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_collection.lock().await.as_deref() == Some("users") {
            return Err(StoreError::Decode("connection reset".to_string()));
        }
        self.sessions
            .lock()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| StoreError::Status {
                status: 401,
                body: "The request requires valid record authorization token.".to_string(),
            })
    }
}

/// Mailer that keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

/// Mailer whose SMTP server always refuses.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::Transport(
            "554 5.7.1 relay access denied".to_string(),
        ))
    }
}

pub fn views_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("views")
}

pub fn test_config(views_dir: PathBuf, pdf_bin: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        store: StoreConfig {
            url: "http://127.0.0.1:8090".to_string(),
            token: None,
            auth_collection: "users".to_string(),
        },
        pdf_bin: pdf_bin.to_string(),
        views_dir,
        invoice_template: "invoice.preview.html".to_string(),
        public_dir: PathBuf::from("public"),
        smtp: SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1025,
            username: None,
            password: None,
            tls: false,
        },
        sender_address: "orders@example.com".to_string(),
        sender_name: "Frame Orders".to_string(),
        allowed_origins: Vec::new(),
    }
}

pub fn test_state(
    store: Arc<MockRecordStore>,
    mailer: Arc<dyn Mailer + Send + Sync>,
    config: &AppConfig,
) -> web::Data<AppState> {
    web::Data::new(AppState::new_with_parts(store, mailer, config))
}

/// Authorization header as the store's SDK sends it: the bare token.
pub fn auth_header() -> (&'static str, String) {
    ("Authorization", staff_token())
}

/// Executable that "converts" by copying the HTML input to the PDF path.
#[cfg(unix)]
pub fn stub_pdf_bin() -> (tempfile::TempDir, String) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fake-wkhtmltopdf");
    std::fs::write(&path, "#!/bin/sh\ncp \"$3\" \"$4\"\n").expect("Failed to write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod stub");
    let bin = path.display().to_string();
    (dir, bin)
}

pub fn sample_payload() -> Value {
    serde_json::json!({
        "customer": {
            "id": "cust_1",
            "title": "Mrs",
            "firstName": "Jane",
            "surname": "Doe",
            "email": "jane@example.com"
        },
        "order": {
            "orderId": "order_1",
            "orderNo": 17,
            "occasionDate": "2024-06-15",
            "billingAddressLine1": "1 High Street",
            "billingTown": "Bath",
            "billingPostcode": "BA1 1AA"
        },
        "frames": [{
            "size": "A4",
            "frameType": "Oak",
            "glassType": "UV",
            "price": 100,
            "extras": { "mountPrice": "20" }
        }],
        "totals": { "subTotal": 120, "vatRate": 0.2, "vatTotal": 24, "grandTotal": 144 }
    })
}
