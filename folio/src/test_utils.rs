//! Test utilities for integration testing (available with `test-utils` feature).

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum_test::TestServer;
use serde_json::{Value, json};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::{
    AppState,
    config::{AdminConfig, Config, DatabaseConfig, EmailConfig, EmailTransportConfig, PasswordConfig, SessionConfig},
    content::Snapshot,
    db::{
        Backend, InMemoryBackend,
        errors::{DbError, Result},
        models::{
            contact_messages::{ContactMessage, ContactMessageCreate, ContactMessageFilter, ContactMessageStatus},
            email_notifications::{EmailNotification, EmailNotificationCreate, EmailNotificationFilter, NotificationResolution},
        },
    },
    email::EmailService,
    notifications::Mailer,
    storage::{FileUploads, MemoryObjectStore},
};

pub const TEST_ADMIN_EMAIL: &str = "owner@example.com";
pub const TEST_ADMIN_PASSWORD: &str = "correct horse battery staple";

/// An [`InMemoryBackend`] that can be made unreachable or slow.
///
/// `set_available(false)` fails every call, `ping` included. `fail_reads(true)` leaves `ping`
/// answering but fails snapshot reads, as when the server drops a connection mid-load.
/// `hold_next_upsert` / `hold_next_read` park the next such call until [`FlakyBackend::release`].
#[derive(Default)]
pub struct FlakyBackend {
    inner: InMemoryBackend,
    unavailable: AtomicBool,
    failing_reads: AtomicBool,
    hold_upsert: AtomicBool,
    hold_read: AtomicBool,
    held: Notify,
    released: Notify,
}

impl FlakyBackend {
    pub fn new(inner: InMemoryBackend) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn hold_next_upsert(&self) {
        self.hold_upsert.store(true, Ordering::SeqCst);
    }

    pub fn hold_next_read(&self) {
        self.hold_read.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held call has been parked.
    pub async fn wait_until_held(&self) {
        self.held.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }

    async fn pass_gate(&self, gate: &AtomicBool) {
        if gate.swap(false, Ordering::SeqCst) {
            self.held.notify_one();
            self.released.notified().await;
        }
    }

    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Other(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Backend for FlakyBackend {
    async fn ping(&self) -> Result<()> {
        self.check()
    }

    async fn load_snapshot(&self, owner_key: &str) -> Result<Option<Value>> {
        self.check()?;
        self.pass_gate(&self.hold_read).await;
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(DbError::Other(anyhow::anyhow!("connection reset by peer")));
        }
        self.inner.load_snapshot(owner_key).await
    }

    async fn upsert_snapshot(&self, owner_key: &str, snapshot: &Snapshot) -> Result<i64> {
        self.check()?;
        self.pass_gate(&self.hold_upsert).await;
        self.inner.upsert_snapshot(owner_key, snapshot).await
    }

    async fn insert_contact_message(&self, request: &ContactMessageCreate) -> Result<ContactMessage> {
        self.check()?;
        self.inner.insert_contact_message(request).await
    }

    async fn latest_contact_message_id(&self, email: &str) -> Result<Option<Uuid>> {
        self.check()?;
        self.inner.latest_contact_message_id(email).await
    }

    async fn list_contact_messages(&self, filter: &ContactMessageFilter) -> Result<Vec<ContactMessage>> {
        self.check()?;
        self.inner.list_contact_messages(filter).await
    }

    async fn update_contact_message_status(&self, id: Uuid, status: ContactMessageStatus) -> Result<ContactMessage> {
        self.check()?;
        self.inner.update_contact_message_status(id, status).await
    }

    async fn insert_notification(&self, request: &EmailNotificationCreate) -> Result<EmailNotification> {
        self.check()?;
        self.inner.insert_notification(request).await
    }

    async fn resolve_notification(&self, id: Uuid, resolution: NotificationResolution) -> Result<EmailNotification> {
        self.check()?;
        self.inner.resolve_notification(id, resolution).await
    }

    async fn list_notifications(&self, filter: &EmailNotificationFilter) -> Result<Vec<EmailNotification>> {
        self.check()?;
        self.inner.list_notifications(filter).await
    }
}

/// Config for tests: in-memory database, cache and email files under `dir`, no delivery delay,
/// fast argon2 parameters and a non-secure cookie.
pub fn create_test_config(dir: &Path) -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        admin: AdminConfig {
            email: Some(TEST_ADMIN_EMAIL.to_string()),
            password: Some(TEST_ADMIN_PASSWORD.to_string()),
            password_hash: None,
        },
        email: EmailConfig {
            transport: EmailTransportConfig::File {
                path: dir.join("emails").to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        ..Default::default()
    };

    config.auth.password = PasswordConfig {
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    };
    config.auth.session = SessionConfig {
        cookie_secure: false,
        ..Default::default()
    };
    config.sync.cache_dir = dir.join("cache");
    // Long enough that nothing saves behind a test's back
    config.sync.save_debounce = Duration::from_secs(600);
    config.notifications.delivery_delay = Duration::ZERO;
    config.notifications.recipient = "inbox@example.com".to_string();
    config
}

/// A running test server over in-memory services.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub backend: Arc<dyn Backend>,
    /// Object store behind the uploads; a detached store when storage is disabled
    pub objects: Arc<MemoryObjectStore>,
    /// Holds the cache and email directories
    pub dir: tempfile::TempDir,
}

/// Test app with an in-memory database and in-memory object storage.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(Arc::new(InMemoryBackend::new()), Some(Arc::new(MemoryObjectStore::new()))).await
}

/// Test app over `backend`; `objects: None` disables object storage.
pub async fn create_test_app_with(backend: Arc<dyn Backend>, objects: Option<Arc<MemoryObjectStore>>) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(dir.path());

    let uploads = FileUploads::new(
        objects.clone().map(|store| store as Arc<dyn crate::storage::ObjectStore>),
        &config.storage,
        config.uploads.clone(),
    );
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&config.email).expect("Failed to create email service"));

    let state = crate::create_app_state(config, backend.clone(), uploads, mailer)
        .await
        .expect("Failed to create app state");
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        backend,
        objects: objects.unwrap_or_default(),
        dir,
    }
}

/// Log in as the test admin and return the `name=token` cookie pair.
pub async fn login_cookie(server: &TestServer) -> String {
    let response = server
        .post("/authentication/login")
        .json(&json!({ "email": TEST_ADMIN_EMAIL, "password": TEST_ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();

    let header = response
        .headers()
        .get("set-cookie")
        .expect("login sets a cookie")
        .to_str()
        .expect("cookie is ascii")
        .to_string();
    header.split(';').next().unwrap_or_default().to_string()
}
