//! Test utilities for integration testing (available with `test-utils` feature).

use std::sync::{Arc, Once};

use axum_test::TestServer;
use wiremock::MockServer;

use crate::config::{Config, StorageBackend, StorageConfig};
use crate::relay::fetch::Upstream;
use crate::storage::InMemoryObjectStore;

/// Smallest PNG prefix `infer` recognises
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R'];
/// JFIF header
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
/// Binary glTF header, version 2
pub const GLB: &[u8] = &[b'g', b'l', b'T', b'F', 2, 0, 0, 0, 0x40, 0, 0, 0];

static CRYPTO_PROVIDER: Once = Once::new();

/// reqwest is built without a default TLS provider, so every test building a client needs one.
pub fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

/// Upstream address pointing at a running mock AI server
pub fn upstream_for(server: &MockServer) -> Upstream {
    let address = server.address();
    Upstream {
        host: address.ip().to_string(),
        port: address.port().to_string(),
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            bucket: "test-bucket".to_string(),
            region: "cn-hangzhou".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn create_test_app() -> (TestServer, InMemoryObjectStore) {
    create_test_app_with_config(create_test_config())
}

/// Build a test server over an in-memory store; the returned store handle shares its contents.
pub fn create_test_app_with_config(config: Config) -> (TestServer, InMemoryObjectStore) {
    install_crypto_provider();

    let store = InMemoryObjectStore::new(config.storage.bucket.clone());
    let app = crate::Application::new_with_store(config, Arc::new(store.clone())).expect("Failed to create application");

    (app.into_test_server(), store)
}
