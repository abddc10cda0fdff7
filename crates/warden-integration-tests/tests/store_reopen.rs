//! Integration test: file-backed store.
//!
//! Bootstraps a file store with read replicas, writes through the
//! controllers, restarts, and checks that the root org is reused and the
//! encrypted fields still decrypt with the same keys.

use warden_admin::controller::{org, user};
use warden_admin::session::resolve;
use warden_types::commands::{CreateOrg, UpdateDisplayName};

#[tokio::test(flavor = "multi_thread")]
async fn restart_keeps_root_and_data() {
    let path = warden_integration_tests::temp_db("restart");
    let config = warden_integration_tests::config_at(&path.to_string_lossy());
    assert_eq!(config.storage.replicas, 2);

    let (state, root_creds) = warden_integration_tests::bootstrap(&config);
    let root_creds = root_creds.expect("first start creates root");
    let root = resolve(&state, Some(&root_creds.user)).await.expect("root session");

    let cmd = CreateOrg::new("acme", "Alice", "alice@acme.com", "pw").expect("command");
    let acme = org::create(&state, &root, cmd).await.expect("acme");
    let alice = resolve(&state, Some(&acme.owner)).await.expect("alice");
    let cmd = UpdateDisplayName::new(&acme.owner, "Alice Smith").expect("command");
    user::update_display_name(&state, &alice, cmd).await.expect("rename");
    drop(state);

    let (state, again) = warden_integration_tests::bootstrap(&config);
    assert!(again.is_none());
    assert_eq!(state.root_org(), root_creds.org);
    assert_eq!(state.root_user(), root_creds.user);

    let root = resolve(&state, Some(&root_creds.user)).await.expect("root session");
    let read = org::read(&state, &root, &acme.id).await.expect("read acme");
    assert_eq!(read, acme);
    let owner = user::read(&state, &root, &acme.owner).await.expect("read owner");
    assert_eq!(owner.display_name, "Alice Smith");
    assert_eq!(owner.email, "alice@acme.com");

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn wrong_key_cannot_read_users() {
    let path = warden_integration_tests::temp_db("wrong-key");
    let config = warden_integration_tests::config_at(&path.to_string_lossy());
    let (_, root_creds) = warden_integration_tests::bootstrap(&config);
    let root_creds = root_creds.expect("root");

    let conn = warden_db::open(&path).expect("open");
    let wrong = warden_crypto::aead::derive_key("another key").expect("key");
    assert!(warden_db::queries::users::read(&conn, &root_creds.user, &wrong).is_err());

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
