mod common;

use std::sync::Arc;

use anyhow::Result;
use directory_console::client::models::{DeleteUserRequest, TransferRequest};
use directory_console::error::ClientError;
use directory_console::form::{ContractType, OffboardingForm, OnboardingForm, TransferForm};
use directory_console::login::{AllocatorPolicy, FixedDigits, HandleAllocator, LoginField, LoginStatus};
use directory_console::types::DnSummary;

#[tokio::test]
async fn login_keeps_the_session_cookie() -> Result<()> {
    let server = common::spawn_directory().await?;
    let mut client = server.client();

    assert!(!client.check_auth().await?.authenticated);

    let message = client.login("admin", common::PASSWORD).await?;
    assert_eq!(message, "Login successful");
    assert_eq!(client.auth_token(), Some(common::TOKEN));

    let status = client.check_auth().await?;
    assert!(status.authenticated);
    assert_eq!(status.user.as_deref(), Some("admin"));

    client.logout().await?;
    assert_eq!(client.auth_token(), None);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = common::spawn_directory().await?;
    let mut client = server.client();

    let err = client.login("admin", "nope").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(ref reason) if reason == "Invalid credentials"));
    assert_eq!(client.auth_token(), None);
    Ok(())
}

#[tokio::test]
async fn search_returns_users_managers_and_groups() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.authenticated_client();

    let users = client.search_users("dupont").await?;
    assert_eq!(users.len(), 1);
    let summary = DnSummary::parse(&users[0].dn).unwrap();
    assert_eq!(summary.cn, "Jean Dupont");
    assert_eq!(summary.ou, "administratifs");

    let managers = client.search_managers("Claire Martin").await?;
    assert_eq!(managers[0].cn, "Claire Martin");

    let groups = client.search_groups("RH").await?;
    assert_eq!(groups[0].dn, "CN=RH,OU=GROUPS,DC=example,DC=com");
    Ok(())
}

#[tokio::test]
async fn onboarding_creates_the_account_with_its_login() -> Result<()> {
    let server = common::spawn_directory().await?;
    server.directory.take("j.dupont@example.com");
    let client = server.authenticated_client();

    let allocator = HandleAllocator::with_policy(client.clone(), FixedDigits::new(vec![5]), AllocatorPolicy::default());
    let login = Arc::new(LoginField::new(allocator, vec!["@example.com".to_string()]));
    let mut form = OnboardingForm::new(login, "administratifs");
    form.set_first_name("Jean");
    form.set_last_name("Dupont");
    form.site = "Paris".to_string();
    form.department = "comptabilité".to_string();
    form.contract = Some(ContractType::Cdd);
    form.has_phone = true;
    form.phone_number = "01 23 45 67 89".to_string();
    form.add_group("CN=RH,OU=GROUPS,DC=example,DC=com");

    form.refresh_login().await;
    let request = form.to_request()?;
    let created = client.create_user(&request).await?;

    assert_eq!(created.login_name, "je.dupont");
    assert!(!created.password.is_empty());

    let sent = server.directory.created.lock().unwrap()[0].clone();
    assert_eq!(sent["loginName"], "je.dupont");
    assert_eq!(sent["domain"], "@example.com");
    assert_eq!(sent["new_ou"], "administratifs");
    assert_eq!(sent["newDescription"], "ADMINISTRATIF / COMPTABILITÉ / CDD");
    assert_eq!(sent["newPhoneNumber"], "01 23 45 67 89");
    assert_eq!(sent["memberOf"][0], "CN=RH,OU=GROUPS,DC=example,DC=com");
    Ok(())
}

#[tokio::test]
async fn offboarding_sends_the_retention_period() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.authenticated_client();

    let mut form = OffboardingForm::new();
    form.select_user("CN=Marie Durand,OU=enseignants,OU=Lyon,DC=example,DC=com");
    form.retention_days = "30".to_string();

    let message = client.delete_user(&form.to_request()?).await?;
    assert_eq!(message, "User disabled");

    let sent = server.directory.deleted.lock().unwrap()[0].clone();
    assert_eq!(sent["fullName"], "Marie Durand");
    assert_eq!(sent["retention_days"], 30);
    assert_eq!(sent["retention_minutes"], 0);
    Ok(())
}

#[tokio::test]
async fn account_changes_need_a_session() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.client();

    let request = DeleteUserRequest {
        dn: "CN=Jean Dupont,OU=administratifs,DC=example,DC=com".to_string(),
        full_name: "Jean Dupont".to_string(),
        retention_days: 0,
        retention_minutes: 0,
    };
    let err = client.delete_user(&request).await.unwrap_err();

    assert_eq!(err.error_code(), "UNAUTHORIZED");
    assert!(server.directory.deleted.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn rejected_request_carries_the_server_message() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.authenticated_client();

    let request = DeleteUserRequest {
        dn: String::new(),
        full_name: String::new(),
        retention_days: 0,
        retention_minutes: 0,
    };
    let err = client.delete_user(&request).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.error_code(), "REQUEST_REJECTED");
    assert!(!err.is_transient());
    assert!(err.to_string().contains("Missing dn"));
    Ok(())
}

const MARIE: &str = "CN=Marie Durand,OU=enseignants,OU=Lyon,DC=example,DC=com";

#[tokio::test]
async fn site_lookups_list_the_target_ous() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.authenticated_client();

    assert_eq!(client.user_ou(MARIE).await?.as_deref(), Some("Lyon"));
    assert_eq!(client.user_ou("CN=Sans Site,DC=example,DC=com").await?, None);
    assert_eq!(client.user_site_ous(MARIE).await?, vec!["administratifs", "enseignants"]);
    assert_eq!(client.office365_ous("Paris").await?.len(), 3);
    assert!(client.office365_ous("Nantes").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn transfer_moves_the_account_with_a_login_for_the_target_ou() -> Result<()> {
    let server = common::spawn_directory().await?;
    server.directory.take("m.durand@example.com");
    let client = server.authenticated_client();

    let allocator = HandleAllocator::with_policy(client.clone(), FixedDigits::new(vec![5]), AllocatorPolicy::default());
    let login = Arc::new(LoginField::new(allocator, vec!["@example.com".to_string()]));
    let driver = login.auto_refresh();

    let mut form = TransferForm::new(Arc::clone(&login), "administratifs");
    form.select_user(MARIE);
    form.set_new_ou("administratifs");
    form.set_main_ou(&client.user_ou(MARIE).await?.unwrap_or_default());
    form.department = "scolarité".to_string();
    form.contract = Some(ContractType::Cdi);

    let snapshot = login.settled().await;
    driver.abort();
    assert_eq!(snapshot.status, LoginStatus::Ready);

    let message = client.apply_changes(&form.to_request()?).await?;
    assert_eq!(message, "Modifications appliquées");

    let sent = server.directory.moved.lock().unwrap()[0].clone();
    assert_eq!(sent["dn"], MARIE);
    assert_eq!(sent["new_ou"], "administratifs");
    assert_eq!(sent["main_ou"], "Lyon");
    assert_eq!(sent["loginName"], "ma.durand");
    assert_eq!(sent["newDescription"], "ADMINISTRATIF / SCOLARITÉ / CDI");
    let checks = server.directory.checks.lock().unwrap().clone();
    assert!(checks.iter().all(|(_, ou)| ou == "administratifs"));
    Ok(())
}

#[tokio::test]
async fn transfer_without_site_is_rejected() -> Result<()> {
    let server = common::spawn_directory().await?;
    let client = server.authenticated_client();

    let request = TransferRequest {
        dn: MARIE.to_string(),
        full_name: "Marie Durand".to_string(),
        first_name: "Marie".to_string(),
        last_name: "Durand".to_string(),
        new_ou: "administratifs".to_string(),
        main_ou: String::new(),
        new_description: String::new(),
        new_office: String::new(),
        new_phone_number: String::new(),
        login_name: String::new(),
        domain: String::new(),
        manager_dn: String::new(),
        member_of: Vec::new(),
    };
    let err = client.apply_changes(&request).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert!(err.to_string().contains("DN, new OU et main OU requis"));
    assert!(server.directory.moved.lock().unwrap().is_empty());

    let err = server.client().apply_changes(&request).await.unwrap_err();
    assert_eq!(err.error_code(), "UNAUTHORIZED");
    Ok(())
}
