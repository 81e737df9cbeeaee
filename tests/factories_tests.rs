use accounts_api::{
    factories::{BillingAddressFactory, FactoryError, FaqFactory, PaymentFactory, UserFactory},
    models::Role,
    repositories::{
        BillingRepository, FaqRepository, RepositoryError, SqliteBillingRepository,
        SqliteFaqRepository, SqliteUserRepository, UserRepository,
    },
    services::password,
    test_utils::test_helpers,
};

async fn repos() -> (SqliteUserRepository, SqliteBillingRepository, SqliteFaqRepository) {
    let pool = test_helpers::create_test_db().await.unwrap();
    (
        SqliteUserRepository::new(pool.clone()),
        SqliteBillingRepository::new(pool.clone()),
        SqliteFaqRepository::new(pool),
    )
}

#[tokio::test]
async fn test_user_factory_persists_hashed_password() {
    let (users, _, _) = repos().await;

    let (user, plain) = UserFactory::new()
        .role(Role::Admin)
        .is_staff(true)
        .create_with_password(&users)
        .await
        .unwrap();

    assert_eq!(user.role, Role::Admin);
    assert!(user.is_staff);
    assert!(password::verify_password(&plain, &user.password_hash));

    let reloaded = users.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(reloaded.id, user.id);
    assert_eq!(reloaded.verification_token, user.verification_token);
}

#[tokio::test]
async fn test_user_factory_duplicate_email() {
    let (users, _, _) = repos().await;

    UserFactory::new()
        .email("same@example.com")
        .create(&users)
        .await
        .unwrap();
    let result = UserFactory::new()
        .email("same@example.com")
        .create(&users)
        .await;

    assert!(matches!(
        result,
        Err(FactoryError::Repository(RepositoryError::AlreadyExists))
    ));
}

#[tokio::test]
async fn test_billing_address_factory_creates_owner() {
    let (users, billing, _) = repos().await;

    let address = BillingAddressFactory::new()
        .is_default(true)
        .create(&users, &billing)
        .await
        .unwrap();

    assert!(users.find_by_id(address.user_id).await.unwrap().is_some());
    let listed = billing.list_addresses(address.user_id).await.unwrap();
    assert_eq!(listed, vec![address]);
}

#[tokio::test]
async fn test_billing_address_for_existing_user() {
    let (users, billing, _) = repos().await;
    let owner = UserFactory::new().create(&users).await.unwrap();

    BillingAddressFactory::new()
        .for_user(owner.id)
        .is_default(false)
        .create(&users, &billing)
        .await
        .unwrap();
    let default = BillingAddressFactory::new()
        .for_user(owner.id)
        .is_default(true)
        .country("Canada")
        .create(&users, &billing)
        .await
        .unwrap();

    let listed = billing.list_addresses(owner.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], default);
}

#[tokio::test]
async fn test_billing_for_unknown_user_is_not_found() {
    let (users, billing, _) = repos().await;

    let result = BillingAddressFactory::new()
        .for_user(4242)
        .create(&users, &billing)
        .await;
    assert!(matches!(
        result,
        Err(FactoryError::Repository(RepositoryError::NotFound))
    ));

    let result = PaymentFactory::new()
        .for_user(4242)
        .create(&users, &billing)
        .await;
    assert!(matches!(
        result,
        Err(FactoryError::Repository(RepositoryError::NotFound))
    ));
}

#[tokio::test]
async fn test_deleting_user_cascades_to_billing() {
    let (users, billing, _) = repos().await;

    let address = BillingAddressFactory::new()
        .create(&users, &billing)
        .await
        .unwrap();
    let payment = PaymentFactory::new()
        .for_user(address.user_id)
        .create(&users, &billing)
        .await
        .unwrap();
    assert_eq!(payment.user_id, address.user_id);

    users.delete_user(address.user_id).await.unwrap();

    assert!(billing.list_addresses(address.user_id).await.unwrap().is_empty());
    assert!(billing.list_payments(address.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_faq_factory() {
    let (_, _, faqs) = repos().await;

    FaqFactory::new().create(&faqs).await.unwrap();
    let custom = FaqFactory::new()
        .question("How long is a token valid?")
        .answer("24 hours")
        .create(&faqs)
        .await
        .unwrap();

    let listed = faqs.list_faqs().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&custom));
}

#[tokio::test]
async fn test_file_database_is_shared_across_pools() {
    let (pool, temp_file) = test_helpers::create_test_db_file().await.unwrap();
    let created = UserFactory::new()
        .create(&SqliteUserRepository::new(pool))
        .await
        .unwrap();

    let url = format!("sqlite://{}", temp_file.path().display());
    let second = accounts_api::db::create_pool(&url).await.unwrap();
    let found = SqliteUserRepository::new(second)
        .find_by_email(&created.email)
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(created.id));
}
