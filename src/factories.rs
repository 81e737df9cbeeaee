//! Randomized record builders for tests and local seeding.
//!
//! Every factory fills unset fields with random but valid values, so a bare
//! `UserFactory::new().create(..)` always yields a row that passes the same
//! validation the HTTP layer applies. Override only what a test cares about.

use crate::models::billing::{BillingAddress, NewBillingAddress, Payment};
use crate::models::faq::Faq;
use crate::models::user::{NewUser, Role, User};
use crate::repositories::{BillingRepository, FaqRepository, RepositoryError, UserRepository};
use crate::services::password::{self, HashingError};
use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use serde_json::{json, Value};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "alice", "bruno", "chiara", "dmitri", "elena", "farid", "grace", "hiro", "ines", "jonas",
    "kemal", "lucia", "mateo", "nadia", "oscar", "priya",
];
const LAST_NAMES: &[&str] = &[
    "anders", "baker", "castro", "dubois", "evans", "fischer", "garcia", "hansen", "ito",
    "jensen", "kowalski", "larsen", "moreau", "novak",
];
const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];
const STREETS: &[&str] = &[
    "Maple Street", "Harbor Road", "Station Avenue", "Mill Lane", "Church Way", "Elm Court",
];
const CITIES: &[&str] = &[
    "Springfield", "Riverton", "Lakeside", "Fairview", "Georgetown", "Ashford",
];
const STATES: &[&str] = &["California", "Oregon", "Texas", "Ohio", "Vermont", "Nevada"];
const COUNTRIES: &[&str] = &["United States", "Canada", "Germany", "Japan", "Brazil", "Kenya"];
const WORDS: &[&str] = &[
    "shipping", "refund", "invoice", "account", "delivery", "warranty", "discount", "payment",
];
const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

pub fn fake_email() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}.{}.{}@{}",
        pick(&mut rng, FIRST_NAMES),
        pick(&mut rng, LAST_NAMES),
        short_suffix(),
        pick(&mut rng, DOMAINS)
    )
}

pub fn fake_user_name() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}_{}{}",
        pick(&mut rng, FIRST_NAMES),
        pick(&mut rng, LAST_NAMES),
        rng.gen_range(1..1000)
    )
}

pub fn fake_password() -> String {
    let mut rng = rand::thread_rng();
    (0..12)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET.get(idx).copied().unwrap_or(b'x') as char
        })
        .collect()
}

pub fn fake_phone_number() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "+1-{}-{:03}-{:04}",
        rng.gen_range(201..990),
        rng.gen_range(0..1000),
        rng.gen_range(0..10000)
    )
}

pub fn fake_word() -> String {
    let mut rng = rand::thread_rng();
    pick(&mut rng, WORDS).to_string()
}

/// Plaintext view of a user before hashing.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub email: String,
    pub user_name: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub is_staff: bool,
    pub mobile_number: String,
    pub verification_token: String,
    pub token_creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFactory {
    email: Option<String>,
    user_name: Option<String>,
    password: Option<String>,
    role: Option<Role>,
    is_active: Option<bool>,
    is_staff: Option<bool>,
    mobile_number: Option<String>,
    verification_token: Option<String>,
    token_creation_date: Option<DateTime<Utc>>,
}

impl UserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn is_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = Some(is_staff);
        self
    }

    pub fn mobile_number(mut self, mobile_number: impl Into<String>) -> Self {
        self.mobile_number = Some(mobile_number.into());
        self
    }

    pub fn verification_token(mut self, token: impl Into<String>) -> Self {
        self.verification_token = Some(token.into());
        self
    }

    pub fn token_creation_date(mut self, issued_at: DateTime<Utc>) -> Self {
        self.token_creation_date = Some(issued_at);
        self
    }

    /// Resolves every field, drawing fresh random values for the unset ones.
    pub fn fields(&self) -> UserFields {
        let mut rng = rand::thread_rng();
        UserFields {
            email: self.email.clone().unwrap_or_else(fake_email),
            user_name: self.user_name.clone().unwrap_or_else(fake_user_name),
            password: self.password.clone().unwrap_or_else(fake_password),
            role: self
                .role
                .unwrap_or_else(|| Role::ALL.choose(&mut rng).copied().unwrap_or_default()),
            is_active: self.is_active.unwrap_or_else(|| rng.gen()),
            is_staff: self.is_staff.unwrap_or_else(|| rng.gen()),
            mobile_number: self.mobile_number.clone().unwrap_or_else(fake_phone_number),
            verification_token: self
                .verification_token
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            token_creation_date: self.token_creation_date.unwrap_or_else(Utc::now),
        }
    }

    /// Builds an insertable row. The password is hashed, never stored as given.
    pub fn build(&self) -> Result<NewUser, HashingError> {
        Self::to_new_user(self.fields())
    }

    pub async fn create(&self, users: &dyn UserRepository) -> Result<User, FactoryError> {
        Ok(self.create_with_password(users).await?.0)
    }

    /// Persists the user and hands back the plaintext password alongside it.
    pub async fn create_with_password(
        &self,
        users: &dyn UserRepository,
    ) -> Result<(User, String), FactoryError> {
        let fields = self.fields();
        let password = fields.password.clone();
        let new_user = Self::to_new_user(fields)?;
        let user = users.create_user(&new_user).await?;
        Ok((user, password))
    }

    /// JSON body shaped like a registration request.
    pub fn payload(&self) -> Value {
        let fields = self.fields();
        json!({
            "email": fields.email,
            "user_name": fields.user_name,
            "password": fields.password,
            "role": fields.role,
            "mobile_number": fields.mobile_number,
            "is_active": fields.is_active,
            "is_staff": fields.is_staff,
        })
    }

    fn to_new_user(fields: UserFields) -> Result<NewUser, HashingError> {
        Ok(NewUser {
            email: fields.email,
            user_name: fields.user_name,
            password_hash: password::hash_password(&fields.password)?,
            role: fields.role,
            is_active: fields.is_active,
            is_staff: fields.is_staff,
            mobile_number: Some(fields.mobile_number),
            verification_token: Some(fields.verification_token),
            token_creation_date: fields.token_creation_date,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BillingAddressFactory {
    user_id: Option<i64>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    zip_code: Option<String>,
    is_default: Option<bool>,
}

impl BillingAddressFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn is_default(mut self, is_default: bool) -> Self {
        self.is_default = Some(is_default);
        self
    }

    pub fn build(&self, user_id: i64) -> NewBillingAddress {
        let mut rng = rand::thread_rng();
        NewBillingAddress {
            user_id,
            address: self.address.clone().unwrap_or_else(|| {
                format!("{} {}", rng.gen_range(1..9999), pick(&mut rng, STREETS))
            }),
            city: self
                .city
                .clone()
                .unwrap_or_else(|| pick(&mut rng, CITIES).to_string()),
            state: self
                .state
                .clone()
                .unwrap_or_else(|| pick(&mut rng, STATES).to_string()),
            country: self
                .country
                .clone()
                .unwrap_or_else(|| pick(&mut rng, COUNTRIES).to_string()),
            zip_code: self
                .zip_code
                .clone()
                .unwrap_or_else(|| format!("{:05}", rng.gen_range(0..100_000))),
            is_default: self.is_default.unwrap_or_else(|| rng.gen()),
        }
    }

    /// Persists the address, creating an owning user first when none was given.
    pub async fn create(
        &self,
        users: &dyn UserRepository,
        billing: &dyn BillingRepository,
    ) -> Result<BillingAddress, FactoryError> {
        let user_id = match self.user_id {
            Some(id) => id,
            None => UserFactory::new().create(users).await?.id,
        };
        Ok(billing.create_address(&self.build(user_id)).await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFactory {
    user_id: Option<i64>,
}

impl PaymentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub async fn create(
        &self,
        users: &dyn UserRepository,
        billing: &dyn BillingRepository,
    ) -> Result<Payment, FactoryError> {
        let user_id = match self.user_id {
            Some(id) => id,
            None => UserFactory::new().create(users).await?.id,
        };
        Ok(billing.create_payment(user_id).await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaqFactory {
    question: Option<String>,
    answer: Option<String>,
}

impl FaqFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn build(&self) -> (String, String) {
        (
            self.question.clone().unwrap_or_else(fake_word),
            self.answer.clone().unwrap_or_else(fake_word),
        )
    }

    pub async fn create(&self, faqs: &dyn FaqRepository) -> Result<Faq, FactoryError> {
        let (question, answer) = self.build();
        Ok(faqs.create_faq(&question, &answer).await?)
    }
}
