// Internal transfer form ("mutation interne")

use std::sync::Arc;

use crate::client::models::TransferRequest;
use crate::form::onboarding::role_for_ou;
use crate::form::{ContractType, ValidationError};
use crate::login::{DigitSource, ExistenceCheck, LoginField, LoginSnapshot, PersonName};
use crate::types::person_from_dn;

/// Move of an existing account to another OU, optionally under a new site.
///
/// The login is re-proposed against the target OU but stays optional: the
/// directory keeps the current one when the request carries none.
pub struct TransferForm<C, D> {
    dn: Option<String>,
    person: PersonName,
    main_ou: String,
    new_ou: String,
    default_ou: String,
    pub department: String,
    pub contract: Option<ContractType>,
    pub office: String,
    pub has_phone: bool,
    pub phone_number: String,
    pub manager_dn: String,
    pub groups: Vec<String>,
    login: Arc<LoginField<C, D>>,
}

impl<C, D> TransferForm<C, D>
where
    C: ExistenceCheck,
    D: DigitSource,
{
    pub fn new(login: Arc<LoginField<C, D>>, default_ou: &str) -> Self {
        let default_ou = default_ou.trim().to_string();
        login.set_scope(&default_ou);
        Self {
            dn: None,
            person: PersonName::default(),
            main_ou: String::new(),
            new_ou: default_ou.clone(),
            default_ou,
            department: String::new(),
            contract: None,
            office: String::new(),
            has_phone: false,
            phone_number: String::new(),
            manager_dn: String::new(),
            groups: Vec::new(),
            login,
        }
    }

    /// Pick the account to move; its common name feeds the login field.
    pub fn select_user(&mut self, dn: &str) {
        let dn = dn.trim();
        self.person = person_from_dn(dn);
        self.dn = Some(dn.to_string()).filter(|d| !d.is_empty());
        self.login.set_names(self.person.given(), self.person.family());
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn person(&self) -> &PersonName {
        &self.person
    }

    pub fn main_ou(&self) -> &str {
        &self.main_ou
    }

    pub fn new_ou(&self) -> &str {
        &self.new_ou
    }

    pub fn login(&self) -> &Arc<LoginField<C, D>> {
        &self.login
    }

    /// Site the account is attached to, e.g. `Paris`.
    pub fn set_main_ou(&mut self, value: &str) {
        self.main_ou = value.trim().to_string();
    }

    pub fn set_new_ou(&mut self, value: &str) {
        self.new_ou = value.trim().to_string();
        self.login.set_scope(&self.new_ou);
    }

    pub fn add_group(&mut self, dn: &str) {
        let dn = dn.trim();
        if !dn.is_empty() && !self.groups.iter().any(|g| g == dn) {
            self.groups.push(dn.to_string());
        }
    }

    pub fn description(&self) -> String {
        format!(
            "{} / {} / {}",
            role_for_ou(&self.new_ou),
            self.department.trim().to_uppercase(),
            self.contract.map(|c| c.as_str()).unwrap_or("")
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new("Transfer form is incomplete");

        if self.dn.is_none() {
            err = err.field("dn", "Select the account to move");
        }
        if self.new_ou.is_empty() {
            err = err.field("new_ou", "This field is required");
        }
        if self.main_ou.is_empty() {
            err = err.field("main_ou", "This field is required");
        }
        if self.has_phone && self.phone_number.trim().is_empty() {
            err = err.field("newPhoneNumber", "Phone number is required when the person has a phone");
        }

        err.into_result()
    }

    pub fn to_request(&self) -> Result<TransferRequest, ValidationError> {
        self.validate()?;
        let login = self.login.snapshot();
        let (login_name, domain) = proposed_login(login);

        Ok(TransferRequest {
            dn: self.dn.clone().unwrap_or_default(),
            full_name: if self.person.is_complete() {
                self.person.full_name()
            } else {
                String::new()
            },
            first_name: self.person.given().to_string(),
            last_name: self.person.family().to_string(),
            new_ou: self.new_ou.clone(),
            main_ou: self.main_ou.clone(),
            new_description: self.description(),
            new_office: self.office.trim().to_string(),
            new_phone_number: if self.has_phone {
                self.phone_number.trim().to_string()
            } else {
                String::new()
            },
            login_name,
            domain,
            manager_dn: self.manager_dn.trim().to_string(),
            member_of: self.groups.clone(),
        })
    }

    pub fn clear(&mut self) {
        self.dn = None;
        self.person = PersonName::default();
        self.main_ou.clear();
        self.new_ou = self.default_ou.clone();
        self.department.clear();
        self.contract = None;
        self.office.clear();
        self.has_phone = false;
        self.phone_number.clear();
        self.manager_dn.clear();
        self.groups.clear();
        self.login.reset();
        self.login.set_scope(&self.new_ou);
    }
}

fn proposed_login(login: LoginSnapshot) -> (String, String) {
    if login.is_ready() {
        (login.handle, login.domain)
    } else {
        (String::new(), String::new())
    }
}
