// Account creation form ("entrée collaborateur")

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::models::CreateUserRequest;
use crate::form::ValidationError;
use crate::login::{DigitSource, ExistenceCheck, LoginField, LoginSnapshot, Refresh};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    Cdi,
    Cdd,
    Cddu,
    Apprentice,
    Temp,
    Intern,
}

impl ContractType {
    pub const ALL: [ContractType; 6] = [
        ContractType::Cdi,
        ContractType::Cdd,
        ContractType::Cddu,
        ContractType::Apprentice,
        ContractType::Temp,
        ContractType::Intern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Cddu => "CDDU",
            ContractType::Apprentice => "ALTERNANT / APPRENTI",
            ContractType::Temp => "INTERIMAIRE",
            ContractType::Intern => "STAGIAIRE",
        }
    }
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown contract type '{}', expected one of: {}", wanted, allowed.join(", "))
            })
    }
}

/// Role label shown in the description for a target OU.
pub fn role_for_ou(ou: &str) -> &'static str {
    match ou.trim().to_lowercase().as_str() {
        "administratifs" => "ADMINISTRATIF",
        "enseignants" => "ENSEIGNANT",
        "vacataires" => "VACATAIRE",
        "honorariat" => "HONORAIRE",
        _ => "",
    }
}

/// State of the onboarding form.
///
/// Name and OU setters forward to the embedded [`LoginField`] so the
/// proposed login follows every keystroke; the caller decides when to run
/// [`OnboardingForm::refresh_login`].
pub struct OnboardingForm<C, D> {
    first_name: String,
    last_name: String,
    ou: String,
    default_ou: String,
    pub site: String,
    pub department: String,
    pub contract: Option<ContractType>,
    pub office: String,
    pub has_phone: bool,
    pub phone_number: String,
    pub manager_dn: String,
    pub groups: Vec<String>,
    login: Arc<LoginField<C, D>>,
}

impl<C, D> OnboardingForm<C, D>
where
    C: ExistenceCheck,
    D: DigitSource,
{
    pub fn new(login: Arc<LoginField<C, D>>, default_ou: &str) -> Self {
        let default_ou = default_ou.trim().to_string();
        login.set_scope(&default_ou);
        Self {
            first_name: String::new(),
            last_name: String::new(),
            ou: default_ou.clone(),
            default_ou,
            site: String::new(),
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

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn ou(&self) -> &str {
        &self.ou
    }

    pub fn login(&self) -> &Arc<LoginField<C, D>> {
        &self.login
    }

    pub fn set_first_name(&mut self, value: &str) {
        self.first_name = value.trim().to_string();
        self.login.set_names(&self.first_name, &self.last_name);
    }

    pub fn set_last_name(&mut self, value: &str) {
        self.last_name = value.trim().to_string();
        self.login.set_names(&self.first_name, &self.last_name);
    }

    pub fn set_ou(&mut self, value: &str) {
        self.ou = value.trim().to_string();
        self.login.set_scope(&self.ou);
    }

    /// Add a group DN, ignoring duplicates and blanks.
    pub fn add_group(&mut self, dn: &str) {
        let dn = dn.trim();
        if !dn.is_empty() && !self.groups.iter().any(|g| g == dn) {
            self.groups.push(dn.to_string());
        }
    }

    pub async fn refresh_login(&self) -> Refresh {
        self.login.refresh().await
    }

    /// `ROLE / DEPARTMENT / CONTRACT`, role derived from the target OU.
    pub fn description(&self) -> String {
        format!(
            "{} / {} / {}",
            role_for_ou(&self.ou),
            self.department.trim().to_uppercase(),
            self.contract.map(|c| c.as_str()).unwrap_or("")
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new("Onboarding form is incomplete");

        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("new_ou", &self.ou),
            ("site", &self.site),
        ] {
            if value.trim().is_empty() {
                err = err.field(field, "This field is required");
            }
        }

        if self.has_phone && self.phone_number.trim().is_empty() {
            err = err.field("newPhoneNumber", "Phone number is required when the person has a phone");
        }

        let login = self.login.snapshot();
        if !login.is_ready() {
            err = err.field("loginName", login_problem(&login));
        }

        err.into_result()
    }

    pub fn to_request(&self) -> Result<CreateUserRequest, ValidationError> {
        self.validate()?;
        let login = self.login.snapshot();

        Ok(CreateUserRequest {
            full_name: format!("{} {}", self.first_name, self.last_name),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            new_ou: self.ou.clone(),
            new_description: self.description(),
            new_office: self.office.trim().to_string(),
            new_phone_number: if self.has_phone {
                self.phone_number.trim().to_string()
            } else {
                String::new()
            },
            login_name: login.handle,
            domain: login.domain,
            manager_dn: self.manager_dn.trim().to_string(),
            member_of: self.groups.clone(),
            site: self.site.trim().to_string(),
        })
    }

    /// Reset every field to its default and invalidate the login.
    pub fn clear(&mut self) {
        self.first_name.clear();
        self.last_name.clear();
        self.ou = self.default_ou.clone();
        self.site.clear();
        self.department.clear();
        self.contract = None;
        self.office.clear();
        self.has_phone = false;
        self.phone_number.clear();
        self.manager_dn.clear();
        self.groups.clear();
        self.login.reset();
        self.login.set_scope(&self.ou);
    }
}

fn login_problem(login: &LoginSnapshot) -> String {
    use crate::login::LoginStatus;

    match &login.status {
        LoginStatus::Failed(reason) => format!("Login could not be allocated: {}", reason),
        LoginStatus::Pending => "Login allocation has not completed".to_string(),
        _ => "Login requires first name, last name and OU".to_string(),
    }
}
