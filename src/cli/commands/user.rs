use std::sync::Arc;

use chrono::Local;
use clap::Subcommand;
use futures::future::try_join3;
use serde_json::json;

use crate::cli::commands::handle::login_field;
use crate::cli::utils::{output_list, output_success};
use crate::cli::{directory_client, OutputFormat};
use crate::config::config;
use crate::form::{ContractType, OffboardingForm, OnboardingForm, TransferForm};
use crate::login::LoginStatus;
use crate::state::load_state;
use crate::types::DnSummary;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Search users, managers and groups")]
    Search {
        #[arg(help = "Search text")]
        query: String,
    },

    #[command(about = "Create an account with an allocated login")]
    Create {
        #[arg(long, help = "Given name")]
        first: String,
        #[arg(long, help = "Family name")]
        last: String,
        #[arg(long, help = "Target organizational unit (defaults to the configured OU)")]
        ou: Option<String>,
        #[arg(long, help = "Site")]
        site: String,
        #[arg(long, default_value = "", help = "Department")]
        department: String,
        #[arg(long, help = "Contract type, e.g. CDI, CDD, STAGIAIRE")]
        contract: Option<ContractType>,
        #[arg(long, default_value = "", help = "Office")]
        office: String,
        #[arg(long, help = "Phone number")]
        phone: Option<String>,
        #[arg(long, help = "Manager DN")]
        manager: Option<String>,
        #[arg(long = "group", help = "Group DN (repeatable)")]
        groups: Vec<String>,
        #[arg(long, help = "Domain suffix, e.g. @example.com")]
        domain: Option<String>,
    },

    #[command(about = "Disable an account and schedule its deletion")]
    Delete {
        #[arg(help = "Distinguished name of the account")]
        dn: String,
        #[arg(long, conflicts_with_all = ["days", "minutes"], help = "Delete without retention")]
        immediate: bool,
        #[arg(long, help = "Retention in days")]
        days: Option<String>,
        #[arg(long, help = "Retention in minutes")]
        minutes: Option<String>,
    },

    #[command(about = "Move an account to another OU or site")]
    Move {
        #[arg(help = "Distinguished name of the account")]
        dn: String,
        #[arg(long, help = "Target organizational unit")]
        ou: String,
        #[arg(long, help = "Main OU (looked up from the account when omitted)")]
        main_ou: Option<String>,
        #[arg(long, help = "Target site; the OU must be one of its OUs")]
        site: Option<String>,
        #[arg(long, default_value = "", help = "Department")]
        department: String,
        #[arg(long, help = "Contract type, e.g. CDI, CDD, STAGIAIRE")]
        contract: Option<ContractType>,
        #[arg(long, default_value = "", help = "Office")]
        office: String,
        #[arg(long, help = "Phone number")]
        phone: Option<String>,
        #[arg(long, help = "Manager DN")]
        manager: Option<String>,
        #[arg(long = "group", help = "Group DN (repeatable)")]
        groups: Vec<String>,
        #[arg(long, help = "Domain suffix, e.g. @example.com")]
        domain: Option<String>,
    },

    #[command(about = "List the OUs available for an account or a site")]
    Ous {
        #[arg(help = "Distinguished name of the account")]
        dn: Option<String>,
        #[arg(long, help = "Site")]
        site: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = load_state()?;
    let client = directory_client(&state)?;

    match cmd {
        UserCommands::Search { query } => {
            let (users, managers, groups) = try_join3(
                client.search_users(&query),
                client.search_managers(&query),
                client.search_groups(&query),
            )
            .await?;

            let user_labels: Vec<String> = users
                .iter()
                .map(|u| match DnSummary::parse(&u.dn) {
                    Some(summary) => format!("{} ({})", summary.cn, summary.ou),
                    None => u.dn.clone(),
                })
                .collect();
            let manager_labels: Vec<String> = managers.iter().map(|m| format!("{} - {}", m.cn, m.dn)).collect();
            let group_labels: Vec<String> = groups.iter().map(|g| g.cn.clone()).collect();

            output_list(&output_format, "users", json!(users), &user_labels)?;
            output_list(&output_format, "managers", json!(managers), &manager_labels)?;
            output_list(&output_format, "groups", json!(groups), &group_labels)
        }

        UserCommands::Create {
            first,
            last,
            ou,
            site,
            department,
            contract,
            office,
            phone,
            manager,
            groups,
            domain,
        } => {
            let field = Arc::new(login_field(client.clone()));
            let driver = field.auto_refresh();
            if let Some(domain) = domain {
                field.select_domain(&domain)?;
            }

            let mut form = OnboardingForm::new(Arc::clone(&field), &config().forms.default_ou);
            form.set_first_name(&first);
            form.set_last_name(&last);
            if let Some(ou) = ou {
                form.set_ou(&ou);
            }
            form.site = site;
            form.department = department;
            form.contract = contract;
            form.office = office;
            form.has_phone = phone.is_some();
            form.phone_number = phone.unwrap_or_default();
            form.manager_dn = manager.unwrap_or_default();
            for group in &groups {
                form.add_group(group);
            }

            let snapshot = field.settled().await;
            driver.abort();
            if let LoginStatus::Failed(reason) = &snapshot.status {
                tracing::warn!("Login allocation failed: {}", reason);
            }

            let request = form.to_request()?;
            let created = client.create_user(&request).await?;

            output_success(
                &output_format,
                &format!(
                    "{} (login {}{}, password {})",
                    created.message, created.login_name, request.domain, created.password
                ),
                Some(json!({ "user": created, "domain": request.domain, "ou": request.new_ou })),
            )
        }

        UserCommands::Delete {
            dn,
            immediate,
            days,
            minutes,
        } => {
            let mut form = OffboardingForm::new();
            form.select_user(&dn);
            form.immediate = immediate;
            form.retention_days = days.unwrap_or_default();
            form.retention_minutes = minutes.unwrap_or_default();

            let request = form.to_request()?;
            let planned = form.retention()?.planned_deletion(Local::now());
            let notice = form.zero_retention_notice();
            if let (Some(notice), OutputFormat::Text) = (notice, &output_format) {
                eprintln!("Warning: {}", notice);
            }
            let message = client.delete_user(&request).await?;

            let text = match &planned {
                Some(at) => format!("{} (deletion planned for {})", message, at),
                None => message.clone(),
            };
            output_success(
                &output_format,
                &text,
                Some(json!({ "dn": request.dn, "plannedDeletion": planned, "notice": notice })),
            )
        }

        UserCommands::Move {
            dn,
            ou,
            main_ou,
            site,
            department,
            contract,
            office,
            phone,
            manager,
            groups,
            domain,
        } => {
            if let Some(site) = &site {
                let allowed = client.office365_ous(site).await?;
                if !allowed.iter().any(|o| o.eq_ignore_ascii_case(ou.trim())) {
                    anyhow::bail!("OU '{}' is not available under site '{}' (expected one of: {})", ou.trim(), site, allowed.join(", "));
                }
            }
            let main_ou = match main_ou {
                Some(main_ou) => main_ou,
                None => client.user_ou(&dn).await?.unwrap_or_default(),
            };

            let field = Arc::new(login_field(client.clone()));
            let driver = field.auto_refresh();
            if let Some(domain) = domain {
                field.select_domain(&domain)?;
            }

            let mut form = TransferForm::new(Arc::clone(&field), &config().forms.default_ou);
            form.select_user(&dn);
            form.set_new_ou(&ou);
            form.set_main_ou(&main_ou);
            form.department = department;
            form.contract = contract;
            form.office = office;
            form.has_phone = phone.is_some();
            form.phone_number = phone.unwrap_or_default();
            form.manager_dn = manager.unwrap_or_default();
            for group in &groups {
                form.add_group(group);
            }

            let snapshot = field.settled().await;
            driver.abort();
            if let LoginStatus::Failed(reason) = &snapshot.status {
                tracing::warn!("No new login proposed, keeping the current one: {}", reason);
            }

            let request = form.to_request()?;
            let message = client.apply_changes(&request).await?;
            let login = (!request.login_name.is_empty()).then(|| format!("{}{}", request.login_name, request.domain));

            let text = match &login {
                Some(login) => format!("{} (now {} in {}/{})", message, login, request.main_ou, request.new_ou),
                None => format!("{} (now in {}/{})", message, request.main_ou, request.new_ou),
            };
            output_success(
                &output_format,
                &text,
                Some(json!({ "dn": request.dn, "main_ou": request.main_ou, "new_ou": request.new_ou, "login": login })),
            )
        }

        UserCommands::Ous { dn, site } => {
            let ous = match (&site, &dn) {
                (Some(site), _) => client.office365_ous(site).await?,
                (None, Some(dn)) => client.user_site_ous(dn).await?,
                (None, None) => Vec::new(),
            };
            output_list(&output_format, "office365_ous", json!(ous), &ous)
        }
    }
}
