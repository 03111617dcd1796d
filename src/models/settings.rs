use serde::{Deserialize, Serialize};

/// Which cards the dashboard home shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCards {
    pub sales: bool,
    pub expenses: bool,
    pub sales_count: bool,
    pub receivables: bool,
    pub payables: bool,
    pub birthdays: bool,
}

impl Default for DashboardCards {
    fn default() -> Self {
        Self {
            sales: true,
            expenses: true,
            sales_count: true,
            receivables: true,
            payables: true,
            birthdays: true,
        }
    }
}

/// Locally persisted branding and dashboard preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub company_name: String,
    /// Base64 data URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub cpf_cnpj: String,
    pub email: String,
    pub phone: String,
    pub pix_key_type: String,
    pub pix_key: String,
    pub dashboard_cards: DashboardCards,
    pub alerts_enabled: bool,
    pub auto_backup: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            company_name: "My Business".to_string(),
            logo: None,
            cpf_cnpj: String::new(),
            email: String::new(),
            phone: String::new(),
            pix_key_type: String::new(),
            pix_key: String::new(),
            dashboard_cards: DashboardCards::default(),
            alerts_enabled: true,
            auto_backup: false,
        }
    }
}
