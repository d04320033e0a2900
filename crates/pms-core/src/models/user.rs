use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Tenant,
    Landlord,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Tenant => "tenant",
            UserType::Landlord => "landlord",
            UserType::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Tenant => write!(f, "Tenant"),
            UserType::Landlord => write!(f, "Landlord"),
            UserType::Admin => write!(f, "Admin"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tenant" => Ok(UserType::Tenant),
            "landlord" => Ok(UserType::Landlord),
            "admin" => Ok(UserType::Admin),
            other => Err(format!("unknown user type: {}", other)),
        }
    }
}

/// Sign-up form, sent as multipart to `api/register/`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
}

impl Registration {
    /// Field names and values in the order the backend's form expects.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.clone()),
            ("password", self.password.clone()),
            ("first_name", self.first_name.clone()),
            ("last_name", self.last_name.clone()),
            ("user_type", self.user_type.as_str().to_string()),
        ]
    }
}

/// User as embedded in other resources (notification sender, tenant profile).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
}

impl UserSummary {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_serde() {
        let parsed: UserType = serde_json::from_str("\"landlord\"").unwrap();
        assert_eq!(parsed, UserType::Landlord);
        assert_eq!(serde_json::to_string(&UserType::Tenant).unwrap(), "\"tenant\"");
        assert_eq!("Tenant".parse::<UserType>(), Ok(UserType::Tenant));
        assert!("owner".parse::<UserType>().is_err());
    }

    #[test]
    fn test_registration_form_fields() {
        let reg = Registration {
            email: "new@example.com".to_string(),
            password: "pw".to_string(),
            first_name: "Wanjiru".to_string(),
            last_name: "Mwangi".to_string(),
            user_type: UserType::Tenant,
        };
        let fields = reg.form_fields();
        let names: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["email", "password", "first_name", "last_name", "user_type"]);
        assert_eq!(fields[4].1, "tenant");
    }

    #[test]
    fn test_user_summary_full_name_falls_back_to_email() {
        let user = UserSummary {
            email: "x@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(user.full_name(), "x@example.com");
    }
}
