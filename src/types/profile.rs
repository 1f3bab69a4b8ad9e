//! Customer profile data structures for credit default assessment

use crate::error::PredictError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted customer age
pub const MIN_AGE: u32 = 18;
/// Highest accepted customer age
pub const MAX_AGE: u32 = 80;
/// Late payments are counted over a six month window
pub const MAX_LATE_PAYMENTS: u32 = 6;
/// Longest payment delay (in months) the model was trained on
pub const MAX_DELAY_MONTHS: u32 = 10;

/// Normalize a categorical label for lenient parsing ("High School", "high-school", "HIGH_SCHOOL").
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Sex (1 = male, 2 = female)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Integer code used during training
    pub fn code(self) -> u8 {
        match self {
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Education level (1 = graduate school, 2 = university, 3 = high school, 4 = others)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Education {
    #[default]
    GraduateSchool,
    University,
    HighSchool,
    Others,
}

impl Education {
    pub const ALL: [Education; 4] = [
        Education::GraduateSchool,
        Education::University,
        Education::HighSchool,
        Education::Others,
    ];

    /// Integer code used during training
    pub fn code(self) -> u8 {
        match self {
            Education::GraduateSchool => 1,
            Education::University => 2,
            Education::HighSchool => 3,
            Education::Others => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Education::GraduateSchool => "Graduate School",
            Education::University => "University",
            Education::HighSchool => "High School",
            Education::Others => "Others",
        }
    }
}

/// Marital status (1 = married, 2 = single, 3 = others)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaritalStatus {
    #[default]
    Married,
    Single,
    Others,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 3] = [
        MaritalStatus::Married,
        MaritalStatus::Single,
        MaritalStatus::Others,
    ];

    /// Integer code used during training
    pub fn code(self) -> u8 {
        match self {
            MaritalStatus::Married => 1,
            MaritalStatus::Single => 2,
            MaritalStatus::Others => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaritalStatus::Married => "Married",
            MaritalStatus::Single => "Single",
            MaritalStatus::Others => "Others",
        }
    }
}

macro_rules! label_parsing {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_label(s);
                $ty::ALL
                    .into_iter()
                    .find(|v| normalize_label(v.label()) == wanted)
                    .ok_or_else(|| {
                        let choices: Vec<&str> = $ty::ALL.iter().map(|v| v.label()).collect();
                        format!(
                            "unknown {} '{}' (expected one of: {})",
                            $what,
                            s,
                            choices.join(", ")
                        )
                    })
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

label_parsing!(Sex, "sex");
label_parsing!(Education, "education level");
label_parsing!(MaritalStatus, "marital status");

/// Raw customer attributes entered for a single assessment
///
/// Omitted fields take the dashboard defaults; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomerProfile {
    /// Sex
    pub sex: Sex,

    /// Education level
    pub education: Education,

    /// Marital status
    #[serde(alias = "marital_status")]
    pub marriage: MaritalStatus,

    /// Age in years
    pub age: u32,

    /// Credit limit (NT$)
    #[serde(alias = "limit_bal")]
    pub credit_limit: f64,

    /// Average bill amount over the last 6 months
    #[serde(alias = "avg_bill")]
    pub avg_bill_amount: f64,

    /// Average payment amount over the last 6 months
    #[serde(alias = "avg_payment")]
    pub avg_payment_amount: f64,

    /// Number of late payments in the last 6 months
    #[serde(alias = "late_payments")]
    pub late_payment_count: u32,

    /// Longest payment delay in months
    #[serde(alias = "max_delay")]
    pub max_delay_months: u32,
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            sex: Sex::Male,
            education: Education::GraduateSchool,
            marriage: MaritalStatus::Married,
            age: 35,
            credit_limit: 200_000.0,
            avg_bill_amount: 50_000.0,
            avg_payment_amount: 40_000.0,
            late_payment_count: 1,
            max_delay_months: 1,
        }
    }
}

impl CustomerProfile {
    /// Check every field against the ranges the model was trained on.
    pub fn validate(&self) -> Result<(), PredictError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(PredictError::InvalidProfile(format!(
                "age {} outside [{}, {}]",
                self.age, MIN_AGE, MAX_AGE
            )));
        }
        if self.late_payment_count > MAX_LATE_PAYMENTS {
            return Err(PredictError::InvalidProfile(format!(
                "late payment count {} exceeds {}",
                self.late_payment_count, MAX_LATE_PAYMENTS
            )));
        }
        if self.max_delay_months > MAX_DELAY_MONTHS {
            return Err(PredictError::InvalidProfile(format!(
                "max delay {} months exceeds {}",
                self.max_delay_months, MAX_DELAY_MONTHS
            )));
        }

        let amounts = [
            ("credit limit", self.credit_limit),
            ("average bill amount", self.avg_bill_amount),
            ("average payment amount", self.avg_payment_amount),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(PredictError::InvalidProfile(format!(
                    "{} must be a non-negative amount, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Payments relative to bills; the +1 keeps a zero bill well-defined.
    pub fn payment_to_bill_ratio(&self) -> f64 {
        self.avg_payment_amount / (self.avg_bill_amount + 1.0)
    }
}
