use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::PhoneNumber;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(MemberStatus::Active),
            "inactive" => Some(MemberStatus::Inactive),
            _ => None,
        }
    }
}

/// Member as seen by the dispatcher. Owned by the member directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub status: MemberStatus,
    pub birth_date: Option<NaiveDate>,
    pub group_id: Option<Uuid>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Personalization fields consumed by the body template.
    pub fn template_fields(&self) -> HashMap<&'static str, String> {
        let mut fields = HashMap::new();
        fields.insert("first_name", self.first_name.clone());
        fields.insert("name", self.first_name.clone());
        fields.insert("last_name", self.last_name.clone());
        fields.insert("full_name", self.full_name());
        if let Some(phone) = &self.phone {
            fields.insert("phone", phone.clone());
        }
        fields
    }

    /// Whether the member's birthday falls on `today`. Members born on
    /// 29 February are matched on 28 February in non-leap years.
    pub fn has_birthday_on(&self, today: NaiveDate) -> bool {
        let Some(birth) = self.birth_date else {
            return false;
        };
        if birth.month() == today.month() && birth.day() == today.day() {
            return true;
        }
        let leap_day = birth.month() == 2 && birth.day() == 29;
        leap_day && today.month() == 2 && today.day() == 28 && !is_leap_year(today.year())
    }

    pub fn contact(&self) -> Result<PhoneNumber, String> {
        match self.phone.as_deref().map(str::trim) {
            None | Some("") => Err("no phone number".to_string()),
            Some(raw) => PhoneNumber::parse(raw).ok_or_else(|| "invalid phone number".to_string()),
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(birth: Option<NaiveDate>, phone: Option<&str>) -> Member {
        Member {
            id: Uuid::new_v4(),
            first_name: "Ama".into(),
            last_name: "Mensah".into(),
            phone: phone.map(str::to_string),
            status: MemberStatus::Active,
            birth_date: birth,
            group_id: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birthday_matches_month_and_day() {
        let m = member(Some(date(1990, 7, 14)), None);
        assert!(m.has_birthday_on(date(2024, 7, 14)));
        assert!(!m.has_birthday_on(date(2024, 7, 15)));
        assert!(!member(None, None).has_birthday_on(date(2024, 7, 14)));
    }

    #[test]
    fn leap_day_birthday_falls_back_to_feb_28() {
        let m = member(Some(date(2000, 2, 29)), None);
        assert!(m.has_birthday_on(date(2024, 2, 29)));
        assert!(!m.has_birthday_on(date(2024, 2, 28)));
        assert!(m.has_birthday_on(date(2025, 2, 28)));
    }

    #[test]
    fn contact_reports_missing_and_invalid_numbers() {
        assert_eq!(member(None, None).contact().unwrap_err(), "no phone number");
        assert_eq!(member(None, Some("  ")).contact().unwrap_err(), "no phone number");
        assert_eq!(member(None, Some("call me")).contact().unwrap_err(), "invalid phone number");
        assert_eq!(
            member(None, Some("+233 (24) 123-4567")).contact().unwrap().as_str(),
            "+233241234567"
        );
    }

    #[test]
    fn template_fields_include_full_name() {
        let fields = member(None, Some("0241234567")).template_fields();
        assert_eq!(fields["full_name"], "Ama Mensah");
        assert_eq!(fields["name"], "Ama");
        assert_eq!(fields["phone"], "0241234567");
    }
}
