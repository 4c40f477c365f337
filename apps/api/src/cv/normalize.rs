//! CV normalization: reconciles the loose JSON shapes clients send into one
//! typed `CvDocument`.
//!
//! Clients (the editor, the importer, older app versions) disagree on key
//! casing (`personalInfo` vs `personal_info`), send `null` for empty fields,
//! strings where lists are expected and bare strings where objects are
//! expected. All of that is resolved here so the scorer only sees one shape.
//! camelCase wins when both spellings carry a non-empty value.

use serde_json::{Map, Value};

use crate::models::cv::{
    CertificationItem, CvDocument, EducationItem, ExperienceItem, LanguageItem, PersonalInfo,
    ProjectItem, PublicationItem,
};

/// Builds a `CvDocument` from any JSON value. Never fails.
pub fn normalize_cv(raw: &Value) -> CvDocument {
    let Some(obj) = raw.as_object() else {
        return CvDocument::default();
    };

    CvDocument {
        personal_info: personal_info(obj),
        summary: text_field(obj, &["summary", "professionalSummary", "professional_summary"]),
        experience: list_field(obj, &["experience", "experiences", "workExperience", "work_experience"])
            .iter()
            .filter_map(experience_item)
            .collect(),
        education: list_field(obj, &["education"])
            .iter()
            .filter_map(education_item)
            .collect(),
        skills: string_list(pick(obj, &["skills"]), ','),
        projects: list_field(obj, &["projects"])
            .iter()
            .filter_map(|v| named_item(v, &["name", "title"]))
            .map(|(name, o)| ProjectItem {
                name,
                description: o.map(|o| text_field(o, &["description", "details"])).unwrap_or_default(),
                link: o.map(|o| text_field(o, &["link", "url"])).unwrap_or_default(),
            })
            .collect(),
        languages: list_field(obj, &["languages"])
            .iter()
            .filter_map(|v| named_item(v, &["language", "name"]))
            .map(|(language, o)| LanguageItem {
                language,
                level: o.map(|o| text_field(o, &["level", "proficiency"])).unwrap_or_default(),
            })
            .collect(),
        certifications: list_field(obj, &["certifications"])
            .iter()
            .filter_map(|v| named_item(v, &["name", "title"]))
            .map(|(name, o)| CertificationItem {
                name,
                issuer: o.map(|o| text_field(o, &["issuer", "organization"])).unwrap_or_default(),
                year: o.map(|o| text_field(o, &["year", "date"])).unwrap_or_default(),
            })
            .collect(),
        publications: list_field(obj, &["publications"])
            .iter()
            .filter_map(|v| named_item(v, &["title", "name"]))
            .map(|(title, o)| PublicationItem {
                title,
                venue: o.map(|o| text_field(o, &["venue", "publisher"])).unwrap_or_default(),
                year: o.map(|o| text_field(o, &["year", "date"])).unwrap_or_default(),
            })
            .collect(),
    }
}

fn personal_info(obj: &Map<String, Value>) -> PersonalInfo {
    let camel = obj.get("personalInfo").and_then(Value::as_object);
    let snake = obj.get("personal_info").and_then(Value::as_object);

    // Field by field: the camelCase block wins, the snake_case block fills gaps.
    let field = |keys: &[&str]| -> String {
        [camel, snake]
            .into_iter()
            .flatten()
            .map(|o| text_field(o, keys))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    };

    PersonalInfo {
        full_name: field(&["fullName", "full_name", "name"]),
        email: field(&["email"]),
        phone: field(&["phone", "phoneNumber", "phone_number"]),
        location: field(&["location", "city"]),
        linkedin: field(&["linkedin", "linkedIn", "linkedin_url"]),
        website: field(&["website", "portfolio", "url"]),
    }
}

fn experience_item(value: &Value) -> Option<ExperienceItem> {
    let o = value.as_object()?;
    Some(ExperienceItem {
        job_title: text_field(o, &["jobTitle", "job_title", "title", "role"]),
        company: text_field(o, &["company", "employer"]),
        location: text_field(o, &["location"]),
        start_date: text_field(o, &["startDate", "start_date"]),
        end_date: text_field(o, &["endDate", "end_date"]),
        is_current: bool_field(o, &["isCurrent", "is_current", "current"]),
        bullets: string_list(pick(o, &["bullets", "achievements", "responsibilities"]), '\n'),
    })
}

fn education_item(value: &Value) -> Option<EducationItem> {
    let o = value.as_object()?;
    Some(EducationItem {
        degree: text_field(o, &["degree", "qualification"]),
        school: text_field(o, &["school", "institution", "university"]),
        year: text_field(o, &["year", "graduationYear", "graduation_year", "endDate", "end_date"]),
        details: text_field(o, &["details", "description"]),
    })
}

/// Items that may be either `"Name"` or `{ "name": "Name", ... }`.
fn named_item<'a>(
    value: &'a Value,
    name_keys: &[&str],
) -> Option<(String, Option<&'a Map<String, Value>>)> {
    match value {
        Value::Object(o) => Some((text_field(o, name_keys), Some(o))),
        other => scalar_text(other).map(|s| (s, None)),
    }
}

/// First key present with a non-null value.
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null() && scalar_text(v).map_or(true, |s| !s.is_empty()))
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    pick(obj, keys).and_then(scalar_text).unwrap_or_default()
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    match pick(obj, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

fn list_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    pick(obj, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Strings, numbers and booleans become trimmed text; containers do not.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts an array of scalars (or `{text}` objects) or one delimited string.
fn string_list(value: Option<&Value>, delimiter: char) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(o) => Some(text_field(o, &["text", "name", "value"])),
                other => scalar_text(other),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(delimiter)
            .map(|part| part.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_yields_empty_document() {
        assert_eq!(normalize_cv(&Value::Null), CvDocument::default());
        assert_eq!(normalize_cv(&json!([1, 2, 3])), CvDocument::default());
    }

    #[test]
    fn test_camel_case_wins_and_snake_case_fills_gaps() {
        let cv = normalize_cv(&json!({
            "personalInfo": { "fullName": "Grace Hopper", "email": "" },
            "personal_info": { "full_name": "G. Hopper", "email": "grace@navy.mil", "phone": "555 0100 200" }
        }));
        assert_eq!(cv.personal_info.full_name, "Grace Hopper");
        assert_eq!(cv.personal_info.email, "grace@navy.mil");
        assert_eq!(cv.personal_info.phone, "555 0100 200");
    }

    #[test]
    fn test_snake_case_experience_and_string_bullets() {
        let cv = normalize_cv(&json!({
            "experience": [{
                "job_title": "Analyst",
                "company": "Northwind",
                "is_current": "yes",
                "bullets": "- Reconciled 40 accounts every month\n- Automated the weekly sales report"
            }]
        }));
        let item = &cv.experience[0];
        assert_eq!(item.job_title, "Analyst");
        assert!(item.is_current);
        assert_eq!(
            item.bullets,
            vec![
                "Reconciled 40 accounts every month".to_string(),
                "Automated the weekly sales report".to_string(),
            ]
        );
    }

    #[test]
    fn test_nulls_and_wrong_types_are_tolerated() {
        let cv = normalize_cv(&json!({
            "summary": null,
            "skills": "Rust, SQL , ,Kafka",
            "education": [null, { "school": "MIT", "year": 2012 }],
            "experience": "not a list",
            "projects": ["Ledger CLI", { "title": "Site", "url": "https://x.dev" }, 7]
        }));
        assert_eq!(cv.summary, "");
        assert_eq!(cv.skills, vec!["Rust", "SQL", "Kafka"]);
        assert_eq!(cv.education.len(), 1);
        assert_eq!(cv.education[0].year, "2012");
        assert!(cv.experience.is_empty());
        assert_eq!(cv.projects.len(), 3);
        assert_eq!(cv.projects[1].name, "Site");
        assert_eq!(cv.projects[1].link, "https://x.dev");
        assert_eq!(cv.projects[2].name, "7");
    }

    #[test]
    fn test_canonical_shape_round_trips() {
        let original = CvDocument {
            summary: "Ops lead".to_string(),
            skills: vec!["Excel".to_string()],
            experience: vec![ExperienceItem {
                job_title: "Lead".to_string(),
                company: "Acme".to_string(),
                bullets: vec!["Ran the warehouse floor".to_string()],
                ..Default::default()
            }],
            languages: vec![LanguageItem {
                language: "Spanish".to_string(),
                level: "B2".to_string(),
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(normalize_cv(&value), original);
    }
}
