//! Career-path reasoning: which tracks a CV already points at, how senior the
//! candidate is, what role to aim for next and which skills close the gap.
//!
//! Purely rule-based. Tracks are matched on experience titles and listed
//! skills; seniority comes from dated experience, bumped by senior titles.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::cv::placeholder::is_placeholder_value;
use crate::cv::scoring::{ScoreLevel, ScoreResult};
use crate::models::cv::{CvDocument, ExperienceItem};

pub const MAX_PATHS: usize = 3;
const MAX_SKILL_GAPS: usize = 3;
const POINTS_PER_TITLE_MATCH: u32 = 30;
const MAX_TITLE_MATCHES: u32 = 2;
const POINTS_PER_SKILL_MATCH: u32 = 10;
const MAX_SKILL_POINTS: u32 = 40;
const MAX_COUNTED_YEARS: u32 = 50;

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year regex"));

struct CareerTrack {
    name: &'static str,
    /// Lowercase keywords looked for in job titles.
    titles: &'static [&'static str],
    /// Skills the track values, most important first.
    skills: &'static [&'static str],
    /// Entry, mid, senior and lead role names.
    ladder: [&'static str; 4],
}

const TRACKS: &[CareerTrack] = &[
    CareerTrack {
        name: "Software Engineering",
        titles: &["software", "developer", "programmer", "devops", "backend", "frontend", "full stack", "site reliability"],
        skills: &["Git", "SQL", "Testing", "System design", "Python", "JavaScript", "TypeScript", "Rust", "Go", "Java", "Docker", "Kubernetes", "AWS"],
        ladder: ["Junior Software Engineer", "Software Engineer", "Senior Software Engineer", "Staff Engineer"],
    },
    CareerTrack {
        name: "Data & Analytics",
        titles: &["data", "analyst", "analytics", "business intelligence", "scientist"],
        skills: &["SQL", "Excel", "Python", "Statistics", "Power BI", "Tableau", "Data modelling", "Machine learning"],
        ladder: ["Junior Data Analyst", "Data Analyst", "Senior Data Analyst", "Analytics Lead"],
    },
    CareerTrack {
        name: "Product Management",
        titles: &["product manager", "product owner"],
        skills: &["Roadmapping", "User research", "Stakeholder management", "Prioritisation", "Agile", "Analytics"],
        ladder: ["Associate Product Manager", "Product Manager", "Senior Product Manager", "Head of Product"],
    },
    CareerTrack {
        name: "Design",
        titles: &["designer", "ux", "ui", "design"],
        skills: &["Figma", "Prototyping", "User research", "Wireframing", "Accessibility", "Design systems"],
        ladder: ["Junior Designer", "Product Designer", "Senior Product Designer", "Design Lead"],
    },
    CareerTrack {
        name: "Operations & Logistics",
        titles: &["operations", "logistics", "warehouse", "supply chain", "fulfilment", "distribution", "shift"],
        skills: &["Rota planning", "Inventory management", "Health and safety", "Supplier management", "Lean", "Excel", "Forklift licence"],
        ladder: ["Operations Assistant", "Operations Supervisor", "Operations Manager", "Head of Operations"],
    },
    CareerTrack {
        name: "Sales",
        titles: &["sales", "account executive", "account manager", "business development"],
        skills: &["CRM", "Negotiation", "Prospecting", "Account management", "Salesforce", "Forecasting"],
        ladder: ["Sales Development Representative", "Account Executive", "Senior Account Executive", "Sales Manager"],
    },
    CareerTrack {
        name: "Marketing",
        titles: &["marketing", "content", "seo", "social media", "brand"],
        skills: &["Copywriting", "SEO", "Google Analytics", "Social media", "Content writing", "Email marketing"],
        ladder: ["Marketing Assistant", "Marketing Executive", "Marketing Manager", "Head of Marketing"],
    },
    CareerTrack {
        name: "Customer Support",
        titles: &["customer", "support", "call centre", "help desk", "service advisor"],
        skills: &["Communication", "Complaint handling", "CRM", "Troubleshooting", "Zendesk"],
        ladder: ["Customer Service Advisor", "Customer Success Specialist", "Customer Success Manager", "Head of Customer Experience"],
    },
    CareerTrack {
        name: "Finance & Accounting",
        titles: &["accountant", "finance", "accounts", "bookkeeper", "auditor", "payroll"],
        skills: &["Excel", "Bookkeeping", "Reconciliation", "Financial reporting", "Budgeting", "Xero"],
        ladder: ["Accounts Assistant", "Accountant", "Senior Accountant", "Finance Manager"],
    },
    CareerTrack {
        name: "People & HR",
        titles: &["hr", "human resources", "recruiter", "talent", "people"],
        skills: &["Recruitment", "Employee relations", "Onboarding", "Employment law", "Payroll"],
        ladder: ["HR Assistant", "HR Advisor", "HR Business Partner", "Head of People"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl Seniority {
    fn from_years(years: u32) -> Self {
        match years {
            0..=1 => Seniority::Entry,
            2..=4 => Seniority::Mid,
            5..=9 => Seniority::Senior,
            _ => Seniority::Lead,
        }
    }

    fn rung(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CareerInput<'a> {
    pub cv: &'a CvDocument,
    pub score: &'a ScoreResult,
    /// Used for open-ended ("current") roles.
    pub as_of_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    pub track: String,
    /// 0-100: title matches plus skill matches.
    pub fit: u32,
    pub target_role: String,
    pub matched_skills: Vec<String>,
    pub skill_gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathReport {
    pub seniority: Seniority,
    pub years_experience: u32,
    pub paths: Vec<CareerPath>,
    pub next_step: String,
}

pub fn career_paths(input: &CareerInput) -> CareerPathReport {
    let cv = input.cv;
    let years = years_of_experience(&cv.experience, input.as_of_year);
    let seniority = seniority(&cv.experience, years);

    let titles: Vec<String> = cv
        .experience
        .iter()
        .filter(|e| !is_placeholder_value(&e.job_title))
        .map(|e| e.job_title.to_lowercase())
        .collect();
    let skills: Vec<String> = cv
        .skills
        .iter()
        .filter(|s| !is_placeholder_value(s))
        .map(|s| s.to_lowercase())
        .collect();

    let mut paths: Vec<CareerPath> = TRACKS
        .iter()
        .filter_map(|track| match_track(track, &titles, &skills, seniority))
        .collect();
    // Stable sort keeps table order among equal fits.
    paths.sort_by(|a, b| b.fit.cmp(&a.fit));
    paths.truncate(MAX_PATHS);

    let next_step = next_step(input.score, paths.first());

    CareerPathReport {
        seniority,
        years_experience: years,
        paths,
        next_step,
    }
}

fn match_track(
    track: &CareerTrack,
    titles: &[String],
    skills: &[String],
    seniority: Seniority,
) -> Option<CareerPath> {
    let title_matches = titles
        .iter()
        .filter(|t| track.titles.iter().any(|k| mentions(t, k)))
        .count() as u32;

    let (matched, missing): (Vec<&str>, Vec<&str>) = track.skills.iter().partition(|skill| {
        let skill = skill.to_lowercase();
        skills.iter().any(|s| mentions(s, &skill))
    });

    let fit = title_matches.min(MAX_TITLE_MATCHES) * POINTS_PER_TITLE_MATCH
        + (matched.len() as u32 * POINTS_PER_SKILL_MATCH).min(MAX_SKILL_POINTS);
    if fit == 0 {
        return None;
    }

    let target_rung = (seniority.rung() + 1).min(track.ladder.len() - 1);

    Some(CareerPath {
        track: track.name.to_string(),
        fit,
        target_role: track.ladder[target_rung].to_string(),
        matched_skills: matched.iter().map(|s| s.to_string()).collect(),
        skill_gaps: missing
            .iter()
            .take(MAX_SKILL_GAPS)
            .map(|s| s.to_string())
            .collect(),
    })
}

fn next_step(score: &ScoreResult, best: Option<&CareerPath>) -> String {
    let Some(best) = best else {
        return "Add your job titles and skills so we can suggest career paths.".to_string();
    };
    let target = &best.target_role;

    if score.is_gated {
        return format!("Complete your CV essentials before targeting {target} roles.");
    }
    if score.level != ScoreLevel::Strong {
        return format!("Strengthen your CV, then apply for {target} roles.");
    }
    match best.skill_gaps.first() {
        Some(gap) => format!("Build experience in {gap} to move towards {target}."),
        None => format!("Apply for {target} roles."),
    }
}

/// Sum of dated experience in whole years, capped.
fn years_of_experience(experience: &[ExperienceItem], as_of_year: i32) -> u32 {
    let total: i32 = experience
        .iter()
        .filter_map(|e| {
            let start = first_year(&e.start_date)?;
            let end = if e.is_current || e.end_date.trim().is_empty() {
                as_of_year
            } else {
                first_year(&e.end_date)?
            };
            Some((end - start).max(0))
        })
        .sum();
    u32::try_from(total).unwrap_or(0).min(MAX_COUNTED_YEARS)
}

fn first_year(date: &str) -> Option<i32> {
    YEAR.find(date)?.as_str().parse().ok()
}

fn seniority(experience: &[ExperienceItem], years: u32) -> Seniority {
    let by_years = Seniority::from_years(years);
    let by_title = experience
        .iter()
        .map(|e| e.job_title.to_lowercase())
        .map(|t| {
            if ["head", "director", "vp", "chief"].iter().any(|k| mentions(&t, k)) {
                Seniority::Lead
            } else if ["senior", "lead", "principal", "staff"].iter().any(|k| mentions(&t, k)) {
                Seniority::Senior
            } else {
                Seniority::Entry
            }
        })
        .max()
        .unwrap_or(Seniority::Entry);
    by_years.max(by_title)
}

/// Whole-word, already-lowercased containment, so "ui" does not match "build".
fn mentions(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::scoring::compute_score;

    fn job(title: &str, start: &str, end: &str, current: bool) -> ExperienceItem {
        ExperienceItem {
            job_title: title.to_string(),
            company: "Acme".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            is_current: current,
            ..Default::default()
        }
    }

    fn strong_score() -> ScoreResult {
        ScoreResult {
            score: 88,
            completion_score: 55,
            quality_score: 33,
            level: ScoreLevel::Strong,
            fixes: Vec::new(),
            is_gated: false,
            gate_message: None,
        }
    }

    fn operations_cv() -> CvDocument {
        CvDocument {
            experience: vec![job("Operations Manager", "2019-03", "", true)],
            skills: ["Rota planning", "Forklift licence", "Supplier management", "Advanced Excel"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_operations_cv_ranks_operations_first() {
        let cv = operations_cv();
        let score = strong_score();
        let report = career_paths(&CareerInput {
            cv: &cv,
            score: &score,
            as_of_year: 2026,
        });

        assert_eq!(report.years_experience, 7);
        assert_eq!(report.seniority, Seniority::Senior);

        let best = &report.paths[0];
        assert_eq!(best.track, "Operations & Logistics");
        assert_eq!(best.fit, 70);
        assert_eq!(best.target_role, "Head of Operations");
        assert_eq!(
            best.skill_gaps,
            vec!["Inventory management", "Health and safety", "Lean"]
        );

        // Excel alone puts Data before Finance by table order.
        let tracks: Vec<&str> = report.paths.iter().map(|p| p.track.as_str()).collect();
        assert_eq!(tracks, vec!["Operations & Logistics", "Data & Analytics", "Finance & Accounting"]);
        assert_eq!(
            report.next_step,
            "Build experience in Inventory management to move towards Head of Operations."
        );
    }

    #[test]
    fn test_empty_cv_has_no_paths() {
        let cv = CvDocument::default();
        let score = compute_score(&cv);
        let report = career_paths(&CareerInput {
            cv: &cv,
            score: &score,
            as_of_year: 2026,
        });
        assert!(report.paths.is_empty());
        assert_eq!(report.seniority, Seniority::Entry);
        assert!(report.next_step.starts_with("Add your job titles"));
    }

    #[test]
    fn test_gated_cv_is_told_to_finish_essentials() {
        let cv = operations_cv();
        let score = compute_score(&cv);
        assert!(score.is_gated);
        let report = career_paths(&CareerInput {
            cv: &cv,
            score: &score,
            as_of_year: 2026,
        });
        assert_eq!(
            report.next_step,
            "Complete your CV essentials before targeting Head of Operations roles."
        );
    }

    #[test]
    fn test_years_sum_dated_roles_and_skip_undated() {
        let experience = vec![
            job("Data Analyst", "Jan 2016", "Dec 2018", false),
            job("Senior Data Analyst", "2019", "2022", false),
            job("Intern", "", "", false),
        ];
        assert_eq!(years_of_experience(&experience, 2026), 5);
        assert_eq!(seniority(&experience, 5), Seniority::Senior);
    }

    #[test]
    fn test_senior_title_lifts_short_tenure() {
        let experience = vec![job("Head of Sales", "2024", "", true)];
        let years = years_of_experience(&experience, 2025);
        assert_eq!(years, 1);
        assert_eq!(seniority(&experience, years), Seniority::Lead);
    }

    #[test]
    fn test_lead_stays_on_top_rung() {
        let cv = CvDocument {
            experience: vec![job("Director of Software Engineering", "2005", "", true)],
            ..Default::default()
        };
        let score = strong_score();
        let report = career_paths(&CareerInput {
            cv: &cv,
            score: &score,
            as_of_year: 2026,
        });
        assert_eq!(report.seniority, Seniority::Lead);
        assert_eq!(report.paths[0].target_role, "Staff Engineer");
    }

    #[test]
    fn test_mentions_is_whole_word() {
        assert!(mentions("ui designer", "ui"));
        assert!(!mentions("build engineer", "ui"));
        assert!(mentions("advanced excel", "excel"));
        assert!(!mentions("hrm systems", "hr"));
    }
}
