//! CV Score: deterministic completeness + quality score with a completion gate.
//!
//! Two additive sub-scores:
//! - completion (max 60): are the essential sections filled with real content?
//! - quality (max 40): summary length, action verbs, identity/dates, extras.
//!
//! The gate caps the total at 15 when the essentials (summary, one real
//! experience, three skills) are missing, so a CV with lots of optional
//! extras but no substance cannot look strong.

use serde::{Deserialize, Serialize};

use crate::cv::placeholder::{count_words, is_placeholder_text, is_placeholder_value, real_word_count};
use crate::models::cv::{CvDocument, ExperienceItem};

pub const MAX_SCORE: u32 = 100;
pub const MAX_COMPLETION: u32 = 60;
pub const MAX_QUALITY: u32 = 40;
pub const GATED_SCORE_CAP: u32 = 15;
pub const MAX_FIXES: usize = 5;

const STRONG_THRESHOLD: u32 = 80;
const GOOD_THRESHOLD: u32 = 55;

/// Bullets need this many words to count as a real achievement.
const MIN_BULLET_WORDS: usize = 5;

const GATE_MIN_SUMMARY_WORDS: usize = 20;
const GATE_MIN_SKILLS: usize = 3;

const SUMMARY_TARGET_MIN: usize = 60;
const SUMMARY_TARGET_MAX: usize = 100;

const OPTIONAL_SECTION_POINTS: f64 = 1.25;
const OPTIONAL_SECTION_CAP: f64 = 5.0;

pub const GATE_MESSAGE: &str = "Your CV is missing essentials. Add a summary of at least 20 words, \
    one real work experience and 3 skills to unlock your full score.";

const ACTION_VERBS: &[&str] = &[
    "led",
    "managed",
    "built",
    "developed",
    "designed",
    "delivered",
    "launched",
    "implemented",
    "improved",
    "increased",
    "reduced",
    "created",
    "optimized",
    "achieved",
    "coordinated",
    "analyzed",
    "negotiated",
    "mentored",
    "organized",
    "streamlined",
    "automated",
    "spearheaded",
];

/// Fixes touching these topics are surfaced first.
const PRIORITY_TOPICS: &[&str] = &["summary", "experience", "skills"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLevel {
    Strong,
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl ScoreLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= STRONG_THRESHOLD => ScoreLevel::Strong,
            s if s >= GOOD_THRESHOLD => ScoreLevel::Good,
            _ => ScoreLevel::NeedsImprovement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: u32,
    pub completion_score: u32,
    pub quality_score: u32,
    pub level: ScoreLevel,
    pub fixes: Vec<String>,
    pub is_gated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_message: Option<String>,
}

/// Everything the scorer needs, measured once from the document.
#[derive(Debug, Clone, Default, PartialEq)]
struct CvSignals {
    summary_words: usize,
    qualifying_experiences: usize,
    qualifying_bullets: usize,
    skills: usize,
    has_email: bool,
    has_phone: bool,
    has_education: bool,
    has_action_verb: bool,
    has_name: bool,
    has_dates: bool,
    optional_sections: usize,
}

impl CvSignals {
    fn measure(cv: &CvDocument) -> Self {
        let qualifying: Vec<&ExperienceItem> =
            cv.experience.iter().filter(|e| is_qualifying_experience(e)).collect();

        let qualifying_bullets = qualifying
            .iter()
            .map(|e| e.bullets.iter().filter(|b| is_qualifying_bullet(b)).count())
            .sum();

        let info = &cv.personal_info;

        let optional_sections = [
            cv.projects.iter().any(|p| !is_placeholder_value(&p.name)),
            cv.certifications.iter().any(|c| !is_placeholder_value(&c.name)),
            cv.publications.iter().any(|p| !is_placeholder_value(&p.title)),
            cv.languages.iter().any(|l| !is_placeholder_value(&l.language)),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();

        CvSignals {
            summary_words: real_word_count(&cv.summary),
            qualifying_experiences: qualifying.len(),
            qualifying_bullets,
            skills: cv.skills.iter().filter(|s| !is_placeholder_value(s)).count(),
            has_email: !is_placeholder_value(&info.email),
            has_phone: !is_placeholder_value(&info.phone),
            has_education: cv
                .education
                .iter()
                .any(|e| !is_placeholder_value(&e.degree) || !is_placeholder_value(&e.school)),
            has_action_verb: contains_action_verb(cv),
            has_name: !is_placeholder_value(&info.full_name),
            has_dates: cv
                .experience
                .iter()
                .any(|e| !e.start_date.trim().is_empty() || !e.end_date.trim().is_empty()),
            optional_sections,
        }
    }

    fn is_gated(&self) -> bool {
        self.summary_words < GATE_MIN_SUMMARY_WORDS
            || self.qualifying_experiences == 0
            || self.skills < GATE_MIN_SKILLS
    }

    /// Summary or experience carries enough text to judge its wording.
    fn is_substantive(&self) -> bool {
        self.summary_words >= GATE_MIN_SUMMARY_WORDS || self.qualifying_experiences > 0
    }
}

fn is_qualifying_bullet(bullet: &str) -> bool {
    !is_placeholder_text(bullet) && count_words(bullet) >= MIN_BULLET_WORDS
}

/// A real bullet, or a real title at a real company.
pub fn is_qualifying_experience(item: &ExperienceItem) -> bool {
    item.bullets.iter().any(|b| is_qualifying_bullet(b))
        || (!is_placeholder_value(&item.job_title) && !is_placeholder_value(&item.company))
}

fn contains_action_verb(cv: &CvDocument) -> bool {
    let summary = cv.summary.to_lowercase();
    let mentions_verb = |text: &str| ACTION_VERBS.iter().any(|v| text.contains(v));
    mentions_verb(&summary)
        || cv
            .experience
            .iter()
            .flat_map(|e| e.bullets.iter())
            .any(|b| mentions_verb(&b.to_lowercase()))
}

/// Computes the score for a CV. Never fails; empty fields just score zero.
pub fn compute_score(cv: &CvDocument) -> ScoreResult {
    let signals = CvSignals::measure(cv);
    let mut fixes = Vec::new();

    let completion = completion_points(&signals, &mut fixes).min(MAX_COMPLETION);
    let quality = quality_points(&signals, &mut fixes).min(MAX_QUALITY);

    let additive = (completion + quality).min(MAX_SCORE);
    let is_gated = signals.is_gated();
    let score = if is_gated {
        additive.min(GATED_SCORE_CAP)
    } else {
        additive
    };

    ScoreResult {
        score,
        completion_score: completion,
        quality_score: quality,
        level: ScoreLevel::from_score(score),
        fixes: prioritize_fixes(fixes),
        is_gated,
        gate_message: is_gated.then(|| GATE_MESSAGE.to_string()),
    }
}

fn completion_points(s: &CvSignals, fixes: &mut Vec<String>) -> u32 {
    let mut points = 0;

    points += match s.summary_words {
        n if n >= SUMMARY_TARGET_MIN => 15,
        n if n >= 40 => 10,
        n if n >= 20 => 5,
        n if n >= 1 => 2,
        _ => 0,
    };
    if s.summary_words == 0 {
        fixes.push("Add a professional summary of 60-100 words".to_string());
    } else if s.summary_words < SUMMARY_TARGET_MIN {
        fixes.push(format!(
            "Expand your summary to 60-100 words (currently {})",
            s.summary_words
        ));
    }

    points += match s.qualifying_experiences {
        0 => 0,
        1 => 8,
        _ => 15,
    };
    match s.qualifying_experiences {
        0 => fixes.push("Add at least one work experience with concrete achievements".to_string()),
        1 => fixes.push("Add a second relevant experience entry".to_string()),
        _ => {}
    }

    if s.qualifying_experiences > 0 {
        let avg = s.qualifying_bullets as f64 / s.qualifying_experiences as f64;
        points += match avg {
            a if a >= 3.0 => 10,
            a if a >= 2.0 => 7,
            a if a >= 1.0 => 4,
            _ => 0,
        };
        if avg < 3.0 {
            fixes.push(
                "Add at least 3 achievement bullets (5+ words each) to every experience"
                    .to_string(),
            );
        }
    }

    points += match s.skills {
        n if n >= 10 => 10,
        n if n >= 6 => 7,
        n if n >= 3 => 4,
        _ => 0,
    };
    if s.skills < 10 {
        fixes.push(format!("Add more skills (you have {}, aim for 10+)", s.skills));
    }

    points += match (s.has_email, s.has_phone) {
        (true, true) => 5,
        (true, false) | (false, true) => 2,
        (false, false) => 0,
    };
    match (s.has_email, s.has_phone) {
        (true, true) => {}
        (false, false) => fixes.push("Add your email address and phone number".to_string()),
        (false, true) => fixes.push("Add your email address".to_string()),
        (true, false) => fixes.push("Add your phone number".to_string()),
    }

    if s.has_education {
        points += 5;
    } else {
        fixes.push("Add your education (degree or school)".to_string());
    }

    points
}

fn quality_points(s: &CvSignals, fixes: &mut Vec<String>) -> u32 {
    let mut points = 0.0_f64;

    points += match s.summary_words {
        n if (SUMMARY_TARGET_MIN..=SUMMARY_TARGET_MAX).contains(&n) => 15.0,
        n if n > SUMMARY_TARGET_MAX => 10.0,
        n if n >= 40 => 10.0,
        n if n >= 20 => 5.0,
        _ => 0.0,
    };
    if s.summary_words > SUMMARY_TARGET_MAX {
        fixes.push(format!(
            "Tighten your summary to 100 words or fewer (currently {})",
            s.summary_words
        ));
    }

    if s.has_action_verb {
        points += 10.0;
    } else {
        if s.is_substantive() {
            points += 5.0;
        }
        fixes.push("Start bullets with strong action verbs such as led, built or delivered".to_string());
    }

    points += match (s.has_name, s.has_dates, s.qualifying_experiences >= 2) {
        (true, true, true) => 10.0,
        (true, true, false) => 7.0,
        (true, false, _) => 4.0,
        (false, _, _) => 0.0,
    };
    if !s.has_name {
        fixes.push("Add your full name".to_string());
    }
    if !s.has_dates {
        fixes.push("Add start and end dates to your experience".to_string());
    }

    points += (s.optional_sections as f64 * OPTIONAL_SECTION_POINTS).min(OPTIONAL_SECTION_CAP);
    if s.optional_sections == 0 {
        fixes.push("Add projects, certifications, languages or publications to stand out".to_string());
    }

    points.round().max(0.0) as u32
}

/// Stable partition: summary/experience/skills fixes first, then the rest, capped.
fn prioritize_fixes(fixes: Vec<String>) -> Vec<String> {
    let (mut priority, rest): (Vec<String>, Vec<String>) = fixes.into_iter().partition(|fix| {
        let lower = fix.to_lowercase();
        PRIORITY_TOPICS.iter().any(|topic| lower.contains(topic))
    });
    priority.extend(rest);
    priority.truncate(MAX_FIXES);
    priority
}
