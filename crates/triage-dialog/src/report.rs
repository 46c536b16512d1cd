//! Self-triage summary report built from a finished diagnosis.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use triage_core::types::{Diagnosis, Hospital, PatientProfile, TriageLevel};

pub const REPORT_TITLE: &str = "응급실 자가진단 요약 레포트";
pub const EMPTY_SUMMARY: &str = "요약 내용이 없습니다.";
const TIMESTAMP_FORMAT: &str = "%Y년 %m월 %d일 %H:%M";

/// Display texts attached to a triage level.
struct LevelText {
    badge: &'static str,
    headline: &'static str,
    guidance: &'static str,
}

fn level_text(level: TriageLevel) -> LevelText {
    match level {
        TriageLevel::Emergency => LevelText {
            badge: "응급실 방문 권장",
            headline: "응급실 방문을 권장합니다",
            guidance: "빠른 응급실 방문을 위해, 응급실 안내를 도와드릴게요. 방문 전 전화확인 후 내원하시길 안내드립니다.",
        },
        TriageLevel::Outpatient => LevelText {
            badge: "외래 진료 권장",
            headline: "외래 진료를 권장합니다",
            guidance: "외래 진료받을 수 있는 병원 안내를 도와드릴게요.",
        },
        TriageLevel::Home => LevelText {
            badge: "집에서 상태 확인",
            headline: "집에서 상태를 확인하며 휴식을 취하세요",
            guidance: "증상이 심해지거나 새로운 증상이 나타나면 다시 진단해주세요.",
        },
    }
}

/// Patient block of the report, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSection {
    pub gender: String,
    pub age: String,
    pub history: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub title: String,
    pub generated_at: String,
    pub triage_level: TriageLevel,
    pub risk_score: u32,
    pub badge: String,
    pub headline: String,
    pub guidance: String,
    pub profile: ProfileSection,
    pub summary_lines: Vec<String>,
    pub hospitals: Vec<Hospital>,
}

impl TriageReport {
    pub fn build(diagnosis: &Diagnosis, profile: &PatientProfile, now: DateTime<Local>) -> Self {
        let text = level_text(diagnosis.triage_level);

        let mut summary_lines: Vec<String> = diagnosis
            .summary
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if summary_lines.is_empty() {
            summary_lines.push(EMPTY_SUMMARY.to_string());
        }

        Self {
            title: REPORT_TITLE.to_string(),
            generated_at: now.format(TIMESTAMP_FORMAT).to_string(),
            triage_level: diagnosis.triage_level,
            risk_score: diagnosis.risk_score,
            badge: text.badge.to_string(),
            headline: text.headline.to_string(),
            guidance: text.guidance.to_string(),
            profile: ProfileSection {
                gender: profile.gender.label().to_string(),
                age: format!("만 {}세", profile.age),
                history: profile.history_label(),
            },
            summary_lines,
            hospitals: diagnosis.hospitals.clone(),
        }
    }
}

impl fmt::Display for TriageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "레포트 저장 시각: {}", self.generated_at)?;
        writeln!(f, "[{}] {}", self.badge, self.headline)?;
        writeln!(f, "{}", self.guidance)?;
        writeln!(f)?;
        writeln!(f, "환자 기본 정보")?;
        writeln!(f, "  성별: {}", self.profile.gender)?;
        writeln!(f, "  나이: {}", self.profile.age)?;
        writeln!(f, "  과거력: {}", self.profile.history)?;
        writeln!(f)?;
        writeln!(f, "환자 자가진단 요약")?;
        for line in &self.summary_lines {
            writeln!(f, "  - {}", line)?;
        }
        if !self.hospitals.is_empty() {
            writeln!(f)?;
            writeln!(f, "주변 병원 정보")?;
            for (i, h) in self.hospitals.iter().enumerate() {
                write!(
                    f,
                    "  {}. {} ({:.1}km) {} / {}",
                    i + 1,
                    h.name,
                    h.distance_km,
                    h.address,
                    h.phone
                )?;
                if let (Some(doctors), Some(beds)) = (h.doctors, h.beds) {
                    write!(f, " / 의사 {}명, 병상 {}개", doctors, beds)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
