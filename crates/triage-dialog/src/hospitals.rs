//! Nearby facility suggestions per triage level.

use triage_core::types::{Consent, Hospital, TriageLevel};

struct Entry {
    name: &'static str,
    distance_km: f64,
    address: &'static str,
    phone: &'static str,
    doctors: Option<u32>,
    beds: Option<u32>,
}

const EMERGENCY_ROOMS: &[Entry] = &[
    Entry {
        name: "A 병원 응급실",
        distance_km: 0.8,
        address: "서울특별시 동대문구 무학로 124",
        phone: "02-123-4567",
        doctors: Some(18),
        beds: Some(42),
    },
    Entry {
        name: "B 병원 응급실",
        distance_km: 1.2,
        address: "서울특별시 성북구 고려대로 73",
        phone: "02-678-9012",
        doctors: None,
        beds: None,
    },
    Entry {
        name: "C 병원 응급실",
        distance_km: 2.0,
        address: "서울특별시 중랑구 상봉로 31",
        phone: "02-345-6789",
        doctors: Some(14),
        beds: Some(55),
    },
];

const CLINICS: &[Entry] = &[
    Entry {
        name: "C 의원",
        distance_km: 0.5,
        address: "서울특별시 강북구 도봉로 10",
        phone: "02-222-1111",
        doctors: Some(4),
        beds: Some(6),
    },
    Entry {
        name: "D 내과",
        distance_km: 0.9,
        address: "서울특별시 강북구 삼양로 220",
        phone: "02-333-2222",
        doctors: Some(6),
        beds: Some(8),
    },
    Entry {
        name: "E 가정의학과",
        distance_km: 1.4,
        address: "서울특별시 강북구 수유로 88",
        phone: "02-444-3333",
        doctors: Some(5),
        beds: Some(10),
    },
];

impl Entry {
    fn to_hospital(&self) -> Hospital {
        Hospital {
            name: self.name.to_string(),
            distance_km: self.distance_km,
            address: self.address.to_string(),
            phone: self.phone.to_string(),
            doctors: self.doctors,
            beds: self.beds,
        }
    }
}

/// Static directory of facilities. Home care lists none.
#[derive(Debug, Default, Clone, Copy)]
pub struct HospitalDirectory;

impl HospitalDirectory {
    pub fn new() -> Self {
        Self
    }

    pub fn for_level(&self, level: TriageLevel) -> Vec<Hospital> {
        let entries = match level {
            TriageLevel::Emergency => EMERGENCY_ROOMS,
            TriageLevel::Outpatient => CLINICS,
            TriageLevel::Home => &[],
        };
        entries.iter().map(Entry::to_hospital).collect()
    }

    /// Facilities for `level`, or none without location consent.
    pub fn suggest(&self, level: TriageLevel, consent: &Consent) -> Vec<Hospital> {
        if !consent.location {
            return Vec::new();
        }
        self.for_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_location() -> Consent {
        Consent {
            privacy: true,
            location: true,
        }
    }

    #[test]
    fn test_emergency_rooms() {
        let list = HospitalDirectory::new().suggest(TriageLevel::Emergency, &with_location());
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name, "A 병원 응급실");
        assert_eq!(list[1].doctors, None);
        assert_eq!(list[2].beds, Some(55));
    }

    #[test]
    fn test_outpatient_clinics() {
        let list = HospitalDirectory::new().suggest(TriageLevel::Outpatient, &with_location());
        let names: Vec<_> = list.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["C 의원", "D 내과", "E 가정의학과"]);
    }

    #[test]
    fn test_home_has_no_facilities() {
        assert!(HospitalDirectory::new()
            .suggest(TriageLevel::Home, &with_location())
            .is_empty());
    }

    #[test]
    fn test_no_location_consent_hides_list() {
        let consent = Consent {
            privacy: true,
            location: false,
        };
        assert!(HospitalDirectory::new()
            .suggest(TriageLevel::Emergency, &consent)
            .is_empty());
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let list = HospitalDirectory::new().for_level(TriageLevel::Emergency);
        let json = serde_json::to_value(&list[1]).unwrap();
        assert!(json.get("doctors").is_none());
        assert_eq!(json["phone"], "02-678-9012");
    }
}
