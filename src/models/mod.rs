use crate::error::ScrapeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ── Member identifier ─────────────────────────────────────────────────────────

/// Three-digit, zero-padded member identifier ("001" … "999").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    pub fn from_number(n: u32) -> Result<Self, ScrapeError> {
        if !(1..=999).contains(&n) {
            return Err(ScrapeError::InvalidIdentifier(n.to_string()));
        }
        Ok(Self(format!("{:03}", n)))
    }

    /// Accepts 1–3 ASCII digits and pads to three. "7" → "007", "007" → "007".
    pub fn parse(s: &str) -> Result<Self, ScrapeError> {
        let s = s.trim();
        if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScrapeError::InvalidIdentifier(s.to_string()));
        }
        let n: u32 = s
            .parse()
            .map_err(|_| ScrapeError::InvalidIdentifier(s.to_string()))?;
        Self::from_number(n)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MemberId {
    type Error = ScrapeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

// ── Identifier universe ───────────────────────────────────────────────────────

/// Ids of the currently active members, in listing order. Built once per run.
#[derive(Debug, Clone, Default)]
pub struct IdentifierUniverse {
    ordered: Vec<MemberId>,
    known: HashSet<MemberId>,
}

impl IdentifierUniverse {
    /// Keeps the first occurrence of each id.
    pub fn from_ids<I: IntoIterator<Item = MemberId>>(ids: I) -> Self {
        let mut universe = Self::default();
        for id in ids {
            if universe.known.insert(id.clone()) {
                universe.ordered.push(id);
            }
        }
        universe
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.known.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

// ── Extracted profile ─────────────────────────────────────────────────────────

/// Every field read off a member page. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberProfile {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub party_list: Option<String>,
    pub constituency: Option<String>,
    pub elected_date: Option<NaiveDate>,
    pub no_of_votes: Option<String>,
    pub oath_date: Option<NaiveDate>,
    pub parliamentary_experience: Option<String>,
    pub club: Option<String>,
    pub club_link: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub education: Option<String>,
    pub school: Option<String>,
    pub profession: Option<String>,
    pub email: Option<String>,
}

// ── Member record ─────────────────────────────────────────────────────────────

/// A validated member record. Only constructible through [`MemberRecord::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    id: MemberId,
    link: String,
    profile: MemberProfile,
}

impl MemberRecord {
    pub fn new(
        id: MemberId,
        link: impl Into<String>,
        profile: MemberProfile,
        universe: &IdentifierUniverse,
    ) -> Result<Self, ScrapeError> {
        if !universe.contains(&id) {
            return Err(ScrapeError::UnknownIdentifier(id.to_string()));
        }
        Ok(Self {
            id,
            link: link.into(),
            profile,
        })
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn profile(&self) -> &MemberProfile {
        &self.profile
    }
}

impl fmt::Display for MemberRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "—".into())
        }
        let p = &self.profile;
        writeln!(f, "Id                       : {}", self.id)?;
        writeln!(f, "Member of Parliament     : {} {}", show(&p.name), show(&p.surname))?;
        writeln!(f, "Link                     : {}", self.link)?;
        writeln!(f, "Party list               : {}", show(&p.party_list))?;
        writeln!(f, "Constituency             : {}", show(&p.constituency))?;
        writeln!(f, "Elected date             : {}", show(&p.elected_date))?;
        writeln!(f, "No of votes              : {}", show(&p.no_of_votes))?;
        writeln!(f, "Oath date                : {}", show(&p.oath_date))?;
        writeln!(f, "Parliamentary experience : {}", show(&p.parliamentary_experience))?;
        writeln!(f, "Club                     : {} ({})", show(&p.club), show(&p.club_link))?;
        writeln!(f, "Birth date               : {}", show(&p.birth_date))?;
        writeln!(f, "Birth place              : {}", show(&p.birth_place))?;
        writeln!(f, "Education                : {}", show(&p.education))?;
        writeln!(f, "School                   : {}", show(&p.school))?;
        writeln!(f, "Profession               : {}", show(&p.profession))?;
        write!(f, "Email                    : {}", show(&p.email))
    }
}

// ── Persisted row ─────────────────────────────────────────────────────────────

/// Column order of the persisted table.
pub const COLUMNS: [&str; 16] = [
    "id",
    "name",
    "surname",
    "link",
    "party_list",
    "constituency",
    "elected_date",
    "no_of_votes",
    "oath_date",
    "parliamentary_experience",
    "club",
    "birth_date",
    "education",
    "school",
    "profession",
    "email",
];

/// One line of the record table. Field order must follow [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id: MemberId,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub link: Option<String>,
    pub party_list: Option<String>,
    pub constituency: Option<String>,
    pub elected_date: Option<String>,
    pub no_of_votes: Option<String>,
    pub oath_date: Option<String>,
    pub parliamentary_experience: Option<String>,
    pub club: Option<String>,
    pub birth_date: Option<String>,
    pub education: Option<String>,
    pub school: Option<String>,
    pub profession: Option<String>,
    pub email: Option<String>,
}

impl From<&MemberRecord> for MemberRow {
    fn from(record: &MemberRecord) -> Self {
        let p = &record.profile;
        let iso = |d: &Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Self {
            id: record.id.clone(),
            name: p.name.clone(),
            surname: p.surname.clone(),
            link: Some(record.link.clone()),
            party_list: p.party_list.clone(),
            constituency: p.constituency.clone(),
            elected_date: iso(&p.elected_date),
            no_of_votes: p.no_of_votes.clone(),
            oath_date: iso(&p.oath_date),
            parliamentary_experience: p.parliamentary_experience.clone(),
            club: p.club.clone(),
            birth_date: iso(&p.birth_date),
            education: p.education.clone(),
            school: p.school.clone(),
            profession: p.profession.clone(),
            email: p.email.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_number_pads_full_range() {
        for n in 1..=999 {
            let id = MemberId::from_number(n).unwrap();
            assert_eq!(id.as_str().len(), 3);
            assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
            assert_eq!(MemberId::parse(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn test_parse_pads_and_rejects() {
        assert_eq!(MemberId::parse("7").unwrap().as_str(), "007");
        assert_eq!(MemberId::parse("42").unwrap().as_str(), "042");
        assert_eq!(MemberId::parse(" 460 ").unwrap().as_str(), "460");
        assert!(MemberId::parse("").is_err());
        assert!(MemberId::parse("1000").is_err());
        assert!(MemberId::parse("0").is_err());
        assert!(MemberId::parse("12a").is_err());
        assert!(MemberId::from_number(0).is_err());
        assert!(MemberId::from_number(1000).is_err());
    }

    #[test]
    fn test_universe_dedups_in_first_seen_order() {
        let ids = ["003", "001", "003", "002"].map(|s| MemberId::parse(s).unwrap());
        let universe = IdentifierUniverse::from_ids(ids);
        let got: Vec<&str> = universe.iter().map(|id| id.as_str()).collect();
        assert_eq!(got, vec!["003", "001", "002"]);
    }

    #[test]
    fn test_record_requires_known_identifier() {
        let universe = IdentifierUniverse::from_ids([MemberId::parse("001").unwrap()]);
        let known = MemberRecord::new(
            MemberId::parse("001").unwrap(),
            "https://example.org/001",
            MemberProfile::default(),
            &universe,
        );
        assert!(known.is_ok());

        let unknown = MemberRecord::new(
            MemberId::parse("002").unwrap(),
            "https://example.org/002",
            MemberProfile::default(),
            &universe,
        );
        assert!(matches!(unknown, Err(ScrapeError::UnknownIdentifier(_))));
    }

    #[test]
    fn test_row_emits_iso_dates() {
        let universe = IdentifierUniverse::from_ids([MemberId::parse("001").unwrap()]);
        let profile = MemberProfile {
            oath_date: NaiveDate::from_ymd_opt(2019, 11, 12),
            ..Default::default()
        };
        let record =
            MemberRecord::new(MemberId::parse("1").unwrap(), "link", profile, &universe).unwrap();
        let row = MemberRow::from(&record);
        assert_eq!(row.id.as_str(), "001");
        assert_eq!(row.oath_date.as_deref(), Some("2019-11-12"));
        assert_eq!(row.birth_date, None);
    }
}
